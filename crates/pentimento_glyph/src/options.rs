//! Format options for pentimento_glyph.
//!
//! A Prettier-compatible subset: only the knobs the script printer honors.

use serde::{Deserialize, Serialize};

/// Formatting options for generated setup scripts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormatOptions {
    /// Number of spaces per indentation level (default: 2)
    #[serde(default = "default_tab_width")]
    pub tab_width: u8,

    /// Use tabs instead of spaces (default: false)
    #[serde(default)]
    pub use_tabs: bool,

    /// Print semicolons at the ends of statements (default: true)
    #[serde(default = "default_true")]
    pub semi: bool,

    /// Use single quotes instead of double quotes (default: true)
    #[serde(default = "default_true")]
    pub single_quote: bool,

    /// Print spaces between brackets in object literals (default: true)
    #[serde(default = "default_true")]
    pub bracket_spacing: bool,

    /// End of line style (default: Lf)
    #[serde(default)]
    pub end_of_line: EndOfLine,
}

impl Default for FormatOptions {
    fn default() -> Self {
        Self {
            tab_width: default_tab_width(),
            use_tabs: false,
            semi: true,
            single_quote: true,
            bracket_spacing: true,
            end_of_line: EndOfLine::default(),
        }
    }
}

fn default_tab_width() -> u8 {
    2
}

fn default_true() -> bool {
    true
}

/// End of line options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EndOfLine {
    /// Line Feed only (\n)
    #[default]
    Lf,
    /// Carriage Return + Line Feed (\r\n)
    Crlf,
}

impl FormatOptions {
    /// Get the newline as bytes
    #[inline]
    pub fn newline_bytes(&self) -> &'static [u8] {
        match self.end_of_line {
            EndOfLine::Lf => b"\n",
            EndOfLine::Crlf => b"\r\n",
        }
    }

    /// One level of indentation
    #[inline]
    pub fn indent_unit(&self) -> String {
        if self.use_tabs {
            "\t".to_string()
        } else {
            " ".repeat(self.tab_width as usize)
        }
    }
}
