//! # pentimento_glyph
//!
//! Glyph - The letterforms for Pentimento.
//! Formatter for the generated `<script setup>` blocks.
//!
//! ## Name Origin
//!
//! **Glyph** (/ɡlɪf/) refers to the visual representation of a character,
//! the form that gives meaning to written symbols. `pentimento_glyph` gives
//! the freshly assembled setup script a consistent, readable shape.
//!
//! ## Behavior
//!
//! Formatting is best effort: callers are expected to keep their unformatted
//! text when [`format_script`] returns an error.
//!
//! ## Example
//!
//! ```ignore
//! use oxc_span::SourceType;
//! use pentimento_glyph::{format_script, FormatOptions};
//!
//! let code = format_script("const count=ref(0)", SourceType::mjs(), &FormatOptions::default())?;
//! assert_eq!(code, "const count = ref(0);\n");
//! ```

mod error;
mod options;
mod script;

pub use error::*;
pub use options::*;
pub use script::format_script;
