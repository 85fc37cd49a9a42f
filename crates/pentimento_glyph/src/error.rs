//! Error types for pentimento_glyph.

use thiserror::Error;

/// Errors that can occur during formatting
#[derive(Debug, Error)]
pub enum FormatError {
    /// Error parsing JavaScript/TypeScript
    #[error("Failed to parse script: {0}")]
    ScriptParseError(String),

    /// The generated code could not be turned back into text
    #[error("Failed to format script: {0}")]
    ScriptFormatError(String),
}
