//! Structural splitting of Single File Components.
//!
//! Only block boundaries are recognized here; block contents stay borrowed
//! slices of the original source so untouched blocks can be written back
//! byte for byte.

mod parse;
mod types;

pub use parse::parse_sfc;
pub use types::*;
