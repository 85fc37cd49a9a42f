//! Carton - The artist's toolbox for Pentimento.
//!
//! This crate provides the foundational utilities shared by every stage of the
//! migration pipeline, much like a carton (artist's portfolio case) holds all the
//! essential tools and materials an artist needs for their work.
//!
//! # Modules
//!
//! - **case**: identifier case conversion shared by script and template rewriting
//! - **edit**: offset-keyed edit lists applied back-to-front over source text
//! - **text**: re-indentation and identifier lookups over code fragments
//!
//! # Example
//!
//! ```
//! use pentimento_carton::{camelize, hyphenate, EditList};
//!
//! assert_eq!(camelize("user/profile"), "userProfile");
//! assert_eq!(hyphenate("VSelect"), "v-select");
//!
//! let mut edits = EditList::new();
//! edits.push(0, 10, "count.value");
//! assert_eq!(edits.apply("this.count + 1"), "count.value + 1");
//! ```

pub mod case;
pub mod edit;
pub mod text;

// Re-export compact_str::CompactString for convenience
pub use compact_str::CompactString;

// Re-export smallvec for stack-optimized collections
pub use smallvec::{smallvec, SmallVec};

// Re-export bitflags for flag types
pub use bitflags::bitflags;

// Re-export rustc-hash for fast hash maps/sets
pub use rustc_hash::{FxHashMap, FxHashSet};

// Re-export phf for compile-time perfect hash functions
pub use phf::{phf_map, phf_set, Map as PhfMap, Set as PhfSet};

// Re-export shared utilities
pub use case::*;
pub use edit::*;
pub use text::*;
