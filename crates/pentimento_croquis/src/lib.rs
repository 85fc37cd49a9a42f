//! # pentimento_croquis
//!
//! Croquis - The semantic model layer for Pentimento.
//!
//! ## Name Origin
//!
//! **Croquis** (/kʁɔ.ki/) is a French term for a quick, sketchy drawing that captures
//! the essential features of a subject. `pentimento_croquis` takes one quick look at
//! an Options API component and sketches everything it declares: data, computed
//! properties, methods, watchers, lifecycle hooks, store bindings and the framework
//! services it reaches for through `this.$*`.
//!
//! ## Purpose
//!
//! - **Component Model**: a read-only description of one component ([`ComponentModel`])
//! - **Extraction**: a single pass over the OXC AST that recognizes well-known
//!   Options API idioms by node shape ([`extract_component`])
//! - **Store naming**: namespace splitting and default store composable names
//!
//! ## Architecture
//!
//! ```text
//! pentimento_atelier (split SFC)
//!          ↓
//! pentimento_croquis (Component Model)  ← This crate
//!          ↓
//! pentimento_atelier (classify, assemble, rewrite template)
//! ```

pub mod config;
pub mod extract;
pub mod lifecycle;
pub mod model;
pub mod store;

pub use config::*;
pub use extract::{extract_component, source_type_for_lang, ExtractError};
pub use lifecycle::LifecycleKind;
pub use model::*;
pub use store::*;
