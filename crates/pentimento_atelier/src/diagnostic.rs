//! Non-fatal findings reported alongside a migrated file.

use serde::Serialize;

/// Prefix of every marker comment written into generated code.
pub const MARKER_PREFIX: &str = "// [pentimento]";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum DiagnosticKind {
    /// `this.<name>` matched no tracked category; flagged inline
    UnresolvedReference,
    /// `this.<name>` assigned where `<name>` is a composable's const binding; flagged inline
    ReadOnlyBinding,
    /// A template ref shares its name with a component member
    RefNameClash,
    /// The formatter failed; unformatted output was kept
    FormatterFallback,
    /// A body did not parse and was rewritten by the text pass
    BodyParseFallback,
    /// The template rewriter failed; the template was kept as written
    TemplateFallback,
    /// A watcher declared in a form other than a function
    UnsupportedWatcher,
    /// A component option with no migration
    UnsupportedOption,
    /// A mixin with no configured composable
    UnmappedMixin,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub message: String,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// `unresolved reference: this.<name>`; an empty name stands for a bare `this`.
pub fn unresolved_message(name: &str) -> String {
    if name.is_empty() {
        "unresolved reference: this".to_string()
    } else {
        format!("unresolved reference: this.{}", name)
    }
}

/// `// [pentimento] unresolved reference: this.<name>`
#[inline]
pub fn unresolved_marker(name: &str) -> String {
    marker(&unresolved_message(name))
}

pub fn read_only_message(name: &str) -> String {
    format!("assignment to composable binding: this.{}", name)
}

/// `// [pentimento] <message>`
#[inline]
pub fn marker(message: &str) -> String {
    format!("{} {}", MARKER_PREFIX, message)
}
