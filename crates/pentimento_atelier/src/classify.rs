//! Reference classification and body rewriting.
//!
//! Every body taken from the Component Model goes through two passes:
//!
//! 1. **Accessor pass** - anchored patterns for the framework accessors
//!    (`this.$store.commit(..)`, `this.$t`, `this.$refs.x`, `this.$set(..)`, ...).
//!    They run first so the structural pass never sees them.
//! 2. **Member pass** - the body is re-parsed and every `this.<name>` member
//!    node is classified against the model:
//!    method, mixin symbol, store binding, reactive binding, prop, unresolved.
//!    Whether the member is read, called or assigned is recorded alongside, so a
//!    mixin symbol (a const binding after migration) is never assigned to.
//!
//! Unresolved references keep their original text and get a marker comment on
//! the line above. Resolution is component-wide; a local binding that shadows a
//! component member is not detected.

use std::collections::BTreeSet;

use once_cell::sync::Lazy;
use oxc_allocator::Allocator;
use oxc_ast::ast::{
    AssignmentExpression, AssignmentTarget, CallExpression, ComputedMemberExpression, Expression,
    IdentifierReference, SimpleAssignmentTarget, StaticMemberExpression, ThisExpression,
    UpdateExpression,
};
use oxc_ast_visit::{walk, Visit};
use oxc_parser::Parser;
use oxc_span::SourceType;
use pentimento_carton::{is_identifier, line_start, CompactString, EditList, FxHashSet, SmallVec};
use pentimento_croquis::{split_store_path, ComponentModel, Features, FlagSet, ROOT_NAMESPACE};
use regex::{Captures, Regex};

use crate::diagnostic::{
    marker, read_only_message, unresolved_message, Diagnostic, DiagnosticKind,
};
use crate::registry::StoreRegistry;

macro_rules! pattern {
    ($name:ident, $re:expr) => {
        static $name: Lazy<Regex> = Lazy::new(|| Regex::new($re).unwrap());
    };
}

pattern!(SET_DELETE, r"(?:\bthis\.\$|\bVue\.)(set|delete)\s*\(");
pattern!(
    EVENT_BUS,
    r"\bthis\.\$(?:nuxt|root|bus|eventBus)\.\$(emit|on|off|once)\b"
);
pattern!(
    STORE_CALL,
    r#"\bthis\.\$store\.(?:dispatch|commit)\(\s*['"`]([^'"`]+)['"`]\s*(,\s*)?"#
);
pattern!(
    STORE_GETTER_PATH,
    r#"\bthis\.\$store\.getters\[\s*['"`]([^'"`]+)['"`]\s*\]"#
);
pattern!(STORE_GETTER, r"\bthis\.\$store\.getters\.([A-Za-z_$][\w$]*)");
pattern!(
    STORE_STATE,
    r"\bthis\.\$store\.state\.([A-Za-z_$][\w$]*)(?:\.([A-Za-z_$][\w$]*))?"
);
pattern!(STORE_STATE_ROOT, r"\bthis\.\$store\.state\b");
pattern!(LOCALE, r"\bthis\.\$i18n\.locale\b");
pattern!(I18N, r"\bthis\.\$(tc|te|tm|t|d|n|rt)\b");
pattern!(EMIT_INPUT, r#"\bthis\.\$emit\(\s*['"]input['"]"#);
pattern!(
    SERVICE,
    r"\bthis\.\$(route|router|config|axios|http|nextTick|slots|scopedSlots|attrs|listeners|emit|fetch)\b"
);
pattern!(
    INSTANCE,
    r"\bthis\.(\$(?:el|parent|root|children|options|forceUpdate|vnode))\b"
);
pattern!(REF_MEMBER, r"\bthis\.\$refs\.([A-Za-z_$][\w$]*)");
pattern!(REF_INDEX, r#"\bthis\.\$refs\[\s*['"]([^'"]+)['"]\s*\]"#);
pattern!(THIS_MEMBER, r"\bthis\.([A-Za-z_$][\w$]*)");

/// How a body is shaped, which decides how it is wrapped for re-parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyKind {
    /// A function body
    Statements,
    /// A single expression (data initializers, wrapped method values)
    Expression,
}

impl BodyKind {
    /// Text placed around a body so it parses as a program.
    fn wrapper(self) -> (&'static str, &'static str) {
        match self {
            Self::Statements => ("async function __pentimento__() {\n", "\n}"),
            Self::Expression => ("(\n", "\n)"),
        }
    }
}

/// What the rewritten bodies ended up needing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Usage {
    pub flags: FlagSet,
    /// Store namespaces whose instance is referenced
    pub stores: BTreeSet<CompactString>,
    /// Mixin-provided symbols referenced
    pub mixin_symbols: BTreeSet<CompactString>,
}

enum Resolution {
    Rewrite(String),
    Unresolved,
    /// An assignment to a name that migrates to a const binding
    ReadOnly,
}

/// How a `this.<name>` reference is used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Access {
    Read,
    Call,
    /// Assignment target or `++`/`--` operand
    Write,
}

/// A `this` reference found in a body, in body offsets.
#[derive(Debug)]
struct ThisHit {
    start: usize,
    end: usize,
    /// Empty for a bare `this`.
    name: String,
    access: Access,
}

pub struct Classifier<'c> {
    model: &'c ComponentModel,
    registry: &'c StoreRegistry,
    source_type: SourceType,
    fetch_name: &'c str,
    usage: Usage,
    diagnostics: Vec<Diagnostic>,
}

impl<'c> Classifier<'c> {
    pub fn new(
        model: &'c ComponentModel,
        registry: &'c StoreRegistry,
        source_type: SourceType,
        fetch_name: &'c str,
    ) -> Self {
        Self {
            model,
            registry,
            source_type,
            fetch_name,
            usage: Usage::default(),
            diagnostics: Vec::new(),
        }
    }

    #[inline]
    pub fn usage(&self) -> &Usage {
        &self.usage
    }

    pub fn finish(self) -> (Usage, Vec<Diagnostic>) {
        (self.usage, self.diagnostics)
    }

    /// Rewrite one body.
    pub fn rewrite(&mut self, text: &str, kind: BodyKind) -> String {
        let text = self.rewrite_accessors(text);
        self.rewrite_members(&text, kind)
    }

    /// Rewrite a body that receives the instance as a parameter,
    /// e.g. the getter `vm => vm.count * 2`.
    pub fn rewrite_with_instance(
        &mut self,
        text: &str,
        kind: BodyKind,
        instance: &str,
    ) -> String {
        let text = substitute_instance(text, kind, instance, self.source_type);
        self.rewrite(&text, kind)
    }

    /// Resolve one read of `this.<name>` without a surrounding body.
    pub fn resolve_name(&mut self, name: &str) -> Option<String> {
        match self.classify(name, Access::Read) {
            Resolution::Rewrite(rewritten) => Some(rewritten),
            Resolution::Unresolved | Resolution::ReadOnly => None,
        }
    }

    fn feature(&mut self, feature: Features) {
        self.usage.flags.insert(feature);
    }

    fn store_instance(&mut self, namespace: &str) -> String {
        self.usage.stores.insert(CompactString::new(namespace));
        self.registry.resolve(namespace).instance
    }

    // --- accessor pass ---

    fn rewrite_accessors(&mut self, text: &str) -> String {
        let text = self.rewrite_set_delete(text);

        let text = EVENT_BUS.replace_all(&text, |caps: &Captures| {
            self.feature(Features::EVENT_BUS);
            format!("eventBus.{}", &caps[1])
        });

        let text = STORE_CALL.replace_all(&text, |caps: &Captures| {
            let (namespace, name) = split_store_path(&caps[1]);
            let instance = self.store_instance(namespace);
            format!("{}.{}(", instance, name)
        });

        let text = STORE_GETTER_PATH.replace_all(&text, |caps: &Captures| {
            let (namespace, name) = split_store_path(&caps[1]);
            let instance = self.store_instance(namespace);
            format!("{}.{}", instance, name)
        });

        let text = STORE_GETTER.replace_all(&text, |caps: &Captures| {
            let instance = self.store_instance(ROOT_NAMESPACE);
            format!("{}.{}", instance, &caps[1])
        });

        let text = STORE_STATE.replace_all(&text, |caps: &Captures| {
            let segment = &caps[1];
            let name = caps.get(2).map(|m| m.as_str());
            if self.registry.contains(segment) {
                let instance = self.store_instance(segment);
                match name {
                    Some(name) => format!("{}.{}", instance, name),
                    None => instance,
                }
            } else {
                let instance = self.store_instance(ROOT_NAMESPACE);
                match name {
                    Some(name) => format!("{}.{}.{}", instance, segment, name),
                    None => format!("{}.{}", instance, segment),
                }
            }
        });

        let text = STORE_STATE_ROOT.replace_all(&text, |_: &Captures| {
            self.store_instance(ROOT_NAMESPACE)
        });

        let text = LOCALE.replace_all(&text, |_: &Captures| {
            self.feature(Features::LOCALE);
            "locale.value".to_string()
        });

        let text = I18N.replace_all(&text, |caps: &Captures| {
            let name = match &caps[1] {
                "tc" => "t",
                other => other,
            };
            self.usage.flags.i18n.insert(CompactString::new(name));
            name.to_string()
        });

        let text = EMIT_INPUT.replace_all(&text, |_: &Captures| {
            self.feature(Features::EMIT);
            "emit('update:value'".to_string()
        });

        let text = SERVICE.replace_all(&text, |caps: &Captures| {
            let (feature, replacement) = match &caps[1] {
                "route" => (Features::ROUTE, "route"),
                "router" => (Features::ROUTER, "router"),
                "config" => (Features::RUNTIME_CONFIG, "config"),
                "axios" | "http" => (Features::HTTP, "axios"),
                "nextTick" => (Features::NEXT_TICK, "nextTick"),
                "slots" | "scopedSlots" => (Features::SLOTS, "slots"),
                "attrs" | "listeners" => (Features::ATTRS, "attrs"),
                "emit" => (Features::EMIT, "emit"),
                _ => (Features::FETCH_CALL, self.fetch_name),
            };
            self.feature(feature);
            replacement.to_string()
        });

        let text = INSTANCE.replace_all(&text, |caps: &Captures| {
            self.feature(Features::INSTANCE);
            format!("instance.proxy.{}", &caps[1])
        });

        let text = REF_MEMBER.replace_all(&text, "${1}.value");

        let text = REF_INDEX.replace_all(&text, |caps: &Captures| {
            if is_identifier(&caps[1]) {
                format!("{}.value", &caps[1])
            } else {
                caps[0].to_string()
            }
        });

        text.into_owned()
    }

    /// `this.$set(obj, key, value)`, `this.$delete(obj, key)` and the `Vue.*` globals.
    fn rewrite_set_delete(&mut self, text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        let mut cursor = 0;

        for caps in SET_DELETE.captures_iter(text) {
            let (Some(whole), Some(method)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            if whole.start() < cursor {
                continue;
            }
            let Some((args, end)) = split_call_args(text, whole.end()) else {
                continue;
            };
            let replacement = match (method.as_str(), args.as_slice()) {
                ("set", [object, key, value]) => {
                    format!("{} = {}", member_access(object, key), value)
                }
                ("delete", [object, key]) => format!("delete {}", member_access(object, key)),
                _ => continue,
            };
            out.push_str(&text[cursor..whole.start()]);
            out.push_str(&replacement);
            cursor = end;
        }

        out.push_str(&text[cursor..]);
        out
    }

    // --- member pass ---

    fn rewrite_members(&mut self, text: &str, kind: BodyKind) -> String {
        let (prefix, suffix) = kind.wrapper();
        let wrapped = format!("{}{}{}", prefix, text, suffix);

        let allocator = Allocator::default();
        let ret = Parser::new(&allocator, &wrapped, self.source_type).parse();

        let hits = if ret.panicked || !ret.errors.is_empty() {
            let message = ret
                .errors
                .first()
                .map(|e| e.to_string())
                .unwrap_or_else(|| "unrecoverable syntax error".to_string());
            tracing::warn!("falling back to text rewriting for a body: {}", message);
            self.diagnostics.push(Diagnostic::new(
                DiagnosticKind::BodyParseFallback,
                format!("body could not be parsed ({}); rewritten as text", message),
            ));
            text_hits(text)
        } else {
            let mut collector = ThisReferences::default();
            collector.visit_program(&ret.program);
            collector
                .hits
                .into_iter()
                .filter(|hit| hit.start >= prefix.len() && hit.end <= prefix.len() + text.len())
                .map(|hit| ThisHit {
                    start: hit.start - prefix.len(),
                    end: hit.end - prefix.len(),
                    ..hit
                })
                .collect()
        };

        self.apply_hits(text, hits)
    }

    fn apply_hits(&mut self, text: &str, hits: Vec<ThisHit>) -> String {
        let mut edits = EditList::new();
        let mut flagged: FxHashSet<(usize, String)> = FxHashSet::default();

        for hit in hits {
            let (kind, message) = match self.classify(&hit.name, hit.access) {
                Resolution::Rewrite(replacement) => {
                    edits.push(hit.start, hit.end, replacement);
                    continue;
                }
                Resolution::Unresolved => (
                    DiagnosticKind::UnresolvedReference,
                    unresolved_message(&hit.name),
                ),
                Resolution::ReadOnly => {
                    (DiagnosticKind::ReadOnlyBinding, read_only_message(&hit.name))
                }
            };
            let line = line_start(text, hit.start);
            if !flagged.insert((line, hit.name.clone())) {
                continue;
            }
            let comment = marker(&message);
            self.diagnostics.push(Diagnostic::new(kind, message));
            if previous_line(text, line).is_some_and(|prev| prev.trim() == comment) {
                continue;
            }
            let indent: String = text[line..]
                .chars()
                .take_while(|c| *c == ' ' || *c == '\t')
                .collect();
            edits.push(line, line, format!("{}{}\n", indent, comment));
        }

        edits.apply(text)
    }

    fn classify(&mut self, name: &str, access: Access) -> Resolution {
        if name.is_empty() || name.starts_with('$') {
            return Resolution::Unresolved;
        }
        if self.model.method(name).is_some() {
            return Resolution::Rewrite(name.to_string());
        }
        if self.model.mixin_providing(name).is_some() {
            // Destructured from the composable call, so not assignable.
            if access == Access::Write {
                return Resolution::ReadOnly;
            }
            self.usage.mixin_symbols.insert(CompactString::new(name));
            return Resolution::Rewrite(name.to_string());
        }
        if let Some(binding) = self.model.store_binding(name) {
            let instance = self.store_instance(&binding.namespace);
            return Resolution::Rewrite(match access {
                Access::Read => binding.read(&instance),
                Access::Call | Access::Write => format!("{}.{}", instance, binding.remote),
            });
        }
        if self.model.is_reactive(name) {
            return Resolution::Rewrite(format!("{}.value", name));
        }
        if self.model.is_prop(name) {
            return Resolution::Rewrite(format!("props.{}", name));
        }
        Resolution::Unresolved
    }
}

#[derive(Default)]
struct ThisReferences {
    hits: Vec<ThisHit>,
}

impl ThisReferences {
    fn push(&mut self, member: &StaticMemberExpression<'_>, access: Access) {
        self.hits.push(ThisHit {
            start: member.span.start as usize,
            end: member.span.end as usize,
            name: member.property.name.to_string(),
            access,
        });
    }
}

/// `this.<name>`
fn this_member<'b, 'a>(
    member: &'b StaticMemberExpression<'a>,
) -> Option<&'b StaticMemberExpression<'a>> {
    matches!(member.object, Expression::ThisExpression(_)).then_some(member)
}

impl<'a> Visit<'a> for ThisReferences {
    fn visit_static_member_expression(&mut self, member: &StaticMemberExpression<'a>) {
        if let Some(member) = this_member(member) {
            self.push(member, Access::Read);
            return;
        }
        walk::walk_static_member_expression(self, member);
    }

    fn visit_computed_member_expression(&mut self, member: &ComputedMemberExpression<'a>) {
        if let (Expression::ThisExpression(_), Expression::StringLiteral(key)) =
            (&member.object, &member.expression)
        {
            if is_identifier(key.value.as_str()) {
                self.hits.push(ThisHit {
                    start: member.span.start as usize,
                    end: member.span.end as usize,
                    name: key.value.to_string(),
                    access: Access::Read,
                });
                return;
            }
        }
        walk::walk_computed_member_expression(self, member);
    }

    fn visit_call_expression(&mut self, call: &CallExpression<'a>) {
        if let Expression::StaticMemberExpression(callee) = &call.callee {
            if let Some(member) = this_member(callee) {
                self.push(member, Access::Call);
                for argument in call.arguments.iter() {
                    self.visit_argument(argument);
                }
                return;
            }
        }
        walk::walk_call_expression(self, call);
    }

    fn visit_assignment_expression(&mut self, expr: &AssignmentExpression<'a>) {
        if let AssignmentTarget::StaticMemberExpression(target) = &expr.left {
            if let Some(member) = this_member(target) {
                self.push(member, Access::Write);
                self.visit_expression(&expr.right);
                return;
            }
        }
        walk::walk_assignment_expression(self, expr);
    }

    fn visit_update_expression(&mut self, expr: &UpdateExpression<'a>) {
        if let SimpleAssignmentTarget::StaticMemberExpression(target) = &expr.argument {
            if let Some(member) = this_member(target) {
                self.push(member, Access::Write);
                return;
            }
        }
        walk::walk_update_expression(self, expr);
    }

    fn visit_this_expression(&mut self, this: &ThisExpression) {
        self.hits.push(ThisHit {
            start: this.span.start as usize,
            end: this.span.end as usize,
            name: String::new(),
            access: Access::Read,
        });
    }
}

/// Spans of every reference to one identifier.
struct IdentifierReferences<'n> {
    name: &'n str,
    spans: Vec<(usize, usize)>,
}

impl<'a> Visit<'a> for IdentifierReferences<'_> {
    fn visit_identifier_reference(&mut self, ident: &IdentifierReference<'a>) {
        if ident.name.as_str() == self.name {
            self.spans
                .push((ident.span.start as usize, ident.span.end as usize));
        }
    }
}

/// Replace references to the instance parameter with `this`.
fn substitute_instance(
    text: &str,
    kind: BodyKind,
    instance: &str,
    source_type: SourceType,
) -> String {
    let (prefix, suffix) = kind.wrapper();
    let wrapped = format!("{}{}{}", prefix, text, suffix);

    let allocator = Allocator::default();
    let ret = Parser::new(&allocator, &wrapped, source_type).parse();
    if ret.panicked || !ret.errors.is_empty() {
        let pattern = format!(r"(^|[^\w$.]){}\b", regex::escape(instance));
        return match Regex::new(&pattern) {
            Ok(re) => re.replace_all(text, "${1}this").into_owned(),
            Err(_) => text.to_string(),
        };
    }

    let mut collector = IdentifierReferences {
        name: instance,
        spans: Vec::new(),
    };
    collector.visit_program(&ret.program);

    let mut edits = EditList::new();
    for (start, end) in collector.spans {
        if start >= prefix.len() && end <= prefix.len() + text.len() {
            edits.push(start - prefix.len(), end - prefix.len(), "this");
        }
    }
    edits.apply(text)
}

/// `this.<ident>` occurrences found by pattern, for bodies that do not parse.
fn text_hits(text: &str) -> Vec<ThisHit> {
    THIS_MEMBER
        .captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            Some(ThisHit {
                start: whole.start(),
                end: whole.end(),
                name: caps.get(1)?.as_str().to_string(),
                access: access_after(&text[whole.end()..]),
            })
        })
        .collect()
}

const COMPOUND_ASSIGNMENT: &[&str] = &[
    "+=", "-=", "*=", "/=", "%=", "**=", "<<=", ">>=", ">>>=", "&=", "|=", "^=", "&&=", "||=",
    "??=",
];

/// How a member is used, judged from the text that follows it.
fn access_after(rest: &str) -> Access {
    let rest = rest.trim_start();
    if rest.starts_with('(') {
        Access::Call
    } else if rest.starts_with("++")
        || rest.starts_with("--")
        || rest
            .strip_prefix('=')
            .is_some_and(|after| !after.starts_with(['=', '>']))
        || COMPOUND_ASSIGNMENT.iter().any(|op| rest.starts_with(op))
    {
        Access::Write
    } else {
        Access::Read
    }
}

fn previous_line(text: &str, line: usize) -> Option<&str> {
    if line == 0 {
        return None;
    }
    let before = &text[..line - 1];
    Some(&before[line_start(before, before.len())..])
}

/// `obj.key` for a quoted identifier key, `obj[key]` otherwise.
fn member_access(object: &str, key: &str) -> String {
    let unquoted = key
        .strip_prefix('\'')
        .and_then(|k| k.strip_suffix('\''))
        .or_else(|| key.strip_prefix('"').and_then(|k| k.strip_suffix('"')));
    match unquoted {
        Some(name) if is_identifier(name) => format!("{}.{}", object, name),
        _ => format!("{}[{}]", object, key),
    }
}

/// Split the arguments of a call whose `(` ends right before `open`.
///
/// Returns the trimmed arguments and the offset just past the closing `)`.
fn split_call_args(text: &str, open: usize) -> Option<(SmallVec<[&str; 4]>, usize)> {
    let bytes = text.as_bytes();
    let mut args = SmallVec::new();
    let mut depth = 0usize;
    let mut arg_start = open;
    let mut quote: Option<u8> = None;
    let mut i = open;

    while i < bytes.len() {
        let b = bytes[i];
        if let Some(q) = quote {
            if b == b'\\' {
                i += 2;
                continue;
            }
            if b == q {
                quote = None;
            }
            i += 1;
            continue;
        }
        match b {
            b'\'' | b'"' | b'`' => quote = Some(b),
            b'(' | b'[' | b'{' => depth += 1,
            b')' | b']' | b'}' if depth > 0 => depth -= 1,
            b')' => {
                let last = text[arg_start..i].trim();
                if !last.is_empty() {
                    args.push(last);
                }
                return Some((args, i + 1));
            }
            b',' if depth == 0 => {
                args.push(text[arg_start..i].trim());
                arg_start = i + 1;
            }
            _ => {}
        }
        i += 1;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use pentimento_carton::FxHashMap;
    use pentimento_croquis::{
        extract_component, ComputedKind, DataProperty, FunctionText, Method, MethodForm,
        PropSet, StoreBinding, StoreKind,
    };

    fn model() -> ComponentModel {
        let mut model = ComponentModel::default();
        model.data.push(DataProperty {
            name: "count".into(),
            init: "0".into(),
        });
        model.computed.push(pentimento_croquis::ComputedProperty {
            name: "double".into(),
            kind: ComputedKind::Plain(FunctionText::default()),
        });
        model.methods.push(Method {
            name: "save".into(),
            function: FunctionText::default(),
            form: MethodForm::Function,
        });
        model.props = Some(PropSet {
            raw: "['value']".into(),
            names: vec!["value".into()],
        });
        model.store_bindings.push(StoreBinding {
            namespace: "cart".into(),
            kind: StoreKind::Action,
            local: "addItem".into(),
            remote: "addItem".into(),
        });
        model.store_bindings.push(StoreBinding {
            namespace: "user".into(),
            kind: StoreKind::Action,
            local: "load".into(),
            remote: "fetchProfile".into(),
        });
        model
    }

    fn rewrite(model: &ComponentModel, body: &str) -> (String, Usage, Vec<Diagnostic>) {
        let registry = StoreRegistry::snapshot(&FxHashMap::default(), ["cart", "user"]);
        let mut classifier = Classifier::new(model, &registry, SourceType::mjs(), "fetchData");
        let out = classifier.rewrite(body, BodyKind::Statements);
        let (usage, diagnostics) = classifier.finish();
        (out, usage, diagnostics)
    }

    #[test]
    fn test_precedence() {
        let model = model();
        let (out, usage, diagnostics) = rewrite(
            &model,
            "this.count++\nthis.save(this.double, this.value)\nthis.addItem(1)",
        );
        assert_eq!(
            out,
            "count.value++\nsave(double.value, props.value)\ncartStore.addItem(1)"
        );
        assert!(usage.stores.contains("cart"));
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_store_namespace_isolation() {
        let model = model();
        let (out, usage, _) = rewrite(&model, "this.load()\nthis.addItem(x)");
        assert_eq!(out, "userStore.fetchProfile()\ncartStore.addItem(x)");
        assert_eq!(usage.stores.len(), 2);
    }

    #[test]
    fn test_unresolved_marker() {
        let model = model();
        let (out, _, diagnostics) = rewrite(
            &model,
            "  console.log(this.unknownThing)\n  this.count = 1",
        );
        assert_eq!(
            out,
            "  // [pentimento] unresolved reference: this.unknownThing\n  console.log(this.unknownThing)\n  count.value = 1"
        );
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].kind, DiagnosticKind::UnresolvedReference);
    }

    #[test]
    fn test_idempotent() {
        let model = model();
        let (once, _, _) = rewrite(&model, "this.count += this.double\nfoo(this.nope)");
        let (twice, _, _) = rewrite(&model, &once);
        assert_eq!(once, twice);
        assert!(!twice.contains(".value.value"));
    }

    #[test]
    fn test_strings_are_not_rewritten() {
        let model = model();
        let (out, _, _) = rewrite(&model, "log('this.count', this.count)");
        assert_eq!(out, "log('this.count', count.value)");
    }

    #[test]
    fn test_spread_reactive_value() {
        let mut model = model();
        model.data.push(DataProperty {
            name: "items".into(),
            init: "[]".into(),
        });
        let (out, _, _) = rewrite(&model, "return [...this.items]");
        assert_eq!(out, "return [...items.value]");
    }

    #[test]
    fn test_store_calls() {
        let model = model();
        let (out, usage, _) = rewrite(
            &model,
            "this.$store.commit('cart/addItem', item)\nawait this.$store.dispatch('cart/load')\nthis.$store.dispatch('setLocale', 'en')",
        );
        assert_eq!(
            out,
            "cartStore.addItem(item)\nawait cartStore.load()\nrootStore.setLocale('en')"
        );
        assert!(usage.stores.contains("root"));
    }

    #[test]
    fn test_store_getters_and_state() {
        let model = model();
        let (out, _, _) = rewrite(
            &model,
            "a = this.$store.getters['cart/total']\nb = this.$store.getters.isAdmin\nc = this.$store.state.cart.items\nd = this.$store.state.theme",
        );
        assert_eq!(
            out,
            "a = cartStore.total\nb = rootStore.isAdmin\nc = cartStore.items\nd = rootStore.theme"
        );
    }

    #[test]
    fn test_set_and_delete() {
        let mut model = model();
        model.data.push(DataProperty {
            name: "form".into(),
            init: "{}".into(),
        });
        let (out, _, _) = rewrite(
            &model,
            "this.$set(this.form, 'name', value)\nthis.$delete(this.form, key)\nVue.set(list, 0, fn(a, b))",
        );
        assert_eq!(
            out,
            "form.value.name = value\ndelete form.value[key]\nlist[0] = fn(a, b)"
        );
    }

    #[test]
    fn test_framework_accessors() {
        let model = model();
        let (out, usage, _) = rewrite(
            &model,
            "this.$router.push(this.$route.query.next)\nthis.$nextTick(() => this.$refs.input.focus())\nthis.$emit('input', this.$tc('x'))\nthis.$i18n.locale = 'en'\nthis.$nuxt.$emit('saved')\nthis.$axios.get(this.$config.api)\nthis.$el.scrollTop = 0",
        );
        assert_eq!(
            out,
            "router.push(route.query.next)\nnextTick(() => input.value.focus())\nemit('update:value', t('x'))\nlocale.value = 'en'\neventBus.emit('saved')\naxios.get(config.api)\ninstance.proxy.$el.scrollTop = 0"
        );
        for feature in [
            Features::ROUTE,
            Features::ROUTER,
            Features::NEXT_TICK,
            Features::EMIT,
            Features::LOCALE,
            Features::EVENT_BUS,
            Features::HTTP,
            Features::RUNTIME_CONFIG,
            Features::INSTANCE,
        ] {
            assert!(usage.flags.has(feature), "{:?}", feature);
        }
        assert!(usage.flags.i18n.contains("t"));
    }

    #[test]
    fn test_fetch_call() {
        let model = model();
        let (out, usage, _) = rewrite(&model, "await this.$fetch()");
        assert_eq!(out, "await fetchData()");
        assert!(usage.flags.has(Features::FETCH_CALL));
    }

    #[test]
    fn test_unknown_dollar_accessor_is_flagged() {
        let model = model();
        let (out, _, diagnostics) = rewrite(&model, "this.$toast.show()");
        assert_eq!(
            out,
            "// [pentimento] unresolved reference: this.$toast\nthis.$toast.show()"
        );
        assert_eq!(diagnostics.len(), 1);
    }

    #[test]
    fn test_bare_this_is_flagged() {
        let model = model();
        let (out, _, _) = rewrite(&model, "helper(this)");
        assert_eq!(out, "// [pentimento] unresolved reference: this\nhelper(this)");
    }

    #[test]
    fn test_one_marker_per_line_and_name() {
        let model = model();
        let (out, _, diagnostics) = rewrite(&model, "f(this.a, this.a, this.b)");
        assert_eq!(
            out,
            "// [pentimento] unresolved reference: this.a\n// [pentimento] unresolved reference: this.b\nf(this.a, this.a, this.b)"
        );
        assert_eq!(diagnostics.len(), 2);
    }

    #[test]
    fn test_scope_shadowing_is_not_detected() {
        let model = model();
        let (out, _, diagnostics) = rewrite(
            &model,
            "const count = 5\nconst unknown = 1\nreturn this.count + this.unknown",
        );
        assert_eq!(
            out,
            "const count = 5\nconst unknown = 1\n// [pentimento] unresolved reference: this.unknown\nreturn count.value + this.unknown"
        );
        assert_eq!(diagnostics.len(), 1);
    }

    #[test]
    fn test_unparseable_body_falls_back_to_text() {
        let model = model();
        let (out, _, diagnostics) = rewrite(&model, "this.count = (\nthis.save(");
        assert_eq!(out, "count.value = (\nsave(");
        assert_eq!(diagnostics[0].kind, DiagnosticKind::BodyParseFallback);
    }

    #[test]
    fn test_expression_body() {
        let model = model();
        let registry = StoreRegistry::snapshot(&FxHashMap::default(), [] as [&str; 0]);
        let mut classifier = Classifier::new(&model, &registry, SourceType::mjs(), "fetchData");
        let out = classifier.rewrite(
            "debounce(function () { this.save(this.count) }, 300)",
            BodyKind::Expression,
        );
        assert_eq!(out, "debounce(function () { save(count.value) }, 300)");
    }

    #[test]
    fn test_mixin_symbols() {
        let mut mixins = FxHashMap::default();
        mixins.insert(
            "form".to_string(),
            pentimento_croquis::MixinConfig {
                name: "useForm".into(),
                imports: vec!["errors".into(), "validate".into()],
                path: None,
            },
        );
        let model = extract_component(
            "import form from '@/mixins/form'\nexport default { mixins: [form] }",
            SourceType::mjs(),
            &mixins,
        )
        .unwrap();
        let registry = StoreRegistry::snapshot(&FxHashMap::default(), [] as [&str; 0]);
        let mut classifier = Classifier::new(&model, &registry, SourceType::mjs(), "fetchData");
        let out = classifier.rewrite(
            "if (this.validate()) this.errors.length = 0\nthis.errors = []",
            BodyKind::Statements,
        );
        assert_eq!(
            out,
            "if (validate()) errors.length = 0\n// [pentimento] assignment to composable binding: this.errors\nthis.errors = []"
        );
        let (usage, diagnostics) = classifier.finish();
        assert!(usage.mixin_symbols.contains("validate"));
        assert!(usage.mixin_symbols.contains("errors"));
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].kind, DiagnosticKind::ReadOnlyBinding);
    }

    #[test]
    fn test_accessor_getter_is_invoked_when_read() {
        let mut model = model();
        model.store_bindings.push(StoreBinding {
            namespace: "cart".into(),
            kind: StoreKind::Getter,
            local: "getTotal".into(),
            remote: "getTotal".into(),
        });
        let (out, _, _) = rewrite(
            &model,
            "console.log(this.getTotal)\nconst byTax = this.getTotal(rate)",
        );
        assert_eq!(
            out,
            "console.log(cartStore.getTotal())\nconst byTax = cartStore.getTotal(rate)"
        );
    }

    #[test]
    fn test_instance_parameter() {
        let model = model();
        let registry = StoreRegistry::snapshot(&FxHashMap::default(), [] as [&str; 0]);
        let mut classifier = Classifier::new(&model, &registry, SourceType::mjs(), "fetchData");
        let out = classifier.rewrite_with_instance(
            "return vm.count * 3 + other.vm + vm.$route.path.length",
            BodyKind::Statements,
            "vm",
        );
        assert_eq!(out, "return count.value * 3 + other.vm + route.path.length");
        assert!(classifier.usage().flags.has(Features::ROUTE));
    }

    #[test]
    fn test_instance_parameter_in_unparseable_body() {
        let model = model();
        let registry = StoreRegistry::snapshot(&FxHashMap::default(), [] as [&str; 0]);
        let mut classifier = Classifier::new(&model, &registry, SourceType::mjs(), "fetchData");
        let out =
            classifier.rewrite_with_instance("return (vm.count + a.vm", BodyKind::Statements, "vm");
        assert_eq!(out, "return (count.value + a.vm");
    }

    #[test]
    fn test_access_after() {
        assert_eq!(access_after(" (1)"), Access::Call);
        assert_eq!(access_after(" = []"), Access::Write);
        assert_eq!(access_after("++"), Access::Write);
        assert_eq!(access_after(" ??= 1"), Access::Write);
        assert_eq!(access_after(" === 1"), Access::Read);
        assert_eq!(access_after(" >= 1"), Access::Read);
        assert_eq!(access_after(".length"), Access::Read);
    }

    #[test]
    fn test_split_call_args() {
        let text = "f(a, 'b,c', g(1, 2), [3, 4]) rest";
        let (args, end) = split_call_args(text, 2).unwrap();
        assert_eq!(args.as_slice(), ["a", "'b,c'", "g(1, 2)", "[3, 4]"]);
        assert_eq!(&text[end..], " rest");
    }

    #[test]
    fn test_member_access() {
        assert_eq!(member_access("obj", "'name'"), "obj.name");
        assert_eq!(member_access("obj", "\"a-b\""), "obj[\"a-b\"]");
        assert_eq!(member_access("obj", "key"), "obj[key]");
    }
}
