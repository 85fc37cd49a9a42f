//! The Component Model.
//!
//! One [`ComponentModel`] describes one Options API component. It is built once by
//! the extractor and then only read by the classifier and the assembler; the only
//! later additions are template ref names and store namespaces found in markup,
//! merged before any body is rewritten.

use std::collections::BTreeSet;

use pentimento_carton::{bitflags, CompactString};

use crate::config::MixinConfig;
use crate::lifecycle::LifecycleKind;
use crate::store::{is_accessor_getter, StoreKind};

/// Parameter list, body and async-ness of a function-valued option.
///
/// `params` excludes the surrounding parentheses; `body` excludes the braces.
/// A concise arrow body is stored as `return <expr>;`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FunctionText {
    pub params: String,
    pub body: String,
    pub is_async: bool,
}

/// A `data()` entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataProperty {
    pub name: CompactString,
    pub init: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComputedKind {
    Plain(FunctionText),
    GetSet {
        get: FunctionText,
        set: Option<FunctionText>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComputedProperty {
    pub name: CompactString,
    pub kind: ComputedKind,
}

/// How a method is declared in `methods`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodForm {
    /// `foo() {}` or `foo: function () {}`
    Function,
    /// `foo: () => {}`
    Arrow,
    /// Any other value, e.g. `foo: debounce(function () {}, 300)`; `body` holds the expression.
    Expression,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Method {
    pub name: CompactString,
    pub function: FunctionText,
    pub form: MethodForm,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatcherForm {
    /// `count(value, old) {}`
    Function(FunctionText),
    /// `{ handler, deep }` objects and method-name strings, kept as source text.
    Unsupported(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Watcher {
    /// Watched path as written, e.g. `count`, `user.name`, `$route.query`.
    pub target: CompactString,
    pub form: WatcherForm,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LifecycleHook {
    pub kind: LifecycleKind,
    /// Option key as written (`beforeDestroy`, `beforeUnmount`, ...)
    pub option: CompactString,
    pub function: FunctionText,
}

/// `props` declaration, kept verbatim.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropSet {
    pub raw: String,
    pub names: Vec<CompactString>,
}

impl PropSet {
    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }
}

/// A configured mixin in `mixins: [...]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MixinUsage {
    pub local: CompactString,
    pub source: String,
    pub composable: CompactString,
    pub module: String,
    pub symbols: Vec<CompactString>,
}

impl MixinUsage {
    pub fn new(local: &str, source: &str, config: &MixinConfig) -> Self {
        Self {
            local: CompactString::new(local),
            source: source.to_string(),
            composable: CompactString::new(&config.name),
            module: config.module(),
            symbols: config.imports.iter().map(CompactString::new).collect(),
        }
    }

    #[inline]
    pub fn provides(&self, name: &str) -> bool {
        self.symbols.iter().any(|s| s == name)
    }
}

/// One name produced by a bulk mapping helper.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreBinding {
    pub namespace: CompactString,
    pub kind: StoreKind,
    pub local: CompactString,
    /// Store member path, e.g. `items` or `items.length`.
    pub remote: CompactString,
}

impl StoreBinding {
    /// The binding read as a value through `instance`.
    ///
    /// Naming heuristic: `getTotal`-style getters are invoked.
    pub fn read(&self, instance: &str) -> String {
        if self.kind == StoreKind::Getter && is_accessor_getter(&self.remote) {
            format!("{}.{}()", instance, self.remote)
        } else {
            format!("{}.{}", instance, self.remote)
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AsyncDataBlock {
    pub function: FunctionText,
    /// Keys of every object literal returned from the top-level body.
    pub returned: Vec<CompactString>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeadBlock {
    /// `head() { return { .. } }` or `head: { .. }`; holds the object text.
    SimpleReturn(String),
    /// Anything else; holds the function.
    Complex(FunctionText),
}

/// Template refs by where they were seen.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RefUsage {
    pub declared: BTreeSet<CompactString>,
    pub referenced: BTreeSet<CompactString>,
}

impl RefUsage {
    /// Every ref that needs a binding, in name order.
    pub fn all(&self) -> BTreeSet<CompactString> {
        self.declared.union(&self.referenced).cloned().collect()
    }
}

bitflags! {
    /// Framework services reached through `this.$*` (or markup globals).
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
    pub struct Features: u16 {
        const HTTP = 1 << 0;
        const EVENT_BUS = 1 << 1;
        const RUNTIME_CONFIG = 1 << 2;
        const NEXT_TICK = 1 << 3;
        const ROUTE = 1 << 4;
        const ROUTER = 1 << 5;
        const SLOTS = 1 << 6;
        const ATTRS = 1 << 7;
        const INSTANCE = 1 << 8;
        const LOCALE = 1 << 9;
        const EMIT = 1 << 10;
        const FETCH_CALL = 1 << 11;
    }
}

/// Services a migrated component needs, recorded while its bodies and markup
/// are rewritten. Drives which composables and imports get emitted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlagSet {
    pub features: Features,
    /// i18n functions used, already normalized (`$tc` is recorded as `t`).
    pub i18n: BTreeSet<CompactString>,
}

impl FlagSet {
    #[inline]
    pub fn has(&self, feature: Features) -> bool {
        self.features.contains(feature)
    }

    #[inline]
    pub fn insert(&mut self, feature: Features) {
        self.features.insert(feature);
    }

    pub fn merge(&mut self, other: &FlagSet) {
        self.features |= other.features;
        self.i18n.extend(other.i18n.iter().cloned());
    }

    /// Whether `useI18n()` is needed at all.
    #[inline]
    pub fn uses_i18n(&self) -> bool {
        !self.i18n.is_empty() || self.has(Features::LOCALE)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportBinding {
    Default,
    Namespace,
    Named,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportSpecifier {
    pub binding: ImportBinding,
    /// Exported name for named imports; `default` / `*` otherwise.
    pub imported: CompactString,
    pub local: CompactString,
}

/// A top-level `import` declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportRecord {
    pub source: String,
    pub text: String,
    pub specifiers: Vec<ImportSpecifier>,
    pub type_only: bool,
    /// `import './polyfill'`
    pub side_effect: bool,
}

impl ImportRecord {
    pub fn binds(&self, local: &str) -> bool {
        self.specifiers.iter().any(|s| s.local == local)
    }
}

/// A top-level statement outside the component definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreservedDeclaration {
    pub text: String,
    /// `const Foo = () => import('..')`: `(Foo, "() => import('..')")`
    pub async_component: Option<(CompactString, String)>,
}

/// An entry of the `components` option.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentRegistration {
    pub name: CompactString,
    /// Loader text for `Foo: () => import('..')`
    pub loader: Option<String>,
}

/// Everything one Options API component declares.
#[derive(Debug, Clone, Default)]
pub struct ComponentModel {
    pub has_default_export: bool,
    pub name: Option<CompactString>,
    pub props: Option<PropSet>,
    /// Declared and discovered event names, normalized, in first-seen order.
    pub emits: Vec<CompactString>,
    /// Statements in `data()` before its `return`.
    pub data_prelude: Option<String>,
    pub data: Vec<DataProperty>,
    pub computed: Vec<ComputedProperty>,
    pub methods: Vec<Method>,
    pub watchers: Vec<Watcher>,
    pub hooks: Vec<LifecycleHook>,
    pub mixins: Vec<MixinUsage>,
    /// Mixins listed in `mixins` without a configured replacement.
    pub unmapped_mixins: Vec<CompactString>,
    pub store_bindings: Vec<StoreBinding>,
    pub async_data: Option<AsyncDataBlock>,
    pub head: Option<HeadBlock>,
    pub fetch: Option<FunctionText>,
    pub nuxt_i18n: Option<String>,
    pub components: Vec<ComponentRegistration>,
    pub refs: RefUsage,
    pub imports: Vec<ImportRecord>,
    pub preserved: Vec<PreservedDeclaration>,
    /// Namespaces seen in `commit`/`dispatch`/`getters[..]` and bulk maps.
    pub store_namespaces: BTreeSet<CompactString>,
    /// Option keys the extractor does not migrate.
    pub unsupported_options: Vec<CompactString>,
}

impl ComponentModel {
    pub fn data_property(&self, name: &str) -> Option<&DataProperty> {
        self.data.iter().find(|d| d.name == name)
    }

    pub fn computed_property(&self, name: &str) -> Option<&ComputedProperty> {
        self.computed.iter().find(|c| c.name == name)
    }

    pub fn method(&self, name: &str) -> Option<&Method> {
        self.methods.iter().find(|m| m.name == name)
    }

    pub fn store_binding(&self, local: &str) -> Option<&StoreBinding> {
        self.store_bindings.iter().find(|b| b.local == local)
    }

    pub fn mixin_providing(&self, name: &str) -> Option<&MixinUsage> {
        self.mixins.iter().find(|m| m.provides(name))
    }

    pub fn is_async_data_key(&self, name: &str) -> bool {
        self.async_data
            .as_ref()
            .is_some_and(|block| block.returned.iter().any(|k| k == name))
    }

    /// Data, computed and async-data names all read through `.value`.
    pub fn is_reactive(&self, name: &str) -> bool {
        self.data_property(name).is_some()
            || self.computed_property(name).is_some()
            || self.is_async_data_key(name)
    }

    pub fn is_prop(&self, name: &str) -> bool {
        self.props.as_ref().is_some_and(|p| p.contains(name))
    }

    /// Data properties that become plain refs (async-data keys excluded).
    pub fn plain_data(&self) -> impl Iterator<Item = &DataProperty> {
        self.data.iter().filter(|d| !self.is_async_data_key(&d.name))
    }

    pub fn add_emit(&mut self, name: &str) {
        let normalized = normalize_emit(name);
        if !self.emits.iter().any(|e| e == normalized) {
            self.emits.push(CompactString::new(normalized));
        }
    }
}

/// `'input'` becomes `'update:value'` so `v-model` keeps working.
#[inline]
pub fn normalize_emit(name: &str) -> &str {
    if name == "input" {
        "update:value"
    } else {
        name
    }
}

/// Insert or replace by name, keeping the first position and the last value.
pub(crate) fn upsert<T>(items: &mut Vec<T>, item: T, name_of: impl Fn(&T) -> &str) {
    let name = name_of(&item).to_string();
    match items.iter().position(|existing| name_of(existing) == name) {
        Some(index) => items[index] = item,
        None => items.push(item),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_emit() {
        assert_eq!(normalize_emit("input"), "update:value");
        assert_eq!(normalize_emit("change"), "change");
    }

    #[test]
    fn test_add_emit_dedupes_after_normalizing() {
        let mut model = ComponentModel::default();
        model.add_emit("update:value");
        model.add_emit("input");
        model.add_emit("close");
        assert_eq!(model.emits, vec!["update:value", "close"]);
    }

    #[test]
    fn test_upsert_last_write_wins() {
        let mut data = Vec::new();
        let name_of: fn(&DataProperty) -> &str = |d| d.name.as_str();
        upsert(&mut data, DataProperty { name: "a".into(), init: "1".into() }, name_of);
        upsert(&mut data, DataProperty { name: "b".into(), init: "2".into() }, name_of);
        upsert(&mut data, DataProperty { name: "a".into(), init: "3".into() }, name_of);
        assert_eq!(data.len(), 2);
        assert_eq!(data[0].init, "3");
    }

    #[test]
    fn test_flag_set_merge() {
        let mut flags = FlagSet::default();
        assert!(!flags.uses_i18n());
        flags.insert(Features::ROUTE);

        let mut other = FlagSet::default();
        other.insert(Features::LOCALE);
        flags.merge(&other);
        assert!(flags.has(Features::ROUTE));
        assert!(flags.uses_i18n());
        assert!(flags.i18n.is_empty());
    }

    #[test]
    fn test_store_binding_read() {
        let mut binding = StoreBinding {
            namespace: "cart".into(),
            kind: StoreKind::Getter,
            local: "total".into(),
            remote: "getTotal".into(),
        };
        assert_eq!(binding.read("cartStore"), "cartStore.getTotal()");
        binding.kind = StoreKind::State;
        assert_eq!(binding.read("cartStore"), "cartStore.getTotal");
    }

    #[test]
    fn test_ref_usage_union() {
        let mut refs = RefUsage::default();
        refs.declared.insert("input".into());
        refs.referenced.insert("input".into());
        refs.referenced.insert("list".into());
        let all: Vec<_> = refs.all().into_iter().collect();
        assert_eq!(all, vec!["input", "list"]);
    }
}
