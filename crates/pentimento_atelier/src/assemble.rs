//! Code assembly.
//!
//! Bodies are rewritten first, since what they end up referencing decides
//! which composables and imports are needed. The sections are then emitted in
//! a fixed order:
//!
//! 1. imports and preserved top-level declarations
//! 2. composable instantiations
//! 3. macros (`defineOptions`, `defineProps`, `defineEmits`), data and template refs
//! 4. computed properties
//! 5. async data, head and i18n route wiring
//! 6. methods and the fetch hook
//! 7. watchers
//! 8. lifecycle hooks
//! 9. the trailing fetch invocation

use std::collections::{BTreeMap, BTreeSet};

use oxc_span::SourceType;
use pentimento_carton::{contains_word, is_identifier, pascalize, reindent, CompactString};
use pentimento_croquis::{
    ComponentModel, ComputedKind, Features, FunctionText, HeadBlock, ImportBinding,
    ImportRecord, LifecycleKind, MethodForm, WatcherForm,
};

use crate::classify::{BodyKind, Classifier, Usage};
use crate::diagnostic::{
    marker, unresolved_marker, unresolved_message, Diagnostic, DiagnosticKind, MARKER_PREFIX,
};
use crate::options::{ImportRewrite, MigrateOptions};
use crate::registry::StoreRegistry;
use crate::template::TemplateUsage;

const INDENT: &str = "  ";

/// Everything the assembler reads.
pub struct AssembleContext<'a> {
    pub model: &'a ComponentModel,
    pub options: &'a MigrateOptions,
    pub registry: &'a StoreRegistry,
    pub template: &'a TemplateUsage,
    /// Store namespaces the rewritten template references
    pub template_stores: &'a BTreeSet<CompactString>,
    pub source_type: SourceType,
}

/// The assembled script, one string per non-empty section.
#[derive(Debug, Default)]
pub struct Assembled {
    pub sections: Vec<String>,
    pub diagnostics: Vec<Diagnostic>,
}

impl Assembled {
    /// The unformatted script.
    pub fn to_script(&self) -> String {
        let mut out = self.sections.join("\n\n");
        out.push('\n');
        out
    }
}

/// Assemble the `<script setup>` body of one component.
pub fn assemble(cx: AssembleContext<'_>) -> Assembled {
    let fetch_name = if cx.model.method("fetchData").is_some() {
        "runFetch"
    } else {
        "fetchData"
    };
    let classifier = Classifier::new(cx.model, cx.registry, cx.source_type, fetch_name);
    let mut assembler = Assembler {
        cx: &cx,
        classifier,
        fetch_name,
        vue: BTreeSet::new(),
        features: Features::empty(),
        stores: BTreeSet::new(),
        imports: ImportMap::default(),
        diagnostics: Vec::new(),
    };
    assembler.run()
}

struct Assembler<'a, 'c> {
    cx: &'c AssembleContext<'a>,
    classifier: Classifier<'a>,
    fetch_name: &'static str,
    /// Core framework symbols to import
    vue: BTreeSet<&'static str>,
    /// Features needed beyond what the classifier recorded
    features: Features,
    /// Store namespaces needed beyond what the classifier recorded
    stores: BTreeSet<CompactString>,
    imports: ImportMap,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> Assembler<'a, '_> {
    fn run(mut self) -> Assembled {
        let model = self.cx.model;

        let state = self.state();
        let computed = self.computed();
        let wiring = self.async_and_head();
        let methods = self.methods();
        let watchers = self.watchers();
        let hooks = self.hooks();
        let trailing = model
            .fetch
            .as_ref()
            .map(|_| format!("{}();", self.fetch_name))
            .unwrap_or_default();

        let mut usage = self.classifier.usage().clone();
        usage.flags.merge(&self.cx.template.flags);
        usage.flags.features |= self.features;
        usage.stores.extend(self.cx.template_stores.iter().cloned());
        usage.stores.extend(self.stores.iter().cloned());
        let instances = self.instances(&usage);

        let body = [
            instances.as_str(),
            state.as_str(),
            computed.as_str(),
            wiring.as_str(),
            methods.as_str(),
            watchers.as_str(),
            hooks.as_str(),
            trailing.as_str(),
        ]
        .join("\n");
        let macros = self.macros(&body, &usage);

        let declarations = self.preserved_declarations();
        let imports = self.imports(&format!("{}\n{}\n{}", declarations, macros, body));

        let mut head = imports;
        if !declarations.is_empty() {
            if !head.is_empty() {
                head.push_str("\n\n");
            }
            head.push_str(&declarations);
        }

        let mut state_section = macros;
        if !state.is_empty() {
            if !state_section.is_empty() {
                state_section.push('\n');
            }
            state_section.push_str(&state);
        }

        self.report_model();

        let (_, classifier_diagnostics) = self.classifier.finish();
        let mut diagnostics = classifier_diagnostics;
        diagnostics.append(&mut self.diagnostics);

        let sections = [
            head,
            instances,
            state_section,
            computed,
            wiring,
            methods,
            watchers,
            hooks,
            trailing,
        ]
        .into_iter()
        .filter(|section| !section.trim().is_empty())
        .collect();

        Assembled {
            sections,
            diagnostics,
        }
    }

    // --- helpers ---

    fn body(&mut self, function: &FunctionText, indent: &str) -> String {
        let rewritten = self
            .classifier
            .rewrite(&function.body, BodyKind::Statements);
        reindent(&rewritten, indent)
    }

    fn expression(&mut self, text: &str) -> String {
        self.classifier
            .rewrite(text, BodyKind::Expression)
            .trim()
            .to_string()
    }

    fn store_instance(&mut self, namespace: &str) -> String {
        self.stores.insert(CompactString::new(namespace));
        self.cx.registry.resolve(namespace).instance
    }

    /// Whether a component member already claims `name`.
    fn declared(&self, name: &str) -> bool {
        let model = self.cx.model;
        model.is_reactive(name) || model.method(name).is_some() || model.is_prop(name)
    }

    // --- section 3 ---

    /// Data prelude, data refs and template refs.
    fn state(&mut self) -> String {
        let model = self.cx.model;
        let mut lines = Vec::new();

        if let Some(prelude) = &model.data_prelude {
            let prelude = self.classifier.rewrite(prelude, BodyKind::Statements);
            let prelude = reindent(&prelude, "");
            if !prelude.is_empty() {
                lines.push(prelude);
            }
        }

        for data in model.plain_data() {
            let init = self.expression(&data.init);
            lines.push(format!("const {} = ref({});", data.name, init));
            self.vue.insert("ref");
        }

        let mut refs: BTreeSet<CompactString> = model.refs.all();
        refs.extend(self.cx.template.refs.iter().cloned());
        for name in refs {
            if !is_identifier(&name) {
                continue;
            }
            if self.declared(&name) {
                // The element would bind into the member's ref and overwrite it.
                let message = format!(
                    "template ref `{}` shares its name with a component member; rename one of them",
                    name
                );
                tracing::warn!("{}", message);
                lines.push(marker(&message));
                self.diagnostics
                    .push(Diagnostic::new(DiagnosticKind::RefNameClash, message));
                continue;
            }
            lines.push(format!("const {} = ref(null);", name));
            self.vue.insert("ref");
        }

        lines.join("\n")
    }

    /// `defineOptions`, `defineProps` and `defineEmits`.
    fn macros(&mut self, body: &str, usage: &Usage) -> String {
        let model = self.cx.model;
        let mut lines = Vec::new();

        if let Some(name) = &model.name {
            lines.push(format!("defineOptions({{ name: {} }});", quote(name)));
        }

        if let Some(props) = &model.props {
            let binding = if contains_word(body, "props") {
                "const props = "
            } else {
                ""
            };
            lines.push(format!("{}defineProps({});", binding, props.raw.trim()));
        }

        if !model.emits.is_empty() || usage.flags.has(Features::EMIT) {
            let names: Vec<String> = model.emits.iter().map(|e| quote(e)).collect();
            let binding = if usage.flags.has(Features::EMIT) {
                "const emit = "
            } else {
                ""
            };
            lines.push(format!("{}defineEmits([{}]);", binding, names.join(", ")));
        }

        lines.join("\n")
    }

    // --- section 4 ---

    fn computed(&mut self) -> String {
        let model = self.cx.model;
        let mut items = Vec::new();

        for computed in &model.computed {
            let declaration = match &computed.kind {
                ComputedKind::Plain(getter) => {
                    let body = self.getter_body(getter);
                    format!("const {} = computed({});", computed.name, getter_arrow(&body))
                }
                ComputedKind::GetSet { get, set } => {
                    let inner = format!("{}{}", INDENT, INDENT);
                    let body = reindent(&self.getter_body(get), &inner);
                    let mut accessors = vec![format!("{}get() {}", INDENT, block(&body, INDENT))];
                    if let Some(set) = set {
                        accessors.push(format!(
                            "{}set({}) {}",
                            INDENT,
                            set.params.trim(),
                            block(&self.body(set, &inner), INDENT)
                        ));
                    }
                    format!(
                        "const {} = computed({{\n{},\n}});",
                        computed.name,
                        accessors.join(",\n")
                    )
                }
            };
            items.push(declaration);
            self.vue.insert("computed");
        }

        // Store state and getters the template reads.
        for binding in &model.store_bindings {
            if !binding.kind.is_readable()
                || !self.cx.template.uses_identifier(&binding.local)
                || self.declared(&binding.local)
            {
                continue;
            }
            let instance = self.store_instance(&binding.namespace);
            items.push(format!(
                "const {} = computed(() => {});",
                binding.local,
                binding.read(&instance)
            ));
            self.vue.insert("computed");
        }

        items.join("\n")
    }

    /// A computed getter body. Vue 2 passes the instance as the getter's
    /// argument (`vm => vm.count * 2`); that parameter is read as `this`.
    fn getter_body(&mut self, getter: &FunctionText) -> String {
        let param = getter.params.trim();
        if param.is_empty() {
            return self.classifier.rewrite(&getter.body, BodyKind::Statements);
        }
        if is_identifier(param) {
            return self
                .classifier
                .rewrite_with_instance(&getter.body, BodyKind::Statements, param);
        }

        let message = format!("unsupported computed getter parameter: {}", param);
        self.diagnostics.push(Diagnostic::new(
            DiagnosticKind::UnresolvedReference,
            message.clone(),
        ));
        let body = self.classifier.rewrite(&getter.body, BodyKind::Statements);
        format!("{}\n{}", marker(&message), reindent(&body, ""))
    }

    // --- section 5 ---

    fn async_and_head(&mut self) -> String {
        let model = self.cx.model;
        let cx = self.cx;
        let origins = &cx.options.modules;
        let mut items = Vec::new();

        if let Some(async_data) = &model.async_data {
            let body = self.body(&async_data.function, INDENT);
            let handler = format!(
                "{}({}) => {}",
                async_prefix(&async_data.function),
                async_data.function.params.trim(),
                block(&body, "")
            );
            let mut lines = vec![format!(
                "const {{ data: asyncData }} = await useAsyncData({});",
                handler
            )];
            for key in &async_data.returned {
                lines.push(format!("const {} = ref(asyncData.value?.{});", key, key));
                self.vue.insert("ref");
            }
            items.push(lines.join("\n"));
            self.imports.add(&origins.async_data, "useAsyncData");
        }

        if let Some(head) = &model.head {
            let call = match head {
                HeadBlock::SimpleReturn(object) => {
                    let rewritten = self.expression(object);
                    if rewritten == object.trim() {
                        format!("useHead({});", rewritten)
                    } else {
                        format!("useHead(() => ({}));", rewritten)
                    }
                }
                HeadBlock::Complex(function) => {
                    let body = self.body(function, INDENT);
                    format!("useHead(() => {});", block(&body, ""))
                }
            };
            items.push(call);
            self.imports.add(&origins.head, "useHead");
        }

        if let Some(route) = &model.nuxt_i18n {
            items.push(format!("defineI18nRoute({});", route.trim()));
        }

        items.join("\n\n")
    }

    // --- section 6 ---

    fn methods(&mut self) -> String {
        let model = self.cx.model;
        let mut items = Vec::new();

        for method in &model.methods {
            let item = match method.form {
                MethodForm::Function | MethodForm::Arrow => {
                    let body = self.body(&method.function, INDENT);
                    function_declaration(&method.name, &method.function, &body)
                }
                MethodForm::Expression => {
                    let value = self.expression(&method.function.body);
                    format!("const {} = {};", method.name, value)
                }
            };
            items.push(item);
        }

        // Store actions and mutations the template calls.
        for binding in &model.store_bindings {
            if binding.kind.is_readable()
                || !self.cx.template.uses_identifier(&binding.local)
                || self.declared(&binding.local)
            {
                continue;
            }
            let instance = self.store_instance(&binding.namespace);
            items.push(format!(
                "function {}(...args) {{\n{}return {}.{}(...args);\n}}",
                binding.local, INDENT, instance, binding.remote
            ));
        }

        if let Some(fetch) = &model.fetch {
            let body = self.body(fetch, INDENT);
            items.push(function_declaration(self.fetch_name, fetch, &body));
        }

        items.join("\n\n")
    }

    // --- section 7 ---

    fn watchers(&mut self) -> String {
        let model = self.cx.model;
        let mut items = Vec::new();

        for watcher in &model.watchers {
            match &watcher.form {
                WatcherForm::Function(handler) => {
                    let (source, marker) = self.watch_source(&watcher.target);
                    let body = self.body(handler, INDENT);
                    let callback = format!(
                        "{}({}) => {}",
                        async_prefix(handler),
                        handler.params.trim(),
                        block(&body, "")
                    );
                    let call = format!("watch({}, {});", source, callback);
                    items.push(match marker {
                        Some(marker) => format!("{}\n{}", marker, call),
                        None => call,
                    });
                    self.vue.insert("watch");
                }
                WatcherForm::Unsupported(text) => {
                    tracing::debug!("keeping watcher `{}` as a comment", watcher.target);
                    self.diagnostics.push(Diagnostic::new(
                        DiagnosticKind::UnsupportedWatcher,
                        format!("unsupported watcher form: {}", watcher.target),
                    ));
                    items.push(format!(
                        "{} unsupported watcher form: {}\n/*\nwatch {}: {}\n*/",
                        MARKER_PREFIX,
                        watcher.target,
                        watcher.target,
                        text.trim().replace("*/", "* /")
                    ));
                }
            }
        }

        items.join("\n\n")
    }

    /// Watch source for a watcher key, plus a marker line when it does not resolve.
    fn watch_source(&mut self, target: &str) -> (String, Option<String>) {
        let (head, rest) = match target.split_once('.') {
            Some((head, rest)) => (head, Some(rest)),
            None => (target, None),
        };

        if head == "$route" {
            self.features.insert(Features::ROUTE);
            let source = match rest {
                Some(rest) => format!("() => route.{}", rest),
                None => "() => route".to_string(),
            };
            return (source, None);
        }

        if rest.is_none() && self.cx.model.is_reactive(head) {
            return (head.to_string(), None);
        }

        match self.classifier.resolve_name(head) {
            Some(resolved) => {
                let source = match rest {
                    Some(rest) => format!("() => {}.{}", resolved, rest),
                    None => format!("() => {}", resolved),
                };
                (source, None)
            }
            None => {
                self.diagnostics.push(Diagnostic::new(
                    DiagnosticKind::UnresolvedReference,
                    unresolved_message(head),
                ));
                (
                    format!("() => this.{}", target),
                    Some(unresolved_marker(head)),
                )
            }
        }
    }

    // --- section 8 ---

    fn hooks(&mut self) -> String {
        let model = self.cx.model;
        let mut merged: BTreeMap<LifecycleKind, MergedHook> = BTreeMap::new();

        for hook in &model.hooks {
            let body = self
                .classifier
                .rewrite(&hook.function.body, BodyKind::Statements);
            let entry = merged.entry(hook.kind).or_default();
            entry.is_async |= hook.function.is_async;
            if entry.params.is_empty() {
                entry.params = hook.function.params.trim().to_string();
            }
            entry.bodies.push(body);
        }

        let mut items = Vec::new();
        for (kind, hook) in merged {
            let MergedHook {
                is_async,
                params,
                bodies,
            } = hook;
            match kind.registration() {
                None => {
                    // `beforeCreate` and `created` run inline in setup.
                    let wrap = is_async || bodies.iter().any(|b| contains_word(b, "return"));
                    let indent = if wrap { INDENT } else { "" };
                    let body = join_bodies(&bodies, indent);
                    if body.is_empty() {
                        continue;
                    }
                    items.push(if !wrap {
                        body
                    } else if is_async {
                        format!("(async () => {})();", block(&body, ""))
                    } else {
                        format!("(() => {})();", block(&body, ""))
                    });
                }
                Some(registration) => {
                    let body = join_bodies(&bodies, INDENT);
                    items.push(format!(
                        "{}({}({}) => {});",
                        registration,
                        if is_async { "async " } else { "" },
                        params,
                        block(&body, "")
                    ));
                    self.vue.insert(registration);
                }
            }
        }

        items.join("\n\n")
    }

    // --- section 2 ---

    fn instances(&mut self, usage: &Usage) -> String {
        let model = self.cx.model;
        let cx = self.cx;
        let origins = &cx.options.modules;
        let template = self.cx.template;
        let flags = &usage.flags;
        let mut lines = Vec::new();

        if flags.uses_i18n() {
            let mut i18n: BTreeSet<CompactString> = flags.i18n.clone();
            if flags.has(Features::LOCALE) {
                i18n.insert(CompactString::const_new("locale"));
            }
            let names: Vec<&str> = i18n.iter().map(|n| n.as_str()).collect();
            lines.push(format!("const {{ {} }} = useI18n();", names.join(", ")));
            self.imports.add(&origins.i18n, "useI18n");
        }

        for mixin in &model.mixins {
            let used: Vec<&str> = mixin
                .symbols
                .iter()
                .filter(|s| usage.mixin_symbols.contains(*s) || template.uses_identifier(s))
                .map(|s| s.as_str())
                .collect();
            lines.push(if used.is_empty() {
                format!("{}();", mixin.composable)
            } else {
                format!("const {{ {} }} = {}();", used.join(", "), mixin.composable)
            });
        }

        if flags.has(Features::HTTP) {
            lines.push("const axios = useAxios();".to_string());
            self.imports.add(&origins.http, "useAxios");
        }
        if flags.has(Features::EVENT_BUS) {
            lines.push("const eventBus = useEventBus();".to_string());
            self.imports.add(&origins.event_bus, "useEventBus");
        }

        for (feature, line, symbol) in [
            (Features::SLOTS, "const slots = useSlots();", "useSlots"),
            (Features::ATTRS, "const attrs = useAttrs();", "useAttrs"),
            (
                Features::INSTANCE,
                "const instance = getCurrentInstance();",
                "getCurrentInstance",
            ),
        ] {
            if flags.has(feature) {
                lines.push(line.to_string());
                self.imports.add(&origins.compat, symbol);
            }
        }

        if flags.has(Features::ROUTE) {
            lines.push("const route = useRoute();".to_string());
            self.imports.add(&origins.router, "useRoute");
        }
        if flags.has(Features::ROUTER) {
            lines.push("const router = useRouter();".to_string());
            self.imports.add(&origins.router, "useRouter");
        }
        if flags.has(Features::RUNTIME_CONFIG) {
            lines.push("const config = useRuntimeConfig();".to_string());
            self.imports.add(&origins.runtime_config, "useRuntimeConfig");
        }
        if flags.has(Features::NEXT_TICK) {
            self.vue.insert("nextTick");
        }

        for namespace in &usage.stores {
            let entry = self.cx.registry.resolve(namespace);
            lines.push(format!("const {} = {}();", entry.instance, entry.composable));
            self.imports.add(&entry.module, &entry.composable);
        }

        lines.join("\n")
    }

    // --- section 1 ---

    /// Preserved top-level statements, with async components wrapped.
    fn preserved_declarations(&mut self) -> String {
        let model = self.cx.model;
        let mut lines = Vec::new();
        let mut declared: BTreeSet<&str> = BTreeSet::new();

        for preserved in &model.preserved {
            match &preserved.async_component {
                Some((name, loader)) => {
                    lines.push(format!(
                        "const {} = defineAsyncComponent({});",
                        name,
                        loader.trim()
                    ));
                    declared.insert(name.as_str());
                    self.vue.insert("defineAsyncComponent");
                }
                None => lines.push(preserved.text.trim().to_string()),
            }
        }

        for component in &model.components {
            let Some(loader) = &component.loader else {
                continue;
            };
            let name = if is_identifier(&component.name) {
                component.name.to_string()
            } else {
                pascalize(&component.name)
            };
            if declared.contains(name.as_str()) {
                continue;
            }
            lines.push(format!(
                "const {} = defineAsyncComponent({});",
                name,
                loader.trim()
            ));
            self.vue.insert("defineAsyncComponent");
        }

        lines.join("\n")
    }

    fn imports(&mut self, body: &str) -> String {
        let model = self.cx.model;
        let options = self.cx.options;
        let origins = &options.modules;

        // Core symbols lead, everything else keeps the order it was added in.
        let mut generated = ImportMap::default();
        for symbol in &self.vue {
            generated.add(&origins.vue, symbol);
        }
        generated.extend(std::mem::take(&mut self.imports));
        for mixin in &model.mixins {
            generated.add(&mixin.module, &mixin.composable);
        }

        let mut lines = generated.render();

        for record in &model.imports {
            if matches!(record.source.as_str(), "vue" | "vuex") {
                continue;
            }
            if model.mixins.iter().any(|m| m.source == record.source) {
                continue;
            }
            if let Some(rule) = options.imports_rewrite.get(&record.source) {
                if let Some(line) = self.rewrite_import(record, rule, body) {
                    lines.push(line);
                }
                continue;
            }

            let unmapped_mixin = record
                .specifiers
                .iter()
                .any(|s| model.unmapped_mixins.contains(&s.local));
            let keep = options.is_kept(&record.source)
                || record.side_effect
                || unmapped_mixin
                || record
                    .specifiers
                    .iter()
                    .any(|s| self.is_referenced(&s.local, body));
            if keep {
                lines.push(with_alias(&record.text, &record.source));
            } else {
                tracing::debug!("dropping unused import from `{}`", record.source);
            }
        }

        let mut additional: Vec<(&String, &String)> = options
            .additional_imports
            .iter()
            .filter(|(name, _)| self.cx.template.uses_component(name))
            .filter_map(|(name, config)| config.import_path.as_ref().map(|path| (name, path)))
            .collect();
        additional.sort();
        for (_, statement) in additional {
            let statement = statement.trim().to_string();
            if !lines.contains(&statement) {
                lines.push(statement);
            }
        }

        lines.join("\n")
    }

    /// A third-party import with its package and exports renamed.
    fn rewrite_import(
        &self,
        record: &ImportRecord,
        rule: &ImportRewrite,
        body: &str,
    ) -> Option<String> {
        let template = self.cx.template;
        let mut default = None;
        let mut namespace = None;
        let mut named: Vec<String> = Vec::new();

        for specifier in &record.specifiers {
            let local = specifier.local.as_str();
            match specifier.binding {
                ImportBinding::Default => {
                    if self.is_referenced(local, body) {
                        default = Some(local);
                    }
                }
                ImportBinding::Namespace => {
                    if self.is_referenced(local, body) {
                        namespace = Some(local);
                    }
                }
                ImportBinding::Named => {
                    let imported = specifier.imported.as_str();
                    if let Some(renamed) = rule.directives.get(imported) {
                        // Directive imports only survive when the markup uses them.
                        if template.uses_directive(local) && !named.contains(renamed) {
                            named.push(renamed.clone());
                        }
                    } else if let Some(renamed) = rule.component_rewrite.get(imported) {
                        if (self.is_referenced(local, body) || template.uses_component(renamed))
                            && !named.contains(renamed)
                        {
                            named.push(renamed.clone());
                        }
                    } else if self.is_referenced(local, body) {
                        named.push(if imported == local {
                            local.to_string()
                        } else {
                            format!("{} as {}", imported, local)
                        });
                    }
                }
            }
        }

        let mut clauses = Vec::new();
        if let Some(default) = default {
            clauses.push(default.to_string());
        }
        if let Some(namespace) = namespace {
            clauses.push(format!("* as {}", namespace));
        } else if !named.is_empty() {
            clauses.push(format!("{{ {} }}", named.join(", ")));
        }
        if clauses.is_empty() {
            return None;
        }

        let source = rule.name.as_deref().unwrap_or(&record.source);
        let source = alias(source).unwrap_or_else(|| source.to_string());
        Some(format!(
            "import {}{} from {};",
            if record.type_only { "type " } else { "" },
            clauses.join(", "),
            quote(&source)
        ))
    }

    fn is_referenced(&self, local: &str, body: &str) -> bool {
        contains_word(body, local) || self.cx.template.references(local)
    }

    fn report_model(&mut self) {
        let model = self.cx.model;
        for option in &model.unsupported_options {
            tracing::debug!("option `{}` is not migrated", option);
            self.diagnostics.push(Diagnostic::new(
                DiagnosticKind::UnsupportedOption,
                format!("option `{}` is not migrated", option),
            ));
        }
        for mixin in &model.unmapped_mixins {
            self.diagnostics.push(Diagnostic::new(
                DiagnosticKind::UnmappedMixin,
                format!("mixin `{}` has no configured composable", mixin),
            ));
        }
    }
}

/// Hooks of one kind folded together, bodies in declaration order.
#[derive(Debug, Default)]
struct MergedHook {
    is_async: bool,
    params: String,
    bodies: Vec<String>,
}

/// Named imports grouped by module, in first-added module order.
#[derive(Debug, Default)]
struct ImportMap {
    modules: Vec<(String, BTreeSet<String>)>,
}

impl ImportMap {
    fn add(&mut self, module: &str, name: &str) {
        match self.modules.iter_mut().find(|(m, _)| m == module) {
            Some((_, names)) => {
                names.insert(name.to_string());
            }
            None => self
                .modules
                .push((module.to_string(), BTreeSet::from([name.to_string()]))),
        }
    }

    fn extend(&mut self, other: ImportMap) {
        for (module, names) in other.modules {
            for name in names {
                self.add(&module, &name);
            }
        }
    }

    fn render(&self) -> Vec<String> {
        self.modules
            .iter()
            .map(|(module, names)| {
                let names: Vec<&str> = names.iter().map(String::as_str).collect();
                format!("import {{ {} }} from {};", names.join(", "), quote(module))
            })
            .collect()
    }
}

fn async_prefix(function: &FunctionText) -> &'static str {
    if function.is_async {
        "async "
    } else {
        ""
    }
}

/// `{ .. }` around a body already indented one level deeper than `indent`.
fn block(body: &str, indent: &str) -> String {
    if body.trim().is_empty() {
        "{}".to_string()
    } else {
        format!("{{\n{}\n{}}}", body, indent)
    }
}

fn function_declaration(name: &str, function: &FunctionText, body: &str) -> String {
    format!(
        "{}function {}({}) {}",
        async_prefix(function),
        name,
        function.params.trim(),
        block(body, "")
    )
}

/// Getter for `computed(..)`; a lone `return` becomes a concise arrow.
fn getter_arrow(body: &str) -> String {
    match single_return(body) {
        Some(expr) if expr.starts_with('{') || has_top_level_comma(expr) => {
            format!("() => ({})", expr)
        }
        Some(expr) => format!("() => {}", expr),
        None => format!("() => {}", block(&reindent(body, INDENT), "")),
    }
}

/// Whether a sequence expression (`a, b`) sits outside every bracket and string.
fn has_top_level_comma(expr: &str) -> bool {
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut chars = expr.chars();
    while let Some(c) = chars.next() {
        if let Some(q) = quote {
            if c == '\\' {
                chars.next();
            } else if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '\'' | '"' | '`' => quote = Some(c),
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => return true,
            _ => {}
        }
    }
    false
}

fn single_return(body: &str) -> Option<&str> {
    let expr = body.trim().strip_prefix("return ")?.trim();
    let expr = expr.strip_suffix(';').unwrap_or(expr).trim();
    (!expr.is_empty() && !expr.contains(['\n', ';']) && !expr.contains("//")).then_some(expr)
}

fn join_bodies(bodies: &[String], indent: &str) -> String {
    bodies
        .iter()
        .map(|body| reindent(body, indent))
        .filter(|body| !body.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Single-quoted string literal.
fn quote(value: &str) -> String {
    format!("'{}'", value.replace('\\', "\\\\").replace('\'', "\\'"))
}

/// `~/x` and `~@/x` become `@/x`.
fn alias(source: &str) -> Option<String> {
    source
        .strip_prefix("~@/")
        .or_else(|| source.strip_prefix("~/"))
        .map(|rest| format!("@/{}", rest))
}

fn with_alias(text: &str, source: &str) -> String {
    let text = text.trim();
    match alias(source) {
        Some(rewritten) => text.replacen(source, &rewritten, 1),
        None => text.to_string(),
    }
}
