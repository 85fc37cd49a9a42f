//! OXC-based extraction of the Component Model.
//!
//! The script is parsed once. Top-level imports and declarations are recorded as
//! written; the default-exported options object is matched key by key against the
//! Options API idioms in [`options`], bulk store helpers are expanded in
//! [`store_map`], and the refs, events and store namespaces reached through
//! `this.$*` are collected by the visitor in [`this_access`].
//!
//! Extraction follows document order: when an option repeats a name, the later
//! declaration replaces the earlier one in place.
//!
//! ## Module Structure
//!
//! - [`imports`] - Import and top-level statement records
//! - [`options`] - Options object walker
//! - [`store_map`] - `mapState`/`mapGetters`/`mapActions`/`mapMutations`
//! - [`this_access`] - `this.$refs`/`this.$emit`/`this.$store` visitor

mod imports;
mod options;
mod store_map;
mod this_access;

use oxc_allocator::Allocator;
use oxc_ast::ast::{Argument, ExportDefaultDeclarationKind, ObjectExpression, Statement};
use oxc_ast_visit::Visit;
use oxc_parser::Parser;
use oxc_span::SourceType;
use pentimento_carton::FxHashMap;
use thiserror::Error;

use crate::config::MixinConfig;
use crate::model::ComponentModel;

/// Errors raised while extracting a component.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// The script block could not be parsed at all.
    #[error("Failed to parse script: {0}")]
    ScriptParse(String),
}

/// Source type for a `<script lang="..">` value.
pub fn source_type_for_lang(lang: Option<&str>) -> SourceType {
    let extension = match lang {
        Some("ts") => "ts",
        Some("tsx") => "tsx",
        Some("jsx") => "jsx",
        _ => "mjs",
    };
    SourceType::from_path(format!("component.{}", extension)).unwrap_or_else(|_| SourceType::mjs())
}

/// Build the Component Model of an Options API script.
///
/// Missing options simply leave their fields empty; a script without an
/// options object yields a model with `has_default_export == false`.
pub fn extract_component(
    source: &str,
    source_type: SourceType,
    mixins: &FxHashMap<String, MixinConfig>,
) -> Result<ComponentModel, ExtractError> {
    let allocator = Allocator::default();
    let ret = Parser::new(&allocator, source, source_type).parse();

    if ret.panicked || !ret.errors.is_empty() {
        let messages: Vec<String> = ret.errors.iter().map(|e| e.to_string()).collect();
        return Err(ExtractError::ScriptParse(messages.join("; ")));
    }

    let mut model = ComponentModel::default();

    // Imports first so `mixins: [..]` can resolve its sources wherever it appears.
    for stmt in ret.program.body.iter() {
        if let Statement::ImportDeclaration(decl) = stmt {
            model.imports.push(imports::record_import(decl, source));
        }
    }

    for stmt in ret.program.body.iter() {
        match stmt {
            Statement::ImportDeclaration(_) => {}
            Statement::ExportDefaultDeclaration(export) => {
                match component_object(&export.declaration) {
                    Some(object) => {
                        model.has_default_export = true;
                        options::OptionsWalker::new(source, &mut model, mixins).walk(object);
                        this_access::ThisAccessCollector::new(&mut model)
                            .visit_object_expression(object);
                    }
                    None => tracing::debug!("default export is not an options object"),
                }
            }
            other => {
                if let Some(preserved) = imports::preserve_statement(other, source) {
                    model.preserved.push(preserved);
                }
            }
        }
    }

    options::finish(&mut model);
    Ok(model)
}

/// `export default { .. }`, `defineComponent({ .. })` or `Vue.extend({ .. })`.
fn component_object<'b, 'a>(
    kind: &'b ExportDefaultDeclarationKind<'a>,
) -> Option<&'b ObjectExpression<'a>> {
    match kind {
        ExportDefaultDeclarationKind::ObjectExpression(object) => Some(&**object),
        ExportDefaultDeclarationKind::CallExpression(call) => match call.arguments.first() {
            Some(Argument::ObjectExpression(object)) => Some(&**object),
            _ => None,
        },
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ComputedKind, HeadBlock, MethodForm, WatcherForm};
    use crate::store::StoreKind;
    use crate::LifecycleKind;

    fn extract(source: &str) -> ComponentModel {
        extract_component(source, SourceType::mjs(), &FxHashMap::default()).unwrap()
    }

    #[test]
    fn test_extract_data() {
        let model = extract(
            r#"
export default {
  data() {
    return { count: 0, items: [], label: 'x' }
  }
}
"#,
        );
        assert!(model.has_default_export);
        let names: Vec<_> = model.data.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["count", "items", "label"]);
        assert_eq!(model.data[0].init, "0");
        assert_eq!(model.data[2].init, "'x'");
    }

    #[test]
    fn test_extract_data_arrow_and_prelude() {
        let model = extract(
            r#"
export default {
  data: () => ({ open: false }),
}
"#,
        );
        assert_eq!(model.data.len(), 1);
        assert_eq!(model.data[0].init, "false");
        assert!(model.data_prelude.is_none());

        let model = extract(
            r#"
export default {
  data() {
    const base = 10
    return { limit: base }
  }
}
"#,
        );
        assert_eq!(model.data_prelude.as_deref(), Some("const base = 10"));
        assert_eq!(model.data[0].init, "base");
    }

    #[test]
    fn test_extract_computed_forms() {
        let model = extract(
            r#"
export default {
  computed: {
    double() { return this.count * 2 },
    fullName: {
      get() { return this.first + ' ' + this.last },
      set(value) { this.first = value }
    },
    triple: vm => vm.count * 3
  }
}
"#,
        );
        assert_eq!(model.computed.len(), 3);
        assert!(matches!(model.computed[0].kind, ComputedKind::Plain(_)));
        match &model.computed[1].kind {
            ComputedKind::GetSet { get, set } => {
                assert_eq!(get.body.trim(), "return this.first + ' ' + this.last");
                let set = set.as_ref().unwrap();
                assert_eq!(set.params, "value");
            }
            other => panic!("expected get/set, got {:?}", other),
        }
        match &model.computed[2].kind {
            ComputedKind::Plain(function) => {
                assert_eq!(function.params, "vm");
                assert_eq!(function.body, "return vm.count * 3;");
            }
            other => panic!("expected plain, got {:?}", other),
        }
    }

    #[test]
    fn test_extract_methods() {
        let model = extract(
            r#"
export default {
  methods: {
    async save(payload, { silent } = {}) { await this.$axios.post('/x', payload) },
    reset: function () { this.count = 0 },
    onScroll: debounce(function () { this.load() }, 200),
  }
}
"#,
        );
        assert_eq!(model.methods.len(), 3);
        let save = model.method("save").unwrap();
        assert!(save.function.is_async);
        assert_eq!(save.function.params, "payload, { silent } = {}");
        assert_eq!(model.method("reset").unwrap().form, MethodForm::Function);
        let on_scroll = model.method("onScroll").unwrap();
        assert_eq!(on_scroll.form, MethodForm::Expression);
        assert!(on_scroll.function.body.starts_with("debounce("));
    }

    #[test]
    fn test_method_names_claimed_elsewhere_are_dropped() {
        let model = extract(
            r#"
export default {
  computed: { total() { return 1 } },
  watch: { query() {} },
  methods: {
    total() { return 2 },
    query() {},
    mounted() {},
    keep() {}
  }
}
"#,
        );
        let names: Vec<_> = model.methods.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["keep"]);
    }

    #[test]
    fn test_last_declaration_wins() {
        let model = extract(
            r#"
export default {
  methods: {
    load() { return 1 },
    other() {},
    load() { return 2 }
  }
}
"#,
        );
        assert_eq!(model.methods.len(), 2);
        assert_eq!(model.methods[0].name, "load");
        assert_eq!(model.methods[0].function.body.trim(), "return 2");
    }

    #[test]
    fn test_extract_watchers() {
        let model = extract(
            r#"
export default {
  watch: {
    count(value, old) { this.log(value) },
    'user.name': async function (name) { await this.sync(name) },
    deepOne: { handler() {}, deep: true },
    named: 'reload'
  }
}
"#,
        );
        assert_eq!(model.watchers.len(), 4);
        assert_eq!(model.watchers[1].target, "user.name");
        match &model.watchers[1].form {
            WatcherForm::Function(function) => assert!(function.is_async),
            other => panic!("expected function form, got {:?}", other),
        }
        assert!(matches!(model.watchers[2].form, WatcherForm::Unsupported(_)));
        assert_eq!(
            model.watchers[3].form,
            WatcherForm::Unsupported("'reload'".to_string())
        );
    }

    #[test]
    fn test_extract_lifecycle_hooks() {
        let model = extract(
            r#"
export default {
  created() { this.init() },
  beforeDestroy() { this.stop() },
  async mounted() { await this.load() }
}
"#,
        );
        let kinds: Vec<_> = model.hooks.iter().map(|h| h.kind).collect();
        assert_eq!(
            kinds,
            vec![
                LifecycleKind::Created,
                LifecycleKind::BeforeUnmount,
                LifecycleKind::Mounted
            ]
        );
        assert_eq!(model.hooks[1].option, "beforeDestroy");
        assert!(model.hooks[2].function.is_async);
    }

    #[test]
    fn test_extract_props_and_emits() {
        let model = extract(
            r#"
export default {
  name: 'UserCard',
  props: { user: { type: Object, required: true }, compact: Boolean },
  emits: ['input', 'close'],
  methods: {
    pick() { this.$emit('select', this.user) }
  }
}
"#,
        );
        assert_eq!(model.name.as_deref(), Some("UserCard"));
        let props = model.props.as_ref().unwrap();
        assert!(props.raw.starts_with("{ user:"));
        assert!(model.is_prop("compact"));
        assert_eq!(model.emits, vec!["update:value", "close", "select"]);

        let model = extract("export default { props: ['value', 'label'] }");
        assert!(model.is_prop("value"));
        assert!(model.is_prop("label"));
    }

    #[test]
    fn test_extract_async_data_and_head() {
        let model = extract(
            r#"
export default {
  async asyncData({ $axios, params }) {
    const page = await $axios.$get(`/pages/${params.slug}`)
    if (!page) {
      return { title: '', links: [] }
    }
    return { title: page.title, links: page.links }
  },
  head() {
    return { title: this.title }
  }
}
"#,
        );
        let block = model.async_data.as_ref().unwrap();
        assert_eq!(block.function.params, "{ $axios, params }");
        assert_eq!(block.returned, vec!["title", "links"]);
        assert!(model.is_async_data_key("links"));
        assert_eq!(
            model.head,
            Some(HeadBlock::SimpleReturn("{ title: this.title }".to_string()))
        );
    }

    #[test]
    fn test_complex_head() {
        let model = extract(
            r#"
export default {
  head() {
    const title = this.title || 'Home'
    return { title }
  }
}
"#,
        );
        assert!(matches!(model.head, Some(HeadBlock::Complex(_))));
    }

    #[test]
    fn test_extract_store_bindings() {
        let model = extract(
            r#"
import { mapState, mapGetters, mapActions } from 'vuex'
export default {
  computed: {
    ...mapState('cart', ['items']),
    ...mapGetters({ total: 'cart/total', isAdmin: 'user/isAdmin' }),
  },
  methods: {
    ...mapActions('cart', { add: 'addItem' }),
    ...mapActions(['user/logout']),
  }
}
"#,
        );
        let bindings: Vec<_> = model
            .store_bindings
            .iter()
            .map(|b| (b.namespace.as_str(), b.kind, b.local.as_str(), b.remote.as_str()))
            .collect();
        assert_eq!(
            bindings,
            vec![
                ("cart", StoreKind::State, "items", "items"),
                ("cart", StoreKind::Getter, "total", "total"),
                ("user", StoreKind::Getter, "isAdmin", "isAdmin"),
                ("cart", StoreKind::Action, "add", "addItem"),
                ("user", StoreKind::Action, "logout", "logout"),
            ]
        );
        assert!(model.store_namespaces.contains("cart"));
        assert!(model.store_namespaces.contains("user"));
    }

    #[test]
    fn test_extract_this_accessors() {
        let model = extract(
            r#"
export default {
  methods: {
    run() {
      this.$refs.form.validate()
      this.$refs['list'].scrollTop = 0
      this.$t('hello')
      this.$tc('items', 2)
      this.$i18n.locale = 'en'
      this.$router.push('/')
      this.$nuxt.$emit('refresh')
      this.$root.$el.focus()
      this.$store.dispatch('cart/checkout')
      this.$store.commit('setReady')
      this.$store.getters['user/name']
      this.$store.state.settings.theme
      this.$nextTick(() => {})
      this.$config.apiBase
      this.$slots.default
    }
  }
}
"#,
        );
        let refs: Vec<_> = model.refs.referenced.iter().map(|r| r.as_str()).collect();
        assert_eq!(refs, vec!["form", "list"]);
        let namespaces: Vec<_> = model.store_namespaces.iter().map(|n| n.as_str()).collect();
        assert_eq!(namespaces, vec!["cart", "root", "user"]);
    }

    #[test]
    fn test_extract_mixins() {
        let mut mixins = FxHashMap::default();
        mixins.insert(
            "form".to_string(),
            MixinConfig {
                name: "useForm".into(),
                imports: vec!["validate".into(), "errors".into()],
                path: None,
            },
        );
        let source = r#"
import formMixin from '@/mixins/form'
import trackMixin from '@/mixins/track.js'
export default {
  mixins: [formMixin, trackMixin],
}
"#;
        let model = extract_component(source, SourceType::mjs(), &mixins).unwrap();
        assert_eq!(model.mixins.len(), 1);
        assert_eq!(model.mixins[0].composable, "useForm");
        assert_eq!(model.mixins[0].module, "@/composables/useForm");
        assert!(model.mixin_providing("errors").is_some());
        assert_eq!(model.unmapped_mixins, vec!["trackMixin"]);
    }

    #[test]
    fn test_imports_and_preserved_statements() {
        let model = extract(
            r#"
import Vue from 'vue'
import 'some-polyfill'
import { debounce as delay } from 'lodash'
const LIMIT = 20
const LazyChart = () => import('~/components/Chart.vue')
export default defineComponent({ data() { return { limit: LIMIT } } })
"#,
        );
        assert_eq!(model.imports.len(), 3);
        assert!(model.imports[1].side_effect);
        assert_eq!(model.imports[2].specifiers[0].imported, "debounce");
        assert_eq!(model.imports[2].specifiers[0].local, "delay");
        assert_eq!(model.preserved.len(), 2);
        assert_eq!(model.preserved[0].text, "const LIMIT = 20");
        let (name, loader) = model.preserved[1].async_component.as_ref().unwrap();
        assert_eq!(name, "LazyChart");
        assert_eq!(loader, "() => import('~/components/Chart.vue')");
        assert!(model.has_default_export);
    }

    #[test]
    fn test_components_and_extras() {
        let model = extract(
            r#"
export default {
  components: { UserCard, Chart: () => import('./Chart.vue') },
  fetch() { return this.load() },
  nuxtI18n: { paths: { en: '/about' } },
  layout: 'wide'
}
"#,
        );
        assert_eq!(model.components.len(), 2);
        assert!(model.components[0].loader.is_none());
        assert_eq!(
            model.components[1].loader.as_deref(),
            Some("() => import('./Chart.vue')")
        );
        assert!(model.fetch.is_some());
        assert_eq!(
            model.nuxt_i18n.as_deref(),
            Some("{ paths: { en: '/about' } }")
        );
        assert_eq!(model.unsupported_options, vec!["layout"]);
    }

    #[test]
    fn test_no_default_export() {
        let model = extract("export const x = 1");
        assert!(!model.has_default_export);
    }

    #[test]
    fn test_parse_error() {
        let result =
            extract_component("export default {", SourceType::mjs(), &FxHashMap::default());
        assert!(matches!(result, Err(ExtractError::ScriptParse(_))));
    }

    #[test]
    fn test_source_type_for_lang() {
        assert!(source_type_for_lang(Some("ts")).is_typescript());
        assert!(!source_type_for_lang(None).is_typescript());
    }
}
