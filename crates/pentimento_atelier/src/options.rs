//! Migration options.
//!
//! Deserialized from `pentimento.config.json` with camelCase keys. Every field
//! has a default so a partial (or empty) config file is valid.

use pentimento_carton::FxHashMap;
use pentimento_croquis::{MixinConfig, StoreConfig};
use pentimento_glyph::FormatOptions;
use serde::{Deserialize, Serialize};

/// Options for [`crate::migrate_sfc`]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrateOptions {
    /// Third-party packages to rename, keyed by import path
    #[serde(default)]
    pub imports_rewrite: FxHashMap<String, ImportRewrite>,

    /// Store modules keyed by namespace (`root` for the un-namespaced store)
    #[serde(default)]
    pub stores: FxHashMap<String, StoreConfig>,

    /// Mixin replacements keyed by the mixin file stem
    #[serde(default)]
    pub mixins: FxHashMap<String, MixinConfig>,

    /// Per-component handling, keyed by component name
    #[serde(default)]
    pub additional_imports: FxHashMap<String, AdditionalImport>,

    /// Import sources that are always kept
    #[serde(default)]
    pub import_keeplist: Vec<String>,

    /// Origin modules for generated imports
    #[serde(default)]
    pub modules: ModuleOrigins,

    /// Run the formatter over the generated script (default: true)
    #[serde(default = "default_true")]
    pub format: bool,

    /// Formatter options
    #[serde(default)]
    pub format_options: FormatOptions,
}

impl Default for MigrateOptions {
    fn default() -> Self {
        Self {
            imports_rewrite: FxHashMap::default(),
            stores: FxHashMap::default(),
            mixins: FxHashMap::default(),
            additional_imports: FxHashMap::default(),
            import_keeplist: Vec::new(),
            modules: ModuleOrigins::default(),
            format: true,
            format_options: FormatOptions::default(),
        }
    }
}

impl MigrateOptions {
    /// Whether an import source matches the keeplist.
    ///
    /// A pattern matches exactly, by prefix when it ends with `*`, or as a
    /// substring otherwise.
    pub fn is_kept(&self, source: &str) -> bool {
        self.import_keeplist.iter().any(|pattern| {
            if let Some(prefix) = pattern.strip_suffix('*') {
                source.starts_with(prefix)
            } else {
                source == pattern || source.contains(pattern.as_str())
            }
        })
    }
}

/// Rename rule for one third-party package
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportRewrite {
    /// New package name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Exported component renames: `{ "VBtn": "Button" }`
    #[serde(default)]
    pub component_rewrite: FxHashMap<String, String>,

    /// Directive renames: `{ "Ripple": "vRipple" }`
    #[serde(default)]
    pub directives: FxHashMap<String, String>,
}

/// Extra handling for a component used in the template
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdditionalImport {
    /// Tag to rename the component to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rewrite_to: Option<String>,

    /// Literal import statement emitted when the component is used
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub import_path: Option<String>,
}

/// Modules that generated imports come from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ModuleOrigins {
    pub vue: String,
    pub i18n: String,
    pub head: String,
    pub async_data: String,
    pub event_bus: String,
    pub compat: String,
    pub runtime_config: String,
    pub router: String,
    pub http: String,
}

impl Default for ModuleOrigins {
    fn default() -> Self {
        Self {
            vue: "vue".into(),
            i18n: "vue-i18n".into(),
            head: "@unhead/vue".into(),
            async_data: "#app".into(),
            event_bus: "@/composables/useEventBus".into(),
            compat: "vue".into(),
            runtime_config: "#app".into(),
            router: "vue-router".into(),
            http: "@/composables/useAxios".into(),
        }
    }
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config() {
        let options: MigrateOptions = serde_json::from_str("{}").unwrap();
        assert!(options.format);
        assert_eq!(options.modules, ModuleOrigins::default());
        assert!(options.stores.is_empty());
    }

    #[test]
    fn test_full_config() {
        let options: MigrateOptions = serde_json::from_str(
            r#"{
              "importsRewrite": {
                "vuetify/lib": {
                  "name": "@acme/ui",
                  "componentRewrite": { "VBtn": "AcmeButton" },
                  "directives": { "Ripple": "vRipple" }
                }
              },
              "stores": { "cart": { "module": "@/stores/shop-cart" } },
              "mixins": { "form": { "name": "useForm", "imports": ["errors"] } },
              "additionalImports": { "ClientOnly": { "importPath": "import ClientOnly from '@/components/ClientOnly.vue'" } },
              "importKeeplist": ["@/utils/*"],
              "modules": { "http": "@/composables/useHttp" },
              "format": false
            }"#,
        )
        .unwrap();
        let rewrite = &options.imports_rewrite["vuetify/lib"];
        assert_eq!(rewrite.name.as_deref(), Some("@acme/ui"));
        assert_eq!(rewrite.component_rewrite["VBtn"], "AcmeButton");
        assert_eq!(options.stores["cart"].module.as_deref(), Some("@/stores/shop-cart"));
        assert_eq!(options.mixins["form"].imports, vec!["errors"]);
        assert!(options.additional_imports["ClientOnly"].import_path.is_some());
        assert_eq!(options.modules.http, "@/composables/useHttp");
        assert_eq!(options.modules.vue, "vue");
        assert!(!options.format);
    }

    #[test]
    fn test_keeplist_matching() {
        let options = MigrateOptions {
            import_keeplist: vec!["@/utils/*".into(), "polyfill".into(), "lodash".into()],
            ..Default::default()
        };
        assert!(options.is_kept("@/utils/date"));
        assert!(!options.is_kept("~/utils/date"));
        assert!(options.is_kept("core-js/polyfill"));
        assert!(options.is_kept("lodash"));
        assert!(!options.is_kept("vuex"));
    }
}
