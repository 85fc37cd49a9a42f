//! Configuration file loading for pentimento.
//!
//! Reads `pentimento.config.json` from the current working directory, or from
//! an explicit `--config` path. Also provides the JSON Schema for editor
//! autocompletion.

use pentimento_atelier::MigrateOptions;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = "pentimento.config.json";

/// Top-level pentimento configuration.
#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PentimentoConfig {
    /// JSON Schema reference (for editor autocompletion).
    #[serde(rename = "$schema", default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,

    /// Migration options, flattened into the top level.
    #[serde(flatten)]
    pub migrate: MigrateOptions,
}

fn config_path(explicit: Option<&Path>) -> PathBuf {
    match explicit {
        Some(path) => path.to_path_buf(),
        None => std::env::current_dir()
            .unwrap_or_default()
            .join(CONFIG_FILE),
    }
}

/// Load the config, falling back to defaults when it is missing or malformed.
pub fn load_config(explicit: Option<&Path>) -> PentimentoConfig {
    let config_path = config_path(explicit);

    if !config_path.exists() {
        if explicit.is_some() {
            eprintln!(
                "\x1b[33mWarning:\x1b[0m {} does not exist, using defaults",
                config_path.display()
            );
        }
        return PentimentoConfig::default();
    }

    match std::fs::read_to_string(&config_path) {
        Ok(content) => parse_config(&content).unwrap_or_else(|e| {
            eprintln!(
                "\x1b[33mWarning:\x1b[0m Failed to parse {}: {}",
                config_path.display(),
                e
            );
            PentimentoConfig::default()
        }),
        Err(e) => {
            eprintln!(
                "\x1b[33mWarning:\x1b[0m Failed to read {}: {}",
                config_path.display(),
                e
            );
            PentimentoConfig::default()
        }
    }
}

#[inline]
pub fn parse_config(content: &str) -> Result<PentimentoConfig, serde_json::Error> {
    serde_json::from_str(content)
}

/// Starter config written by `pentimento init`.
pub const STARTER_CONFIG: &str = r#"{
  "$schema": "./node_modules/.pentimento/pentimento.config.schema.json",
  "stores": {
    "root": { "module": "@/stores/root", "composable": "useRootStore" }
  },
  "mixins": {},
  "importsRewrite": {},
  "additionalImports": {},
  "importKeeplist": [],
  "format": true
}
"#;

/// JSON Schema for `pentimento.config.json`.
pub const PENTIMENTO_CONFIG_SCHEMA: &str = r##"{
  "$schema": "http://json-schema.org/draft-07/schema#",
  "title": "Pentimento Configuration",
  "description": "Configuration file for pentimento - Vue Options API to <script setup> migration",
  "type": "object",
  "definitions": {
    "stringMap": {
      "type": "object",
      "additionalProperties": { "type": "string" }
    }
  },
  "properties": {
    "$schema": {
      "type": "string",
      "description": "JSON Schema reference for editor autocompletion"
    },
    "importsRewrite": {
      "type": "object",
      "description": "Third-party packages to rename, keyed by import path",
      "additionalProperties": {
        "type": "object",
        "properties": {
          "name": { "type": "string", "description": "New package name" },
          "componentRewrite": { "$ref": "#/definitions/stringMap", "description": "Exported component renames" },
          "directives": { "$ref": "#/definitions/stringMap", "description": "Directive renames" }
        },
        "additionalProperties": false
      }
    },
    "stores": {
      "type": "object",
      "description": "Store modules keyed by namespace. Use \"root\" for the un-namespaced store.",
      "additionalProperties": {
        "type": "object",
        "properties": {
          "module": { "type": "string", "description": "Module the store composable is imported from" },
          "composable": { "type": "string", "description": "Store composable name, e.g. useCartStore" }
        },
        "additionalProperties": false
      }
    },
    "mixins": {
      "type": "object",
      "description": "Mixin replacements keyed by the mixin file stem",
      "additionalProperties": {
        "type": "object",
        "required": ["name"],
        "properties": {
          "name": { "type": "string", "description": "Composable that replaces the mixin" },
          "imports": { "type": "array", "items": { "type": "string" }, "description": "Symbols the composable returns" },
          "path": { "type": "string", "description": "Module of the composable (default: @/composables/<name>)" }
        },
        "additionalProperties": false
      }
    },
    "additionalImports": {
      "type": "object",
      "description": "Per-component handling, keyed by component name",
      "additionalProperties": {
        "type": "object",
        "properties": {
          "rewriteTo": { "type": "string", "description": "Tag to rename the component to" },
          "importPath": { "type": "string", "description": "Import statement emitted when the component is used" }
        },
        "additionalProperties": false
      }
    },
    "importKeeplist": {
      "type": "array",
      "description": "Import sources that are always kept. A trailing * matches by prefix.",
      "items": { "type": "string" }
    },
    "modules": {
      "type": "object",
      "description": "Origin modules for generated imports",
      "properties": {
        "vue": { "type": "string", "default": "vue" },
        "i18n": { "type": "string", "default": "vue-i18n" },
        "head": { "type": "string", "default": "@unhead/vue" },
        "asyncData": { "type": "string", "default": "#app" },
        "eventBus": { "type": "string", "default": "@/composables/useEventBus" },
        "compat": { "type": "string", "default": "vue" },
        "runtimeConfig": { "type": "string", "default": "#app" },
        "router": { "type": "string", "default": "vue-router" },
        "http": { "type": "string", "default": "@/composables/useAxios" }
      },
      "additionalProperties": false
    },
    "format": {
      "type": "boolean",
      "description": "Format the generated script",
      "default": true
    },
    "formatOptions": {
      "type": "object",
      "description": "Formatter options",
      "properties": {
        "tabWidth": { "type": "integer", "default": 2 },
        "useTabs": { "type": "boolean", "default": false },
        "semi": { "type": "boolean", "default": true },
        "singleQuote": { "type": "boolean", "default": true },
        "bracketSpacing": { "type": "boolean", "default": true },
        "endOfLine": { "enum": ["lf", "crlf"], "default": "lf" }
      },
      "additionalProperties": false
    }
  },
  "additionalProperties": false
}"##;

/// Write the JSON Schema to `node_modules/.pentimento/pentimento.config.schema.json`.
pub fn write_schema(dir: &Path) -> std::io::Result<PathBuf> {
    let schema_dir = dir.join("node_modules/.pentimento");
    std::fs::create_dir_all(&schema_dir)?;
    let schema_path = schema_dir.join("pentimento.config.schema.json");
    std::fs::write(&schema_path, PENTIMENTO_CONFIG_SCHEMA)?;
    Ok(schema_path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flattened_config() {
        let config = parse_config(
            r#"{
              "$schema": "./schema.json",
              "stores": { "cart": { "composable": "useShopStore" } },
              "format": false
            }"#,
        )
        .unwrap();
        assert_eq!(config.schema.as_deref(), Some("./schema.json"));
        assert_eq!(
            config.migrate.stores["cart"].composable.as_deref(),
            Some("useShopStore")
        );
        assert!(!config.migrate.format);
    }

    #[test]
    fn test_starter_config_parses() {
        let config = parse_config(STARTER_CONFIG).unwrap();
        assert!(config.migrate.format);
        assert!(config.migrate.stores.contains_key("root"));
    }

    #[test]
    fn test_schema_is_json() {
        let schema: serde_json::Value = serde_json::from_str(PENTIMENTO_CONFIG_SCHEMA).unwrap();
        assert_eq!(schema["title"], "Pentimento Configuration");
    }
}
