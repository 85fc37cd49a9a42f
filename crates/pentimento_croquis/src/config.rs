//! Configuration entries the extractor and naming rules consult.

use serde::{Deserialize, Serialize};

/// A mixin that has a composable replacement.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MixinConfig {
    /// Composable replacing the mixin (e.g. `useForm`)
    pub name: String,

    /// Symbols the composable returns
    #[serde(default)]
    pub imports: Vec<String>,

    /// Module the composable is imported from (default: `@/composables/<name>`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl MixinConfig {
    /// Import source of the composable.
    pub fn module(&self) -> String {
        match &self.path {
            Some(path) => path.clone(),
            None => format!("@/composables/{}", self.name),
        }
    }
}

/// Target store for one namespace.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreConfig {
    /// Module exporting the store composable (default: `@/stores/<namespace>`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module: Option<String>,

    /// Store composable name (default: `use<Namespace>Store`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub composable: Option<String>,
}
