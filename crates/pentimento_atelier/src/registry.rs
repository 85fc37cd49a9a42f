//! Store registry snapshot.
//!
//! Built once per file from the configured stores plus every namespace the
//! script and template were found to use. Discovered namespaces get derived
//! names; configured entries are never overridden.

use std::collections::BTreeMap;

use pentimento_carton::{CompactString, FxHashMap};
use pentimento_croquis::{
    default_store_composable, default_store_module, store_instance_name, StoreConfig,
};

/// Resolved target of one store namespace
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreEntry {
    /// Module the composable is imported from
    pub module: String,
    /// Store composable, e.g. `useCartStore`
    pub composable: String,
    /// Local instance, e.g. `cartStore`
    pub instance: String,
}

#[derive(Debug, Clone, Default)]
pub struct StoreRegistry {
    entries: BTreeMap<CompactString, StoreEntry>,
}

impl StoreRegistry {
    /// Merge discovered namespaces into the configured stores.
    pub fn snapshot<'d>(
        configured: &FxHashMap<String, StoreConfig>,
        discovered: impl IntoIterator<Item = &'d str>,
    ) -> Self {
        let mut entries = BTreeMap::new();
        for (namespace, config) in configured {
            entries.insert(CompactString::new(namespace), entry(namespace, Some(config)));
        }
        for namespace in discovered {
            if !entries.contains_key(namespace) {
                tracing::debug!("registering discovered store namespace `{}`", namespace);
                entries.insert(CompactString::new(namespace), entry(namespace, None));
            }
        }
        Self { entries }
    }

    #[inline]
    pub fn get(&self, namespace: &str) -> Option<&StoreEntry> {
        self.entries.get(namespace)
    }

    #[inline]
    pub fn contains(&self, namespace: &str) -> bool {
        self.entries.contains_key(namespace)
    }

    /// Entry for a namespace, deriving names when it was never registered.
    pub fn resolve(&self, namespace: &str) -> StoreEntry {
        self.get(namespace)
            .cloned()
            .unwrap_or_else(|| entry(namespace, None))
    }
}

fn entry(namespace: &str, config: Option<&StoreConfig>) -> StoreEntry {
    let composable = config
        .and_then(|c| c.composable.clone())
        .unwrap_or_else(|| default_store_composable(namespace));
    let module = config
        .and_then(|c| c.module.clone())
        .unwrap_or_else(|| default_store_module(namespace));
    StoreEntry {
        instance: store_instance_name(&composable),
        module,
        composable,
    }
}
