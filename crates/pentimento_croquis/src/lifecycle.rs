//! Options API lifecycle hooks and their Composition API registrations.

use phf::phf_map;

/// Lifecycle phase, after merging Vue 2 names into their Vue 3 equivalents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum LifecycleKind {
    BeforeCreate = 0,
    Created = 1,
    BeforeMount = 2,
    Mounted = 3,
    BeforeUpdate = 4,
    Updated = 5,
    Activated = 6,
    Deactivated = 7,
    BeforeUnmount = 8,
    Unmounted = 9,
    ErrorCaptured = 10,
    ServerPrefetch = 11,
}

static LIFECYCLE_OPTIONS: phf::Map<&'static str, LifecycleKind> = phf_map! {
    "beforeCreate" => LifecycleKind::BeforeCreate,
    "created" => LifecycleKind::Created,
    "beforeMount" => LifecycleKind::BeforeMount,
    "mounted" => LifecycleKind::Mounted,
    "beforeUpdate" => LifecycleKind::BeforeUpdate,
    "updated" => LifecycleKind::Updated,
    "activated" => LifecycleKind::Activated,
    "deactivated" => LifecycleKind::Deactivated,
    "beforeDestroy" => LifecycleKind::BeforeUnmount,
    "beforeUnmount" => LifecycleKind::BeforeUnmount,
    "destroyed" => LifecycleKind::Unmounted,
    "unmounted" => LifecycleKind::Unmounted,
    "errorCaptured" => LifecycleKind::ErrorCaptured,
    "serverPrefetch" => LifecycleKind::ServerPrefetch,
};

impl LifecycleKind {
    /// Resolve an Options API key.
    #[inline]
    pub fn from_option(name: &str) -> Option<Self> {
        LIFECYCLE_OPTIONS.get(name).copied()
    }

    /// Check whether an Options API key names a lifecycle hook.
    #[inline]
    pub fn is_lifecycle_option(name: &str) -> bool {
        LIFECYCLE_OPTIONS.contains_key(name)
    }

    /// Registration function, or `None` when the hook body runs inline in setup.
    pub const fn registration(self) -> Option<&'static str> {
        match self {
            Self::BeforeCreate | Self::Created => None,
            Self::BeforeMount => Some("onBeforeMount"),
            Self::Mounted => Some("onMounted"),
            Self::BeforeUpdate => Some("onBeforeUpdate"),
            Self::Updated => Some("onUpdated"),
            Self::Activated => Some("onActivated"),
            Self::Deactivated => Some("onDeactivated"),
            Self::BeforeUnmount => Some("onBeforeUnmount"),
            Self::Unmounted => Some("onUnmounted"),
            Self::ErrorCaptured => Some("onErrorCaptured"),
            Self::ServerPrefetch => Some("onServerPrefetch"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vue2_names_merge() {
        assert_eq!(
            LifecycleKind::from_option("beforeDestroy"),
            LifecycleKind::from_option("beforeUnmount")
        );
        assert_eq!(
            LifecycleKind::from_option("destroyed"),
            Some(LifecycleKind::Unmounted)
        );
    }

    #[test]
    fn test_registration() {
        assert_eq!(LifecycleKind::Mounted.registration(), Some("onMounted"));
        assert_eq!(LifecycleKind::Created.registration(), None);
        assert_eq!(LifecycleKind::BeforeCreate.registration(), None);
        assert!(!LifecycleKind::is_lifecycle_option("fetch"));
    }
}
