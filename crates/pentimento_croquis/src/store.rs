//! Store namespaces and the naming rules shared by script and template rewriting.

use pentimento_carton::{decapitalize, pascalize};

/// Namespace used for un-namespaced store access.
pub const ROOT_NAMESPACE: &str = "root";

/// What a store binding maps onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreKind {
    State,
    Getter,
    Action,
    Mutation,
}

impl StoreKind {
    /// Resolve a Vuex bulk mapping helper name.
    pub fn from_helper(name: &str) -> Option<Self> {
        match name {
            "mapState" => Some(Self::State),
            "mapGetters" => Some(Self::Getter),
            "mapActions" => Some(Self::Action),
            "mapMutations" => Some(Self::Mutation),
            _ => None,
        }
    }

    /// State and getters are read like computed properties.
    #[inline]
    pub const fn is_readable(self) -> bool {
        matches!(self, Self::State | Self::Getter)
    }
}

/// Split `'cart/addItem'` into `("cart", "addItem")`.
///
/// Nested modules keep their full prefix (`'user/profile/load'` is
/// `("user/profile", "load")`); a bare name belongs to the root namespace.
pub fn split_store_path(path: &str) -> (&str, &str) {
    match path.rsplit_once('/') {
        Some((namespace, name)) if !namespace.is_empty() => (namespace, name),
        Some((_, name)) => (ROOT_NAMESPACE, name),
        None => (ROOT_NAMESPACE, path),
    }
}

/// Default composable for a namespace: `cart` → `useCartStore`.
pub fn default_store_composable(namespace: &str) -> String {
    format!("use{}Store", pascalize(namespace))
}

/// Default module for a namespace: `cart` → `@/stores/cart`.
pub fn default_store_module(namespace: &str) -> String {
    format!("@/stores/{}", namespace)
}

/// Instance variable bound to a store composable: `useCartStore` → `cartStore`.
pub fn store_instance_name(composable: &str) -> String {
    match composable.strip_prefix("use") {
        Some(rest) if rest.starts_with(|c: char| c.is_ascii_uppercase()) => decapitalize(rest),
        _ => format!("{}Instance", decapitalize(composable)),
    }
}

/// Naming heuristic for mapped getters that must be invoked.
///
/// A getter whose remote name reads like a parameterless accessor method
/// (`getTotal`, `getItems`) is emitted with call syntax. This is a naming
/// convention, not an analysis of the store definition.
pub fn is_accessor_getter(remote: &str) -> bool {
    remote
        .strip_prefix("get")
        .is_some_and(|rest| rest.starts_with(|c: char| c.is_ascii_uppercase()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_store_path() {
        assert_eq!(split_store_path("cart/addItem"), ("cart", "addItem"));
        assert_eq!(split_store_path("user/profile/load"), ("user/profile", "load"));
        assert_eq!(split_store_path("setLocale"), (ROOT_NAMESPACE, "setLocale"));
        assert_eq!(split_store_path("/odd"), (ROOT_NAMESPACE, "odd"));
    }

    #[test]
    fn test_store_naming() {
        assert_eq!(default_store_composable("cart"), "useCartStore");
        assert_eq!(default_store_composable("user/profile"), "useUserProfileStore");
        assert_eq!(default_store_module("cart"), "@/stores/cart");
        assert_eq!(store_instance_name("useCartStore"), "cartStore");
        assert_eq!(store_instance_name("user"), "userInstance");
    }

    #[test]
    fn test_accessor_getter_heuristic() {
        assert!(is_accessor_getter("getTotal"));
        assert!(!is_accessor_getter("getter"));
        assert!(!is_accessor_getter("total"));
        assert!(!is_accessor_getter("isAdmin"));
    }
}
