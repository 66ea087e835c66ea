//! Interceptor declarations and the name registry.
//!
//! The registry maps a logical interceptor name to an implementation
//! identifier plus a static configuration payload. It is seeded from the
//! framework's built-in declarations and layered with the application's
//! own; a later registration for the same name replaces the earlier entry
//! entirely.

use daedalus_config::{DaedalusConfig, Declaration, SettingsMap};
use indexmap::IndexMap;

use crate::error::CompileError;

/// An immutable interceptor declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterceptorDescriptor {
    name: String,
    implementation: String,
    static_config: SettingsMap,
}

impl InterceptorDescriptor {
    /// Creates a descriptor.
    pub fn new(
        name: impl Into<String>,
        implementation: impl Into<String>,
        static_config: SettingsMap,
    ) -> Self {
        Self {
            name: name.into(),
            implementation: implementation.into(),
            static_config,
        }
    }

    /// Returns the logical interceptor name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the implementation identifier the factory constructs from.
    #[must_use]
    pub fn implementation(&self) -> &str {
        &self.implementation
    }

    /// Returns the declaration-level configuration payload.
    #[must_use]
    pub const fn static_config(&self) -> &SettingsMap {
        &self.static_config
    }
}

/// Maps logical interceptor names to their descriptors.
///
/// Registration order is preserved so compilation stays deterministic.
#[derive(Debug, Clone, Default)]
pub struct InterceptorRegistry {
    entries: IndexMap<String, InterceptorDescriptor>,
}

impl InterceptorRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a registry from the built-in declarations layered under the
    /// application's.
    ///
    /// An application declaration reusing a built-in name replaces it
    /// entirely.
    #[must_use]
    pub fn from_config(config: &DaedalusConfig) -> Self {
        let mut registry = Self::new();
        for (name, declaration) in daedalus_config::defaults::declarations() {
            registry.register_declaration(&name, &declaration);
        }
        for (name, declaration) in &config.interceptors.declarations {
            registry.register_declaration(name, declaration);
        }
        registry
    }

    /// Registers a descriptor; a later registration for the same name
    /// replaces the prior entry entirely (no merge).
    pub fn register(
        &mut self,
        name: impl Into<String>,
        implementation: impl Into<String>,
        static_config: SettingsMap,
    ) {
        let name = name.into();
        let descriptor = InterceptorDescriptor::new(name.clone(), implementation, static_config);
        self.entries.insert(name, descriptor);
    }

    fn register_declaration(&mut self, name: &str, declaration: &Declaration) {
        let static_config = declaration.config().cloned().unwrap_or_default();
        self.register(name, declaration.implementation_name(), static_config);
    }

    /// Resolves a name to its descriptor.
    ///
    /// # Errors
    ///
    /// Returns [`CompileError::UnknownInterceptor`] if the name was never
    /// registered.
    pub fn resolve(&self, name: &str) -> Result<&InterceptorDescriptor, CompileError> {
        self.entries
            .get(name)
            .ok_or_else(|| CompileError::unknown_interceptor(name))
    }

    /// Returns `true` if the name is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Returns the registered names in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Returns the number of registered declarations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use daedalus_config::DaedalusConfig;

    #[test]
    fn test_register_and_resolve() {
        let mut registry = InterceptorRegistry::new();
        registry.register("auth", "auth", SettingsMap::new());

        let descriptor = registry.resolve("auth").unwrap();
        assert_eq!(descriptor.name(), "auth");
        assert_eq!(descriptor.implementation(), "auth");
    }

    #[test]
    fn test_resolve_unknown_name_fails() {
        let registry = InterceptorRegistry::new();
        let err = registry.resolve("upload").unwrap_err();
        assert!(matches!(
            err,
            CompileError::UnknownInterceptor { name } if name == "upload"
        ));
    }

    #[test]
    fn test_later_registration_replaces_entirely() {
        let mut registry = InterceptorRegistry::new();

        let mut first = SettingsMap::new();
        first.insert("login_uri".to_string(), serde_json::Value::from("/login"));
        registry.register("auth", "auth", first);

        registry.register("auth", "ldap_auth", SettingsMap::new());

        let descriptor = registry.resolve("auth").unwrap();
        assert_eq!(descriptor.implementation(), "ldap_auth");
        assert!(descriptor.static_config().is_empty());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_from_config_seeds_builtins() {
        let registry = InterceptorRegistry::from_config(&DaedalusConfig::default());

        for name in [
            "session",
            "message",
            "error",
            "transaction",
            "auth",
            "model",
            "validation",
            "params",
        ] {
            assert!(registry.contains(name), "missing built-in: {name}");
        }

        let error = registry.resolve("error").unwrap();
        assert_eq!(
            error.static_config().get("view"),
            Some(&serde_json::Value::from("error"))
        );
    }

    #[test]
    fn test_application_declaration_overrides_builtin() {
        let config = DaedalusConfig::builder()
            .declaration("auth", "token_auth")
            .build();

        let registry = InterceptorRegistry::from_config(&config);
        assert_eq!(
            registry.resolve("auth").unwrap().implementation(),
            "token_auth"
        );
    }

    #[test]
    fn test_application_declarations_extend_builtins() {
        let config = DaedalusConfig::builder()
            .declaration("audit", "audit")
            .build();

        let registry = InterceptorRegistry::from_config(&config);
        assert!(registry.contains("audit"));
        assert!(registry.contains("session"));
    }
}
