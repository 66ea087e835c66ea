//! Interceptor construction.
//!
//! The factory maps an implementation identifier to a constructor that
//! deserializes the interceptor's merged settings into its statically
//! typed settings struct and builds the instance. There is no dynamic
//! property injection: a settings key the struct does not declare fails
//! compilation with [`CompileError::InvalidSettings`].

use std::sync::Arc;

use daedalus_config::{Mode, SettingsMap};
use daedalus_core::Validator;
use indexmap::IndexMap;

use crate::chain::Interceptor;
use crate::error::CompileError;
use crate::interceptors;

/// Collaborators available to interceptor constructors.
#[derive(Clone)]
pub struct FactoryContext {
    mode: Mode,
    validator: Option<Arc<dyn Validator>>,
}

impl FactoryContext {
    /// Creates a factory context for the given environment mode.
    #[must_use]
    pub fn new(mode: Mode) -> Self {
        Self {
            mode,
            validator: None,
        }
    }

    /// Attaches the validator collaborator consulted by the validation
    /// interceptor.
    #[must_use]
    pub fn with_validator(mut self, validator: Arc<dyn Validator>) -> Self {
        self.validator = Some(validator);
        self
    }

    /// Returns the environment mode.
    #[must_use]
    pub const fn mode(&self) -> Mode {
        self.mode
    }

    /// Returns the validator collaborator, if one was attached.
    #[must_use]
    pub fn validator(&self) -> Option<&Arc<dyn Validator>> {
        self.validator.as_ref()
    }
}

impl Default for FactoryContext {
    fn default() -> Self {
        Self::new(Mode::default())
    }
}

impl std::fmt::Debug for FactoryContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FactoryContext")
            .field("mode", &self.mode)
            .field("has_validator", &self.validator.is_some())
            .finish()
    }
}

/// Constructor for one interceptor implementation.
///
/// Receives the merged settings as a JSON object and fails on any value
/// the implementation's settings struct rejects.
pub type ConstructorFn =
    fn(&FactoryContext, serde_json::Value) -> Result<Arc<dyn Interceptor>, serde_json::Error>;

/// Maps implementation identifiers to constructors.
#[derive(Clone)]
pub struct InterceptorFactory {
    constructors: IndexMap<String, ConstructorFn>,
}

impl InterceptorFactory {
    /// Creates a factory with no constructors registered.
    #[must_use]
    pub fn new() -> Self {
        Self {
            constructors: IndexMap::new(),
        }
    }

    /// Creates a factory with the built-in implementations registered.
    #[must_use]
    pub fn with_builtins() -> Self {
        let mut factory = Self::new();
        factory.register("session", interceptors::session::construct);
        factory.register("message", interceptors::message::construct);
        factory.register("error", interceptors::error_boundary::construct);
        factory.register("transaction", interceptors::transaction::construct);
        factory.register("auth", interceptors::auth::construct);
        factory.register("model", interceptors::model::construct);
        factory.register("validation", interceptors::validation::construct);
        factory.register("params", interceptors::params::construct);
        factory
    }

    /// Registers a constructor; a later registration for the same
    /// implementation identifier replaces the prior one.
    pub fn register(&mut self, implementation: impl Into<String>, constructor: ConstructorFn) {
        self.constructors.insert(implementation.into(), constructor);
    }

    /// Returns `true` if the implementation identifier has a constructor.
    #[must_use]
    pub fn contains(&self, implementation: &str) -> bool {
        self.constructors.contains_key(implementation)
    }

    /// Constructs the interceptor declared as `name` from its merged
    /// settings.
    ///
    /// # Errors
    ///
    /// Returns [`CompileError::UnknownImplementation`] when no constructor
    /// is registered and [`CompileError::InvalidSettings`] when the
    /// settings do not deserialize.
    pub fn construct(
        &self,
        context: &FactoryContext,
        name: &str,
        implementation: &str,
        settings: &SettingsMap,
    ) -> Result<Arc<dyn Interceptor>, CompileError> {
        let constructor = self
            .constructors
            .get(implementation)
            .ok_or_else(|| CompileError::unknown_implementation(name, implementation))?;

        let value = serde_json::Value::Object(
            settings
                .iter()
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect(),
        );
        constructor(context, value).map_err(|source| CompileError::invalid_settings(name, source))
    }
}

impl Default for InterceptorFactory {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl std::fmt::Debug for InterceptorFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InterceptorFactory")
            .field(
                "implementations",
                &self.constructors.keys().collect::<Vec<_>>(),
            )
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context() -> FactoryContext {
        FactoryContext::new(Mode::Test)
    }

    #[test]
    fn test_builtins_are_registered() {
        let factory = InterceptorFactory::with_builtins();
        for implementation in [
            "session",
            "message",
            "error",
            "transaction",
            "auth",
            "model",
            "validation",
            "params",
        ] {
            assert!(
                factory.contains(implementation),
                "missing constructor: {implementation}"
            );
        }
    }

    #[test]
    fn test_construct_with_empty_settings() {
        let factory = InterceptorFactory::with_builtins();
        let settings = SettingsMap::new();
        assert!(factory
            .construct(&context(), "session", "session", &settings)
            .is_ok());
    }

    #[test]
    fn test_unknown_implementation_fails() {
        let factory = InterceptorFactory::with_builtins();
        let err = factory
            .construct(&context(), "upload", "upload", &SettingsMap::new())
            .unwrap_err();
        assert!(matches!(
            err,
            CompileError::UnknownImplementation { interceptor, implementation }
                if interceptor == "upload" && implementation == "upload"
        ));
    }

    #[test]
    fn test_unknown_settings_key_fails() {
        let factory = InterceptorFactory::with_builtins();
        let mut settings = SettingsMap::new();
        settings.insert("no_such_key".to_string(), serde_json::Value::from(true));

        let err = factory
            .construct(&context(), "auth", "auth", &settings)
            .unwrap_err();
        assert!(matches!(
            err,
            CompileError::InvalidSettings { interceptor, .. } if interceptor == "auth"
        ));
    }

    #[test]
    fn test_settings_type_mismatch_fails() {
        let factory = InterceptorFactory::with_builtins();
        let mut settings = SettingsMap::new();
        settings.insert("login_uri".to_string(), serde_json::Value::from(42));

        let err = factory
            .construct(&context(), "auth", "auth", &settings)
            .unwrap_err();
        assert!(matches!(err, CompileError::InvalidSettings { .. }));
    }

    #[test]
    fn test_custom_constructor_replaces_builtin() {
        let mut factory = InterceptorFactory::with_builtins();
        factory.register("session", interceptors::params::construct);
        assert!(factory.contains("session"));
    }
}
