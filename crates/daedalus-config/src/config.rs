//! Main configuration types.
//!
//! This module provides the top-level [`DaedalusConfig`] struct and its builder.

use serde::{Deserialize, Serialize};

use crate::{Declaration, FrameworkSection, InterceptorsSection, Mode, RoutesSection};

/// Complete Daedalus application configuration.
///
/// This is the root configuration type. It declares interceptors, composes
/// them into stacks, and maps routes onto them. Use
/// [`ConfigLoader`](crate::ConfigLoader) to load configuration from files
/// and environment variables.
///
/// An empty configuration is valid: the framework seeds its interceptor
/// registry with the built-in declarations and stacks from
/// [`defaults`](crate::defaults) before this configuration is applied, so
/// applications only declare what they add or override.
///
/// # Example
///
/// ```
/// use daedalus_config::DaedalusConfig;
///
/// let config = DaedalusConfig::default();
/// assert_eq!(config.framework.name, "daedalus-app");
/// assert_eq!(config.routes.fallback, vec!["defaultStack".to_string()]);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct DaedalusConfig {
    /// Framework identity and mode.
    #[serde(default)]
    pub framework: FrameworkSection,

    /// Interceptor declarations, stacks, and global settings.
    #[serde(default)]
    pub interceptors: InterceptorsSection,

    /// Route-to-chain mapping and route-specific settings.
    #[serde(default)]
    pub routes: RoutesSection,
}

impl DaedalusConfig {
    /// Create a new configuration builder.
    ///
    /// # Example
    ///
    /// ```
    /// use daedalus_config::DaedalusConfig;
    ///
    /// let config = DaedalusConfig::builder()
    ///     .declaration("timing", "timing")
    ///     .stack("apiStack", &["session", "timing"])
    ///     .route("/api/wishes", &["apiStack"])
    ///     .build();
    ///
    /// assert!(config.interceptors.declarations.contains_key("timing"));
    /// ```
    #[must_use]
    pub fn builder() -> DaedalusConfigBuilder {
        DaedalusConfigBuilder::new()
    }

    /// Validate the configuration.
    ///
    /// This checks structural invariants only. Reference resolution
    /// (unknown interceptor names, stack cycles) happens when the route
    /// chain set is compiled.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if:
    /// - The application name or view root is empty
    /// - A declaration has an empty implementation name
    /// - A stack or chain contains an empty token
    pub fn validate(&self) -> Result<(), crate::ConfigError> {
        if self.framework.name.trim().is_empty() {
            return Err(crate::ConfigError::invalid_value(
                "framework.name",
                "must not be empty",
            ));
        }

        if self.framework.view_root.trim().is_empty() {
            return Err(crate::ConfigError::invalid_value(
                "framework.view_root",
                "must not be empty",
            ));
        }

        for (name, declaration) in &self.interceptors.declarations {
            if declaration.implementation_name().trim().is_empty() {
                return Err(crate::ConfigError::invalid_value(
                    format!("interceptors.declarations.{name}"),
                    "implementation must not be empty",
                ));
            }
        }

        for (name, members) in &self.interceptors.stacks {
            if members.iter().any(|token| token.trim().is_empty()) {
                return Err(crate::ConfigError::invalid_value(
                    format!("interceptors.stacks.{name}"),
                    "stack members must not be empty",
                ));
            }
        }

        for (route, tokens) in &self.routes.chains {
            if tokens.iter().any(|token| token.trim().is_empty()) {
                return Err(crate::ConfigError::invalid_value(
                    format!("routes.chains.{route}"),
                    "chain tokens must not be empty",
                ));
            }
        }

        if self.routes.fallback.iter().any(|token| token.trim().is_empty()) {
            return Err(crate::ConfigError::invalid_value(
                "routes.fallback",
                "fallback tokens must not be empty",
            ));
        }

        Ok(())
    }

    /// Create a development configuration preset.
    ///
    /// Development mode makes the error boundary expose error details to
    /// the error view.
    ///
    /// # Example
    ///
    /// ```
    /// use daedalus_config::{DaedalusConfig, Mode};
    ///
    /// let config = DaedalusConfig::development();
    /// assert_eq!(config.framework.mode, Mode::Development);
    /// ```
    #[must_use]
    pub fn development() -> Self {
        let mut config = Self::default();
        config.framework.mode = Mode::Development;
        config
    }

    /// Create a production configuration preset.
    ///
    /// # Example
    ///
    /// ```
    /// use daedalus_config::{DaedalusConfig, Mode};
    ///
    /// let config = DaedalusConfig::production();
    /// assert_eq!(config.framework.mode, Mode::Production);
    /// ```
    #[must_use]
    pub fn production() -> Self {
        let mut config = Self::default();
        config.framework.mode = Mode::Production;
        config
    }
}

/// Builder for [`DaedalusConfig`].
#[derive(Debug, Default)]
pub struct DaedalusConfigBuilder {
    config: DaedalusConfig,
}

impl DaedalusConfigBuilder {
    /// Create a new builder with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the framework section.
    #[must_use]
    pub fn framework(mut self, framework: FrameworkSection) -> Self {
        self.config.framework = framework;
        self
    }

    /// Set the runtime mode.
    #[must_use]
    pub fn mode(mut self, mode: Mode) -> Self {
        self.config.framework.mode = mode;
        self
    }

    /// Declare an interceptor with a bare implementation name.
    #[must_use]
    pub fn declaration(
        mut self,
        name: impl Into<String>,
        implementation: impl Into<String>,
    ) -> Self {
        self.config
            .interceptors
            .declarations
            .insert(name.into(), Declaration::implementation(implementation));
        self
    }

    /// Declare an interceptor with declaration-time settings.
    #[must_use]
    pub fn declaration_with_config(
        mut self,
        name: impl Into<String>,
        declaration: Declaration,
    ) -> Self {
        self.config
            .interceptors
            .declarations
            .insert(name.into(), declaration);
        self
    }

    /// Define a named stack.
    #[must_use]
    pub fn stack(mut self, name: impl Into<String>, members: &[&str]) -> Self {
        self.config.interceptors.stacks.insert(
            name.into(),
            members.iter().map(|s| (*s).to_string()).collect(),
        );
        self
    }

    /// Set an application-wide setting for an interceptor.
    #[must_use]
    pub fn setting(
        mut self,
        interceptor: impl Into<String>,
        key: impl Into<String>,
        value: impl Into<serde_json::Value>,
    ) -> Self {
        self.config
            .interceptors
            .settings
            .entry(interceptor.into())
            .or_default()
            .insert(key.into(), value.into());
        self
    }

    /// Map a route to stack or interceptor tokens.
    #[must_use]
    pub fn route(mut self, pattern: impl Into<String>, tokens: &[&str]) -> Self {
        self.config.routes.chains.insert(
            pattern.into(),
            tokens.iter().map(|s| (*s).to_string()).collect(),
        );
        self
    }

    /// Set a route-specific setting for an interceptor.
    #[must_use]
    pub fn route_setting(
        mut self,
        route: impl Into<String>,
        interceptor: impl Into<String>,
        key: impl Into<String>,
        value: impl Into<serde_json::Value>,
    ) -> Self {
        self.config
            .routes
            .settings
            .entry(route.into())
            .or_default()
            .entry(interceptor.into())
            .or_default()
            .insert(key.into(), value.into());
        self
    }

    /// Set the fallback tokens for unmapped routes.
    #[must_use]
    pub fn fallback(mut self, tokens: &[&str]) -> Self {
        self.config.routes.fallback = tokens.iter().map(|s| (*s).to_string()).collect();
        self
    }

    /// Build the configuration.
    #[must_use]
    pub fn build(self) -> DaedalusConfig {
        self.config
    }

    /// Build and validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if validation fails.
    pub fn build_validated(self) -> Result<DaedalusConfig, crate::ConfigError> {
        let config = self.build();
        config.validate()?;
        Ok(config)
    }
}
