//! Effective interceptor settings.
//!
//! Settings layer in increasing precedence: the declaration's static
//! configuration, application-wide settings keyed by interceptor name,
//! and per-route overrides. The merge is a shallow key union; a key in a
//! higher layer replaces the lower layer's value entirely, and missing
//! layers are empty.

use daedalus_config::{DaedalusConfig, SettingsMap};
use indexmap::IndexMap;

use crate::registry::InterceptorDescriptor;

/// Produces effective settings for one interceptor on one route.
#[derive(Debug, Clone, Default)]
pub struct SettingsMerger {
    application: IndexMap<String, SettingsMap>,
    routes: IndexMap<String, IndexMap<String, SettingsMap>>,
}

impl SettingsMerger {
    /// Creates a merger with no application or route layers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a merger from configuration.
    ///
    /// The application layer is itself the shallow union of the built-in
    /// settings layer and the application's, application keys winning.
    #[must_use]
    pub fn from_config(config: &DaedalusConfig) -> Self {
        let mut application = daedalus_config::defaults::framework_config()
            .interceptors
            .settings;
        for (interceptor, settings) in &config.interceptors.settings {
            application
                .entry(interceptor.clone())
                .or_default()
                .extend(settings.clone());
        }
        Self {
            application,
            routes: config.routes.settings.clone(),
        }
    }

    /// Sets the application-wide settings for an interceptor.
    pub fn set_application(&mut self, interceptor: impl Into<String>, settings: SettingsMap) {
        self.application.insert(interceptor.into(), settings);
    }

    /// Sets the route-specific settings for an interceptor.
    pub fn set_route(
        &mut self,
        route: impl Into<String>,
        interceptor: impl Into<String>,
        settings: SettingsMap,
    ) {
        self.routes
            .entry(route.into())
            .or_default()
            .insert(interceptor.into(), settings);
    }

    /// Returns the effective settings for `descriptor` on `route`.
    #[must_use]
    pub fn effective(&self, descriptor: &InterceptorDescriptor, route: &str) -> SettingsMap {
        let mut merged = descriptor.static_config().clone();
        if let Some(settings) = self.application.get(descriptor.name()) {
            merged.extend(settings.clone());
        }
        if let Some(settings) = self
            .routes
            .get(route)
            .and_then(|overrides| overrides.get(descriptor.name()))
        {
            merged.extend(settings.clone());
        }
        merged
    }
}
