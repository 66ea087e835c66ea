//! Typed configuration system for Daedalus.
//!
//! This crate provides a strongly-typed configuration system for Daedalus
//! applications with support for:
//! - TOML and JSON configuration files
//! - Mode-specific configuration files (`conf/development.toml`)
//! - Environment variable overrides
//! - Strict parsing (fails on unknown fields)
//! - Hot-reload of configuration files during development
//!
//! # Overview
//!
//! The configuration system is built around the [`DaedalusConfig`] struct:
//!
//! - [`FrameworkSection`] - application identity and runtime [`Mode`]
//! - [`InterceptorsSection`] - interceptor declarations, stacks, and
//!   application-wide settings
//! - [`RoutesSection`] - route-to-chain mapping and route-specific settings
//!
//! The built-in declarations and stacks every application starts from live
//! in [`defaults`].
//!
//! # Example
//!
//! ```no_run
//! use daedalus_config::{ConfigLoader, Mode};
//!
//! # fn main() -> Result<(), daedalus_config::ConfigError> {
//! let mode = Mode::from_env()?;
//! let config = ConfigLoader::new()
//!     .with_file("conf/daedalus.toml")?
//!     .with_mode_file("conf", mode)?
//!     .with_env_prefix("DAEDALUS")
//!     .load()?;
//!
//! println!("Application: {} ({})", config.framework.name, config.framework.mode);
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration File Format
//!
//! ```toml
//! [framework]
//! name = "wishlist"
//! mode = "development"
//! view_root = "app/views"
//!
//! [interceptors.declarations]
//! timing = { implementation = "timing", config = { threshold_ms = 250 } }
//!
//! [interceptors.stacks]
//! apiStack = ["session", "error", "timing"]
//!
//! [interceptors.settings.auth]
//! login_uri = "/account/login"
//!
//! [routes]
//! fallback = ["defaultStack"]
//!
//! [routes.chains]
//! "/wishlist/edit" = ["authStack"]
//! "/api/wishes" = ["apiStack"]
//!
//! [routes.settings."/wishlist/edit".auth]
//! login_uri = "/login"
//! ```
//!
//! # Environment Variable Overrides
//!
//! Framework values can be overridden via environment variables using the
//! format `PREFIX__SECTION__KEY`. For example:
//!
//! - `DAEDALUS__FRAMEWORK__NAME=wishlist`
//! - `DAEDALUS__FRAMEWORK__MODE=development`
//! - `DAEDALUS__FRAMEWORK__VIEW_ROOT=app/views`
//!
//! The runtime mode can also be selected with the `DAEDALUS_MODE` variable,
//! read by [`Mode::from_env`].

#![warn(missing_docs)]

mod config;
pub mod defaults;
mod error;
mod loader;
mod mode;
mod schema;
mod watcher;

pub use config::{DaedalusConfig, DaedalusConfigBuilder};
pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use mode::{Mode, MODE_ENV_VAR};
pub use schema::{
    Declaration, DetailedDeclaration, FrameworkSection, InterceptorsSection, RoutesSection,
    SettingsMap,
};
pub use watcher::{ChangeKind, ConfigChangeEvent, ConfigWatcher, ConfigWatcherBuilder, WatcherOptions};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = DaedalusConfig::default();
        assert_eq!(config.framework.name, "daedalus-app");
        assert_eq!(config.framework.mode, Mode::Production);
    }

    #[test]
    fn test_config_builder() {
        let config = DaedalusConfig::builder()
            .route("/wishlist/edit", &["authStack"])
            .build();

        assert_eq!(
            config.routes.chains.get("/wishlist/edit"),
            Some(&vec!["authStack".to_string()])
        );
    }

    #[test]
    fn test_defaults_module_is_consistent() {
        let config = defaults::framework_config();
        for (_, members) in &config.interceptors.stacks {
            for member in members {
                assert!(
                    config.interceptors.declarations.contains_key(member),
                    "stack member {member} has no declaration"
                );
            }
        }
    }
}
