//! Configuration schema types.
//!
//! This module defines the structure of all configuration sections.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::Mode;

/// Free-form settings for a single interceptor.
///
/// Keys keep their declaration order so merged settings stay deterministic.
pub type SettingsMap = IndexMap<String, serde_json::Value>;

/// Framework section.
///
/// Identifies the application and selects the runtime mode.
///
/// # Example
///
/// ```
/// use daedalus_config::{FrameworkSection, Mode};
///
/// let section = FrameworkSection {
///     name: "wishlist".to_string(),
///     mode: Mode::Development,
///     view_root: "app/views".to_string(),
/// };
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct FrameworkSection {
    /// Application name, used in log output.
    #[serde(default = "default_app_name")]
    pub name: String,

    /// Runtime mode. Affects error reporting detail.
    #[serde(default)]
    pub mode: Mode,

    /// Root directory for view templates.
    #[serde(default = "default_view_root")]
    pub view_root: String,
}

impl Default for FrameworkSection {
    fn default() -> Self {
        Self {
            name: default_app_name(),
            mode: Mode::default(),
            view_root: default_view_root(),
        }
    }
}

fn default_app_name() -> String {
    "daedalus-app".to_string()
}

fn default_view_root() -> String {
    "views".to_string()
}

/// An interceptor declaration: either a bare implementation name, or an
/// implementation with declaration-time settings.
///
/// In TOML both forms are accepted:
///
/// ```toml
/// [interceptors.declarations]
/// session = "session"
/// error = { implementation = "error", config = { result = "view", view = "error" } }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Declaration {
    /// Implementation name only; settings come from later layers.
    Implementation(String),
    /// Implementation name plus declaration-time settings.
    Detailed(DetailedDeclaration),
}

impl Declaration {
    /// Creates a bare declaration.
    #[must_use]
    pub fn implementation(name: impl Into<String>) -> Self {
        Self::Implementation(name.into())
    }

    /// Creates a declaration with settings.
    #[must_use]
    pub fn detailed(name: impl Into<String>, config: SettingsMap) -> Self {
        Self::Detailed(DetailedDeclaration {
            implementation: name.into(),
            config,
        })
    }

    /// Returns the implementation name.
    #[must_use]
    pub fn implementation_name(&self) -> &str {
        match self {
            Self::Implementation(name) => name,
            Self::Detailed(detailed) => &detailed.implementation,
        }
    }

    /// Returns the declaration-time settings, if any.
    #[must_use]
    pub fn config(&self) -> Option<&SettingsMap> {
        match self {
            Self::Implementation(_) => None,
            Self::Detailed(detailed) => Some(&detailed.config),
        }
    }
}

/// The detailed form of a [`Declaration`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct DetailedDeclaration {
    /// Implementation name, resolved by the interceptor factory.
    pub implementation: String,

    /// Declaration-time settings. The lowest settings layer.
    #[serde(default)]
    pub config: SettingsMap,
}

/// Interceptors section.
///
/// Declares named interceptors, composes them into named stacks, and holds
/// application-wide settings overrides.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct InterceptorsSection {
    /// Named interceptor declarations. Later declarations with the same name
    /// replace earlier ones.
    #[serde(default)]
    pub declarations: IndexMap<String, Declaration>,

    /// Named stacks. Members reference interceptor or stack names.
    #[serde(default)]
    pub stacks: IndexMap<String, Vec<String>>,

    /// Application-wide settings overrides, keyed by interceptor name.
    /// The middle settings layer.
    #[serde(default)]
    pub settings: IndexMap<String, SettingsMap>,
}

/// Routes section.
///
/// Maps route patterns to the stack or interceptor tokens that guard them,
/// and carries route-specific settings overrides.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct RoutesSection {
    /// Route pattern to tokens. Each token names a stack or an interceptor.
    #[serde(default)]
    pub chains: IndexMap<String, Vec<String>>,

    /// Route-specific settings overrides, keyed by route pattern and then
    /// interceptor name. The highest settings layer.
    #[serde(default)]
    pub settings: IndexMap<String, IndexMap<String, SettingsMap>>,

    /// Tokens used for routes with no `chains` entry.
    #[serde(default = "default_fallback")]
    pub fallback: Vec<String>,
}

impl Default for RoutesSection {
    fn default() -> Self {
        Self {
            chains: IndexMap::new(),
            settings: IndexMap::new(),
            fallback: default_fallback(),
        }
    }
}

fn default_fallback() -> Vec<String> {
    vec!["defaultStack".to_string()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_framework_section_default() {
        let section = FrameworkSection::default();
        assert_eq!(section.name, "daedalus-app");
        assert_eq!(section.mode, Mode::Production);
        assert_eq!(section.view_root, "views");
    }

    #[test]
    fn test_framework_section_deserialize() {
        let toml = r#"
            name = "wishlist"
            mode = "development"
        "#;
        let section: FrameworkSection = toml::from_str(toml).unwrap();
        assert_eq!(section.name, "wishlist");
        assert_eq!(section.mode, Mode::Development);
        // Defaults applied
        assert_eq!(section.view_root, "views");
    }

    #[test]
    fn test_framework_section_unknown_field_rejected() {
        let toml = r#"
            name = "wishlist"
            unknown_field = "value"
        "#;
        let result: Result<FrameworkSection, _> = toml::from_str(toml);
        assert!(result.is_err());
    }

    #[test]
    fn test_declaration_bare_form() {
        let json = r#""session""#;
        let declaration: Declaration = serde_json::from_str(json).unwrap();
        assert_eq!(declaration.implementation_name(), "session");
        assert!(declaration.config().is_none());
    }

    #[test]
    fn test_declaration_detailed_form() {
        let json = r#"{"implementation": "error", "config": {"view": "oops"}}"#;
        let declaration: Declaration = serde_json::from_str(json).unwrap();
        assert_eq!(declaration.implementation_name(), "error");
        let config = declaration.config().unwrap();
        assert_eq!(config.get("view"), Some(&serde_json::Value::from("oops")));
    }

    #[test]
    fn test_interceptors_section_from_toml() {
        let toml = r#"
            [declarations]
            session = "session"
            error = { implementation = "error", config = { view = "error" } }

            [stacks]
            defaultStack = ["session", "error"]

            [settings.error]
            view = "failure"
        "#;
        let section: InterceptorsSection = toml::from_str(toml).unwrap();
        assert_eq!(section.declarations.len(), 2);
        assert_eq!(
            section.stacks.get("defaultStack"),
            Some(&vec!["session".to_string(), "error".to_string()])
        );
        assert_eq!(
            section.settings.get("error").and_then(|s| s.get("view")),
            Some(&serde_json::Value::from("failure"))
        );
    }

    #[test]
    fn test_routes_section_default_fallback() {
        let section = RoutesSection::default();
        assert_eq!(section.fallback, vec!["defaultStack".to_string()]);
        assert!(section.chains.is_empty());
    }

    #[test]
    fn test_routes_section_from_toml() {
        let toml = r#"
            fallback = ["defaultStack"]

            [chains]
            "/wishlist/edit" = ["authStack"]

            [settings."/wishlist/edit".auth]
            login_uri = "/account/login"
        "#;
        let section: RoutesSection = toml::from_str(toml).unwrap();
        assert_eq!(
            section.chains.get("/wishlist/edit"),
            Some(&vec!["authStack".to_string()])
        );
        let overrides = section.settings.get("/wishlist/edit").unwrap();
        assert_eq!(
            overrides.get("auth").and_then(|s| s.get("login_uri")),
            Some(&serde_json::Value::from("/account/login"))
        );
    }
}
