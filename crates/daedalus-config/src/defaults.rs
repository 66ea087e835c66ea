//! Built-in interceptor declarations and stacks.
//!
//! The framework seeds its interceptor registry from this module before any
//! application configuration is applied. Applications reference these names
//! from their own stacks and route chains, override their settings, or
//! replace the declarations entirely.

use indexmap::IndexMap;

use crate::{DaedalusConfig, Declaration, SettingsMap};

/// Name of the stack applied to routes without an explicit chain entry.
pub const DEFAULT_STACK: &str = "defaultStack";

/// Name of the stack guarding routes that require a signed-in user.
pub const AUTH_STACK: &str = "authStack";

/// Returns the built-in interceptor declarations.
///
/// - `message` - flash message collection and session hand-off
/// - `validation` - model validation, aborts on failure
/// - `error` - error boundary rendering a fallback result
/// - `session` - session attach and write-back
/// - `auth` - session-based authentication guard
/// - `model` - model bundle population from request parameters
/// - `params` - raw request parameter exposure
/// - `transaction` - database transaction around downstream work
#[must_use]
pub fn declarations() -> IndexMap<String, Declaration> {
    let mut declarations = IndexMap::new();
    declarations.insert(
        "message".to_string(),
        Declaration::implementation("message"),
    );
    declarations.insert(
        "validation".to_string(),
        Declaration::implementation("validation"),
    );

    let mut error_config = SettingsMap::new();
    error_config.insert("result".to_string(), serde_json::Value::from("view"));
    error_config.insert("view".to_string(), serde_json::Value::from("error"));
    declarations.insert(
        "error".to_string(),
        Declaration::detailed("error", error_config),
    );

    declarations.insert(
        "session".to_string(),
        Declaration::implementation("session"),
    );
    declarations.insert("auth".to_string(), Declaration::implementation("auth"));
    declarations.insert("model".to_string(), Declaration::implementation("model"));
    declarations.insert("params".to_string(), Declaration::implementation("params"));
    declarations.insert(
        "transaction".to_string(),
        Declaration::implementation("transaction"),
    );
    declarations
}

/// Returns the built-in stacks.
///
/// `defaultStack` wraps every route in session handling, flash messages,
/// the error boundary, a transaction, and model handling. `authStack` adds
/// the authentication guard between the transaction and the model step.
#[must_use]
pub fn stacks() -> IndexMap<String, Vec<String>> {
    let mut stacks = IndexMap::new();
    stacks.insert(
        DEFAULT_STACK.to_string(),
        to_members(&["session", "message", "error", "transaction", "model", "validation"]),
    );
    stacks.insert(
        AUTH_STACK.to_string(),
        to_members(&[
            "session",
            "message",
            "error",
            "transaction",
            "auth",
            "model",
            "validation",
        ]),
    );
    stacks
}

/// Returns a configuration carrying the built-in declarations and stacks.
///
/// Useful in tests and demos that want a working chain set without loading
/// any files.
#[must_use]
pub fn framework_config() -> DaedalusConfig {
    let mut config = DaedalusConfig::default();
    config.interceptors.declarations = declarations();
    config.interceptors.stacks = stacks();
    config
}

fn to_members(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| (*s).to_string()).collect()
}
