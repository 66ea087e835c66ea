//! Named stack expansion.
//!
//! A stack is a named, ordered, reusable list of interceptor names.
//! Stacks are flat: a member is always an interceptor name, never another
//! stack. The resolver unions the built-in stacks with the application's
//! by name; an application stack reusing a built-in name replaces it
//! entirely, with no element-level merge.

use daedalus_config::DaedalusConfig;
use indexmap::{IndexMap, IndexSet};

use crate::error::CompileError;

/// Expands stack names into ordered, duplicate-free member lists.
#[derive(Debug, Clone, Default)]
pub struct StackResolver {
    stacks: IndexMap<String, Vec<String>>,
}

impl StackResolver {
    /// Creates a resolver with no stacks.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a resolver from the built-in stacks layered under the
    /// application's.
    #[must_use]
    pub fn from_config(config: &DaedalusConfig) -> Self {
        let mut resolver = Self::new();
        for (name, members) in daedalus_config::defaults::stacks() {
            resolver.define(name, members);
        }
        for (name, members) in &config.interceptors.stacks {
            resolver.define(name.clone(), members.clone());
        }
        resolver
    }

    /// Defines a stack; redefining a name replaces its members entirely.
    pub fn define(&mut self, name: impl Into<String>, members: Vec<String>) {
        self.stacks.insert(name.into(), members);
    }

    /// Returns `true` if the name is a defined stack.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.stacks.contains_key(name)
    }

    /// Expands a stack into its member list, collapsing duplicates to
    /// their first position.
    ///
    /// # Errors
    ///
    /// Returns [`CompileError::UnknownStack`] if the name is not defined.
    /// The route compiler checks [`StackResolver::contains`] first and
    /// falls back to treating an unknown token as a bare interceptor name.
    pub fn expand(&self, name: &str) -> Result<Vec<String>, CompileError> {
        let members = self
            .stacks
            .get(name)
            .ok_or_else(|| CompileError::unknown_stack(name))?;

        let mut seen = IndexSet::with_capacity(members.len());
        for member in members {
            seen.insert(member.clone());
        }
        Ok(seen.into_iter().collect())
    }

    /// Returns the defined stack names in definition order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.stacks.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use daedalus_config::defaults::{AUTH_STACK, DEFAULT_STACK};
    use daedalus_config::DaedalusConfig;

    fn to_members(members: &[&str]) -> Vec<String> {
        members.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn test_expand_preserves_order() {
        let mut resolver = StackResolver::new();
        resolver.define("adminStack", to_members(&["session", "auth", "model"]));

        let expanded = resolver.expand("adminStack").unwrap();
        assert_eq!(expanded, to_members(&["session", "auth", "model"]));
    }

    #[test]
    fn test_expand_collapses_duplicates_to_first_position() {
        let mut resolver = StackResolver::new();
        resolver.define(
            "noisy",
            to_members(&["session", "model", "session", "auth", "model"]),
        );

        let expanded = resolver.expand("noisy").unwrap();
        assert_eq!(expanded, to_members(&["session", "model", "auth"]));
    }

    #[test]
    fn test_expand_unknown_stack_fails() {
        let resolver = StackResolver::new();
        let err = resolver.expand("ghost").unwrap_err();
        assert!(matches!(
            err,
            CompileError::UnknownStack { name } if name == "ghost"
        ));
    }

    #[test]
    fn test_from_config_carries_builtin_stacks() {
        let resolver = StackResolver::from_config(&DaedalusConfig::default());

        assert_eq!(
            resolver.expand(DEFAULT_STACK).unwrap(),
            to_members(&[
                "session",
                "message",
                "error",
                "transaction",
                "model",
                "validation"
            ])
        );
        assert_eq!(
            resolver.expand(AUTH_STACK).unwrap(),
            to_members(&[
                "session",
                "message",
                "error",
                "transaction",
                "auth",
                "model",
                "validation"
            ])
        );
    }

    #[test]
    fn test_application_stack_replaces_builtin_entirely() {
        let config = DaedalusConfig::builder()
            .stack(DEFAULT_STACK, &["session", "error"])
            .build();

        let resolver = StackResolver::from_config(&config);
        assert_eq!(
            resolver.expand(DEFAULT_STACK).unwrap(),
            to_members(&["session", "error"])
        );
    }

    #[test]
    fn test_application_stacks_extend_builtins() {
        let config = DaedalusConfig::builder()
            .stack("apiStack", &["session", "error", "transaction"])
            .build();

        let resolver = StackResolver::from_config(&config);
        assert!(resolver.contains("apiStack"));
        assert!(resolver.contains(AUTH_STACK));
    }
}
