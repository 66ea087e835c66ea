//! Generative properties of route chain compilation.
//!
//! A shadow model expands and deduplicates token lists the way the
//! compiler is specified to, and random token lists drawn from the
//! built-in vocabulary must compile to exactly the model's output:
//! stack tokens expand in place, duplicates collapse to their first
//! occurrence, and the result is stable across repeated compilation.

use daedalus_config::defaults::{AUTH_STACK, DEFAULT_STACK};
use daedalus_config::{DaedalusConfig, Mode};
use daedalus_pipeline::{FactoryContext, RouteChainCompiler};
use proptest::prelude::*;

/// Every token a route may legally carry with the built-in declarations.
const VOCABULARY: &[&str] = &[
    "session",
    "message",
    "error",
    "transaction",
    "auth",
    "model",
    "validation",
    "params",
    DEFAULT_STACK,
    AUTH_STACK,
];

fn compiler() -> RouteChainCompiler {
    let config = DaedalusConfig::builder().build();
    RouteChainCompiler::from_config(&config, FactoryContext::new(Mode::Test))
}

/// Model expansion: stacks to their members, interceptors to
/// themselves.
fn model_expand(token: &str) -> Vec<&'static str> {
    match token {
        t if t == DEFAULT_STACK => vec![
            "session",
            "message",
            "error",
            "transaction",
            "model",
            "validation",
        ],
        t if t == AUTH_STACK => vec![
            "session",
            "message",
            "error",
            "transaction",
            "auth",
            "model",
            "validation",
        ],
        "session" => vec!["session"],
        "message" => vec!["message"],
        "error" => vec!["error"],
        "transaction" => vec!["transaction"],
        "auth" => vec!["auth"],
        "model" => vec!["model"],
        "validation" => vec!["validation"],
        "params" => vec!["params"],
        other => panic!("token {other} is not in the vocabulary"),
    }
}

/// Model chain: concatenated expansion, first occurrence wins.
fn model_chain(tokens: &[String]) -> Vec<&'static str> {
    let mut chain = Vec::new();
    for token in tokens {
        for name in model_expand(token) {
            if !chain.contains(&name) {
                chain.push(name);
            }
        }
    }
    chain
}

fn token_lists() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(
        prop::sample::select(VOCABULARY).prop_map(str::to_string),
        0..8,
    )
}

proptest! {
    /// The compiler produces exactly the shadow model's chain.
    #[test]
    fn prop_compiled_chain_matches_model(tokens in token_lists()) {
        let chain = compiler().compile_route("/any", &tokens).unwrap();
        prop_assert_eq!(chain.names(), model_chain(&tokens));
    }

    /// No interceptor appears twice, whatever the token list looks like.
    #[test]
    fn prop_chains_never_contain_duplicates(tokens in token_lists()) {
        let chain = compiler().compile_route("/any", &tokens).unwrap();
        let names = chain.names();
        let unique: std::collections::BTreeSet<_> = names.iter().collect();
        prop_assert_eq!(names.len(), unique.len());
    }

    /// Repeating the whole token list changes nothing: deduplication
    /// spans the full concatenation, not each token.
    #[test]
    fn prop_repeated_token_list_is_idempotent(tokens in token_lists()) {
        let once = compiler().compile_route("/any", &tokens).unwrap();

        let mut doubled = tokens.clone();
        doubled.extend(tokens.iter().cloned());
        let twice = compiler().compile_route("/any", &doubled).unwrap();

        prop_assert_eq!(once.names(), twice.names());
    }

    /// Compilation is a pure function of the configuration.
    #[test]
    fn prop_compilation_is_deterministic(tokens in token_lists()) {
        let first = compiler().compile_route("/any", &tokens).unwrap();
        let second = compiler().compile_route("/any", &tokens).unwrap();
        prop_assert_eq!(first.names(), second.names());
    }

    /// Every compiled position resolves to a declared interceptor and a
    /// constructed instance.
    #[test]
    fn prop_every_position_is_declared_and_constructed(tokens in token_lists()) {
        let chain = compiler().compile_route("/any", &tokens).unwrap();
        for entry in chain.interceptors() {
            prop_assert!(VOCABULARY.contains(&entry.name()));
            prop_assert!(!entry.implementation().is_empty());
        }
    }
}
