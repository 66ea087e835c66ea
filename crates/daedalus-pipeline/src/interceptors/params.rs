//! Parameter snapshot interceptor.
//!
//! Freezes the request parameters at interception time into a [`Params`]
//! extension. Actions read their input from this snapshot instead of the
//! request envelope, which keeps them insulated from anything that rewrites
//! the envelope later in the chain.

use std::sync::Arc;

use daedalus_core::{BoxFuture, Response};
use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value;

use crate::chain::{Interceptor, Next};
use crate::context::ExecutionContext;
use crate::error::ChainResult;
use crate::factory::FactoryContext;

/// Settings for the params interceptor.
///
/// No knobs today; present so misspelled settings fail loudly.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ParamsSettings {}

/// Constructs the interceptor for the `params` implementation id.
pub(crate) fn construct(
    _context: &FactoryContext,
    settings: serde_json::Value,
) -> Result<Arc<dyn Interceptor>, serde_json::Error> {
    let _settings: ParamsSettings = serde_json::from_value(settings)?;
    Ok(Arc::new(ParamsInterceptor::new()))
}

/// The request parameters as seen when the chain reached this interceptor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params {
    values: IndexMap<String, Value>,
}

impl Params {
    /// Returns a parameter by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Returns `true` if the snapshot is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Returns the number of parameters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns all parameters in arrival order.
    #[must_use]
    pub fn values(&self) -> &IndexMap<String, Value> {
        &self.values
    }
}

/// Interceptor that exposes a frozen parameter snapshot.
#[derive(Debug, Clone, Default)]
pub struct ParamsInterceptor;

impl ParamsInterceptor {
    /// Creates a params interceptor.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Interceptor for ParamsInterceptor {
    fn around<'a>(
        &'a self,
        ctx: &'a mut ExecutionContext,
        next: Next<'a>,
    ) -> BoxFuture<'a, ChainResult<Response>> {
        Box::pin(async move {
            let values = ctx.request().params().clone();
            ctx.set_extension(Params { values });
            next.run(ctx).await
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{chain_of, compiled_entry, executor, scripted_action};
    use daedalus_core::{Request, ResultDescriptor};
    use serde_json::json;

    fn params_chain() -> Arc<crate::compile::RouteChain> {
        chain_of(
            "/search",
            vec![compiled_entry("params", Arc::new(ParamsInterceptor::new()))],
        )
    }

    #[tokio::test]
    async fn test_snapshot_preserves_values_and_order() {
        let request = Request::get("/search")
            .with_param("q", json!("fishing rod"))
            .with_param("page", json!(2));
        let mut ctx = ExecutionContext::new(request);

        let action = scripted_action(|ctx| {
            let params = ctx.get_extension::<Params>().expect("snapshot attached");
            assert_eq!(params.len(), 2);
            assert_eq!(params.get("q"), Some(&json!("fishing rod")));
            assert_eq!(params.get("page"), Some(&json!(2)));

            let keys: Vec<_> = params.values().keys().map(String::as_str).collect();
            assert_eq!(keys, vec!["q", "page"]);
            Ok(ResultDescriptor::view("search/results"))
        });

        executor()
            .execute(params_chain(), action, &mut ctx)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_empty_request_snapshots_empty() {
        let mut ctx = ExecutionContext::new(Request::get("/search"));

        let action = scripted_action(|ctx| {
            let params = ctx.get_extension::<Params>().expect("snapshot attached");
            assert!(params.is_empty());
            Ok(ResultDescriptor::view("search/results"))
        });

        executor()
            .execute(params_chain(), action, &mut ctx)
            .await
            .unwrap();
    }

    #[test]
    fn test_construct_rejects_unknown_settings() {
        let context = FactoryContext::default();
        assert!(construct(&context, json!({ "strict": true })).is_err());
        assert!(construct(&context, json!({})).is_ok());
    }
}
