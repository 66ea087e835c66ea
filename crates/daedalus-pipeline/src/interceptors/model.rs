//! Model binding interceptor.
//!
//! Builds a [`ModelBundle`] from the request parameters and attaches it as
//! a context extension, so the action receives its input as a named model
//! rather than a raw parameter map. The bundle name comes from the `model`
//! setting, which route settings typically override (`"wish"`,
//! `"registration"`), and field order follows parameter arrival order.
//!
//! The validation interceptor, when configured, validates exactly this
//! bundle.

use std::sync::Arc;

use daedalus_core::{BoxFuture, ModelBundle, Response};
use serde::Deserialize;
use tracing::debug;

use crate::chain::{Interceptor, Next};
use crate::context::ExecutionContext;
use crate::error::ChainResult;
use crate::factory::FactoryContext;

/// Settings for the model interceptor.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ModelSettings {
    /// Name of the bundle handed to the action.
    pub model: String,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            model: "model".to_string(),
        }
    }
}

/// Constructs the interceptor for the `model` implementation id.
pub(crate) fn construct(
    _context: &FactoryContext,
    settings: serde_json::Value,
) -> Result<Arc<dyn Interceptor>, serde_json::Error> {
    let settings: ModelSettings = serde_json::from_value(settings)?;
    Ok(Arc::new(ModelInterceptor::new(settings)))
}

/// Interceptor that binds request parameters to a model bundle.
#[derive(Debug, Clone)]
pub struct ModelInterceptor {
    settings: ModelSettings,
}

impl ModelInterceptor {
    /// Creates a model interceptor.
    #[must_use]
    pub fn new(settings: ModelSettings) -> Self {
        Self { settings }
    }
}

impl Default for ModelInterceptor {
    fn default() -> Self {
        Self::new(ModelSettings::default())
    }
}

impl Interceptor for ModelInterceptor {
    fn around<'a>(
        &'a self,
        ctx: &'a mut ExecutionContext,
        next: Next<'a>,
    ) -> BoxFuture<'a, ChainResult<Response>> {
        Box::pin(async move {
            let mut bundle = ModelBundle::new(&self.settings.model);
            for (name, value) in ctx.request().params() {
                bundle.set_field(name.clone(), value.clone());
            }

            debug!(
                request_id = %ctx.id(),
                model = %self.settings.model,
                fields = bundle.fields().len(),
                "Bound request parameters to model bundle"
            );
            ctx.set_extension(bundle);

            next.run(ctx).await
        })
    }
}
