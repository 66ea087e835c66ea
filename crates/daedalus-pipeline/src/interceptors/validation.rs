//! Model validation interceptor.
//!
//! Applies the application's [`Validator`] collaborator to the
//! [`ModelBundle`] bound by the model interceptor. What "valid" means is
//! the application's business; this interceptor only routes the outcome:
//!
//! - Valid (or nothing to validate): proceed unchanged.
//! - Invalid: the field errors are recorded three ways — as a
//!   [`ValidationFailures`] extension for the action, as `"field_errors"`
//!   in the render data for the view, and as error-level flash messages.
//!   If `on_invalid_view` names a view the chain short-circuits to it;
//!   otherwise the action still runs and decides for itself.
//!
//! A factory without a validator collaborator constructs this interceptor
//! as a no-op, so stacks listing `validation` stay valid in applications
//! that have no rules yet.

use std::sync::Arc;

use daedalus_core::{BoxFuture, FieldErrors, ModelBundle, Response, ResultDescriptor, Validator};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::chain::{Interceptor, Next};
use crate::context::ExecutionContext;
use crate::error::ChainResult;
use crate::factory::FactoryContext;
use crate::interceptors::message::{FlashMessage, MessageLevel, Messages};

/// Settings for the validation interceptor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ValidationSettings {
    /// View rendered instead of running the action when validation fails.
    ///
    /// Unset means the action runs and inspects [`ValidationFailures`]
    /// itself.
    pub on_invalid_view: Option<String>,
}

/// Constructs the interceptor for the `validation` implementation id.
pub(crate) fn construct(
    context: &FactoryContext,
    settings: serde_json::Value,
) -> Result<Arc<dyn Interceptor>, serde_json::Error> {
    let settings: ValidationSettings = serde_json::from_value(settings)?;
    let mut interceptor = ValidationInterceptor::new(settings);
    if let Some(validator) = context.validator() {
        interceptor = interceptor.with_validator(Arc::clone(validator));
    }
    Ok(Arc::new(interceptor))
}

/// The validation outcome for this request.
///
/// Context extension set when the model bundle failed validation, so an
/// action running anyway (no `on_invalid_view`) can branch on it.
#[derive(Debug, Clone)]
pub struct ValidationFailures {
    /// The field errors reported by the validator.
    pub errors: FieldErrors,
}

/// Interceptor that validates the bound model bundle.
pub struct ValidationInterceptor {
    settings: ValidationSettings,
    validator: Option<Arc<dyn Validator>>,
}

impl ValidationInterceptor {
    /// Creates a validation interceptor with no validator attached.
    #[must_use]
    pub fn new(settings: ValidationSettings) -> Self {
        Self {
            settings,
            validator: None,
        }
    }

    /// Attaches the validator consulted for each bundle.
    #[must_use]
    pub fn with_validator(mut self, validator: Arc<dyn Validator>) -> Self {
        self.validator = Some(validator);
        self
    }

    /// Records the failure for the action, the view, and the user.
    fn report(ctx: &mut ExecutionContext, errors: &FieldErrors) {
        if let Ok(value) = serde_json::to_value(&errors.fields) {
            ctx.expose("field_errors", value);
        }
        if !ctx.has_extension::<Messages>() {
            ctx.set_extension(Messages::new());
        }
        if let Some(messages) = ctx.get_extension_mut::<Messages>() {
            for (field, field_messages) in &errors.fields {
                for message in field_messages {
                    messages.push(FlashMessage::new(
                        MessageLevel::Error,
                        format!("{field}: {message}"),
                    ));
                }
            }
        }
    }
}

impl std::fmt::Debug for ValidationInterceptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValidationInterceptor")
            .field("settings", &self.settings)
            .field("has_validator", &self.validator.is_some())
            .finish()
    }
}

impl Interceptor for ValidationInterceptor {
    fn around<'a>(
        &'a self,
        ctx: &'a mut ExecutionContext,
        next: Next<'a>,
    ) -> BoxFuture<'a, ChainResult<Response>> {
        Box::pin(async move {
            let Some(validator) = self.validator.as_deref() else {
                return next.run(ctx).await;
            };

            let outcome = match ctx.get_extension::<ModelBundle>() {
                Some(bundle) => validator.validate(bundle),
                None => {
                    debug!(request_id = %ctx.id(), "No model bundle bound, nothing to validate");
                    return next.run(ctx).await;
                }
            };

            match outcome {
                Ok(()) => next.run(ctx).await,
                Err(errors) => {
                    warn!(
                        request_id = %ctx.id(),
                        fields = errors.len(),
                        "Model validation failed"
                    );
                    Self::report(ctx, &errors);
                    let invalid_view = self.settings.on_invalid_view.clone();
                    ctx.set_extension(ValidationFailures { errors });
                    match invalid_view {
                        Some(view) => next.finish(ctx, ResultDescriptor::view(view)).await,
                        None => next.run(ctx).await,
                    }
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ChainState;
    use crate::fixtures::{
        chain_of, compiled_entry, executor, ok_action, require_field_validator, scripted_action,
    };
    use crate::interceptors::model::ModelInterceptor;
    use daedalus_core::Request;
    use serde_json::json;

    fn validation_chain(interceptor: ValidationInterceptor) -> Arc<crate::compile::RouteChain> {
        chain_of(
            "/wishlist/add",
            vec![
                compiled_entry("model", Arc::new(ModelInterceptor::default())),
                compiled_entry("validation", Arc::new(interceptor)),
            ],
        )
    }

    fn interceptor_with_rule(settings: ValidationSettings) -> ValidationInterceptor {
        ValidationInterceptor::new(settings).with_validator(require_field_validator("title"))
    }

    #[tokio::test]
    async fn test_valid_bundle_passes_through() {
        let mut ctx = ExecutionContext::new(
            Request::get("/wishlist/add").with_param("title", json!("Sled")),
        );

        let action = scripted_action(|ctx| {
            assert!(!ctx.has_extension::<ValidationFailures>());
            Ok(ResultDescriptor::view("wishlist/show"))
        });

        executor()
            .execute(
                validation_chain(interceptor_with_rule(ValidationSettings::default())),
                action,
                &mut ctx,
            )
            .await
            .unwrap();

        assert!(ctx.render_data().get("field_errors").is_none());
    }

    #[tokio::test]
    async fn test_invalid_bundle_is_recorded_and_action_still_runs() {
        let mut ctx = ExecutionContext::new(Request::get("/wishlist/add"));

        let action = scripted_action(|ctx| {
            let failures = ctx
                .get_extension::<ValidationFailures>()
                .expect("failures recorded");
            assert_eq!(failures.errors.len(), 1);
            Ok(ResultDescriptor::view("wishlist/new"))
        });

        executor()
            .execute(
                validation_chain(interceptor_with_rule(ValidationSettings::default())),
                action,
                &mut ctx,
            )
            .await
            .unwrap();

        assert_eq!(ctx.chain_state(), ChainState::Completed);
        assert_eq!(
            ctx.render_data().get("field_errors"),
            Some(&json!({ "title": ["title is required"] }))
        );

        let messages = ctx.get_extension::<Messages>().expect("messages created");
        assert_eq!(messages.len(), 1);
        assert_eq!(messages.entries()[0].level, MessageLevel::Error);
        assert!(messages.entries()[0].text.contains("title"));
    }

    #[tokio::test]
    async fn test_on_invalid_view_short_circuits() {
        let settings: ValidationSettings =
            serde_json::from_value(json!({ "on_invalid_view": "wishlist/new" })).unwrap();
        let mut ctx = ExecutionContext::new(Request::get("/wishlist/add"));

        let response = executor()
            .execute(
                validation_chain(interceptor_with_rule(settings)),
                ok_action("wishlist/show"),
                &mut ctx,
            )
            .await
            .unwrap();

        assert_eq!(ctx.chain_state(), ChainState::Aborted);
        assert_eq!(ctx.result(), Some(&ResultDescriptor::view("wishlist/new")));
        assert!(response.body_text().contains("wishlist/new"));
        assert!(response.body_text().contains("field_errors"));
    }

    #[tokio::test]
    async fn test_without_validator_is_a_no_op() {
        let mut ctx = ExecutionContext::new(Request::get("/wishlist/add"));

        executor()
            .execute(
                validation_chain(ValidationInterceptor::new(ValidationSettings::default())),
                ok_action("wishlist/show"),
                &mut ctx,
            )
            .await
            .unwrap();

        assert_eq!(ctx.chain_state(), ChainState::Completed);
        assert!(!ctx.has_extension::<ValidationFailures>());
    }

    #[tokio::test]
    async fn test_without_bundle_is_a_no_op() {
        // Chain without the model interceptor.
        let chain = chain_of(
            "/wishlist/add",
            vec![compiled_entry(
                "validation",
                Arc::new(interceptor_with_rule(ValidationSettings::default())),
            )],
        );
        let mut ctx = ExecutionContext::new(Request::get("/wishlist/add"));

        executor()
            .execute(chain, ok_action("wishlist/show"), &mut ctx)
            .await
            .unwrap();

        assert!(!ctx.has_extension::<ValidationFailures>());
    }

    #[test]
    fn test_construct_wires_factory_validator() {
        let context = FactoryContext::default().with_validator(require_field_validator("title"));
        assert!(construct(&context, json!({})).is_ok());
        assert!(construct(&context, json!({ "on_invalid_view": "oops" })).is_ok());
        assert!(construct(&context, json!({ "rules": [] })).is_err());
    }
}
