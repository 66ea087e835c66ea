//! Error boundary interceptor.
//!
//! The recovery point of a chain: any request-level failure raised further
//! in — by an interceptor, the action, or the renderer — is caught here and
//! turned into a configured fallback result instead of escaping to the
//! host. A structured `"error"` object is exposed to the render data so the
//! fallback view or JSON body can describe what happened.
//!
//! What the object says depends on the runtime mode: in development the
//! full error chain is included, in production only a generic per-category
//! message. Status code, category, and request id are always present, and
//! validation failures additionally carry their field errors.
//!
//! Protocol violations are not request failures and pass through
//! untouched; they indicate a broken interceptor, not a broken request.

use std::error::Error as _;
use std::sync::Arc;

use daedalus_core::{BoxFuture, DaedalusError, ErrorCategory, Response, ResultDescriptor};
use serde::Deserialize;
use serde_json::Value;
use tracing::error;

use crate::chain::{Interceptor, Next};
use crate::context::ExecutionContext;
use crate::error::{ChainError, ChainResult};
use crate::factory::FactoryContext;

/// The kind of fallback result rendered after a recovered failure.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FallbackResultKind {
    /// Render the configured error view.
    #[default]
    View,
    /// Serialize the render data (including the error object) as JSON.
    Json,
}

/// Settings for the error boundary interceptor.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ErrorBoundarySettings {
    /// Fallback result kind.
    pub result: FallbackResultKind,
    /// View rendered when [`FallbackResultKind::View`] is selected.
    pub view: String,
}

impl Default for ErrorBoundarySettings {
    fn default() -> Self {
        Self {
            result: FallbackResultKind::View,
            view: "error".to_string(),
        }
    }
}

/// Constructs the interceptor for the `error` implementation id.
pub(crate) fn construct(
    context: &FactoryContext,
    settings: serde_json::Value,
) -> Result<Arc<dyn Interceptor>, serde_json::Error> {
    let settings: ErrorBoundarySettings = serde_json::from_value(settings)?;
    Ok(Arc::new(
        ErrorBoundaryInterceptor::new(settings)
            .expose_internal_errors(context.mode().is_development()),
    ))
}

/// Interceptor that converts request failures into fallback results.
#[derive(Debug, Clone)]
pub struct ErrorBoundaryInterceptor {
    settings: ErrorBoundarySettings,
    expose_details: bool,
}

impl ErrorBoundaryInterceptor {
    /// Creates a boundary that hides error details, the production stance.
    #[must_use]
    pub fn new(settings: ErrorBoundarySettings) -> Self {
        Self {
            settings,
            expose_details: false,
        }
    }

    /// Controls whether the exposed error message carries the full error
    /// chain or a generic per-category text.
    #[must_use]
    pub fn expose_internal_errors(mut self, expose: bool) -> Self {
        self.expose_details = expose;
        self
    }

    fn fallback_descriptor(&self) -> ResultDescriptor {
        match self.settings.result {
            FallbackResultKind::View => ResultDescriptor::view(self.settings.view.clone()),
            FallbackResultKind::Json => ResultDescriptor::json(),
        }
    }

    /// Builds the `"error"` object exposed to the fallback result.
    fn error_payload(&self, ctx: &ExecutionContext, failure: &DaedalusError) -> Value {
        let message = if self.expose_details {
            detail_chain(failure)
        } else {
            generic_message(failure.category()).to_string()
        };

        let mut payload = serde_json::Map::new();
        payload.insert("message".to_string(), Value::String(message));
        if let Ok(category) = serde_json::to_value(failure.category()) {
            payload.insert("category".to_string(), category);
        }
        payload.insert(
            "status".to_string(),
            Value::from(failure.status_code().as_u16()),
        );
        payload.insert("request_id".to_string(), Value::String(ctx.id().to_string()));
        if let Some(field_errors) = failure.field_errors() {
            if let Ok(value) = serde_json::to_value(&field_errors.fields) {
                payload.insert("field_errors".to_string(), value);
            }
        }
        Value::Object(payload)
    }
}

/// Formats the failure and every source beneath it.
fn detail_chain(failure: &DaedalusError) -> String {
    let mut detail = failure.to_string();
    let mut source = failure.source();
    while let Some(cause) = source {
        detail.push_str(": ");
        detail.push_str(&cause.to_string());
        source = cause.source();
    }
    detail
}

/// The client-safe message for a category, with no internals attached.
const fn generic_message(category: ErrorCategory) -> &'static str {
    match category {
        ErrorCategory::Validation => "The submitted data was invalid",
        ErrorCategory::Authentication => "Authentication is required",
        ErrorCategory::NotFound => "The requested resource does not exist",
        ErrorCategory::Database | ErrorCategory::Render | ErrorCategory::Internal => {
            "An internal error occurred"
        }
    }
}

impl Interceptor for ErrorBoundaryInterceptor {
    fn around<'a>(
        &'a self,
        ctx: &'a mut ExecutionContext,
        next: Next<'a>,
    ) -> BoxFuture<'a, ChainResult<Response>> {
        Box::pin(async move {
            let handle = next.render_handle();
            match next.run(ctx).await {
                Ok(response) => Ok(response),
                Err(ChainError::Request(failure)) => {
                    error!(
                        request_id = %ctx.id(),
                        category = ?failure.category(),
                        %failure,
                        "Recovering request failure with fallback result"
                    );
                    let payload = self.error_payload(ctx, &failure);
                    ctx.expose("error", payload);
                    handle.render(ctx, self.fallback_descriptor()).await
                }
                Err(violation @ ChainError::Protocol(_)) => Err(violation),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProtocolViolation;
    use crate::fixtures::{
        chain_of, compiled_entry, executor, failing_action, ok_action, scripted_action,
        test_context,
    };
    use daedalus_config::Mode;
    use daedalus_core::FieldErrors;
    use serde_json::json;

    fn boundary_chain(boundary: ErrorBoundaryInterceptor) -> Arc<crate::compile::RouteChain> {
        chain_of("/test", vec![compiled_entry("error", Arc::new(boundary))])
    }

    fn default_boundary() -> ErrorBoundaryInterceptor {
        ErrorBoundaryInterceptor::new(ErrorBoundarySettings::default())
    }

    #[tokio::test]
    async fn test_success_passes_through_untouched() {
        let mut ctx = test_context();
        executor()
            .execute(boundary_chain(default_boundary()), ok_action("index"), &mut ctx)
            .await
            .unwrap();
        assert!(ctx.render_data().get("error").is_none());
        assert_eq!(ctx.result(), Some(&ResultDescriptor::view("index")));
    }

    #[tokio::test]
    async fn test_recovers_action_failure_with_error_view() {
        let mut ctx = test_context();
        let response = executor()
            .execute(
                boundary_chain(default_boundary()),
                failing_action("wishlist exploded"),
                &mut ctx,
            )
            .await
            .unwrap();

        assert_eq!(ctx.result(), Some(&ResultDescriptor::view("error")));
        assert!(response.body_text().contains("error"));

        let error = ctx.render_data().get("error").expect("error exposed");
        assert_eq!(error["category"], json!("internal"));
        assert_eq!(error["status"], json!(500));
        assert_eq!(error["request_id"], json!(ctx.id().to_string()));
    }

    #[tokio::test]
    async fn test_production_mode_hides_details() {
        let mut ctx = test_context();
        executor()
            .execute(
                boundary_chain(default_boundary()),
                failing_action("secret table is corrupt"),
                &mut ctx,
            )
            .await
            .unwrap();

        let message = ctx.render_data()["error"]["message"]
            .as_str()
            .expect("message is a string");
        assert_eq!(message, "An internal error occurred");
        assert!(!message.contains("secret"));
    }

    #[tokio::test]
    async fn test_development_mode_exposes_error_chain() {
        let boundary = default_boundary().expose_internal_errors(true);
        let action = scripted_action(|_ctx| {
            let io = std::io::Error::other("disk on fire");
            Err(DaedalusError::internal_with_source("Save failed", io))
        });

        let mut ctx = test_context();
        executor()
            .execute(boundary_chain(boundary), action, &mut ctx)
            .await
            .unwrap();

        let message = ctx.render_data()["error"]["message"]
            .as_str()
            .expect("message is a string");
        assert!(message.contains("Save failed"));
        assert!(message.contains("disk on fire"));
    }

    #[tokio::test]
    async fn test_json_fallback_result() {
        let settings = ErrorBoundarySettings {
            result: FallbackResultKind::Json,
            view: "error".to_string(),
        };
        let boundary = ErrorBoundaryInterceptor::new(settings);

        let mut ctx = test_context();
        let response = executor()
            .execute(boundary_chain(boundary), failing_action("boom"), &mut ctx)
            .await
            .unwrap();

        assert_eq!(ctx.result(), Some(&ResultDescriptor::json()));
        let body: serde_json::Value = serde_json::from_str(&response.body_text()).unwrap();
        assert_eq!(body["error"]["status"], json!(500));
    }

    #[tokio::test]
    async fn test_validation_failure_carries_field_errors() {
        let action = scripted_action(|_ctx| {
            let mut fields = FieldErrors::new();
            fields.add("title", "Title is required");
            Err(DaedalusError::validation_with_fields("Invalid wish", fields))
        });

        let mut ctx = test_context();
        executor()
            .execute(boundary_chain(default_boundary()), action, &mut ctx)
            .await
            .unwrap();

        let error = &ctx.render_data()["error"];
        assert_eq!(error["category"], json!("validation"));
        assert_eq!(error["status"], json!(400));
        assert_eq!(error["field_errors"], json!({ "title": ["Title is required"] }));
    }

    #[tokio::test]
    async fn test_protocol_violations_pass_through() {
        struct Broken;
        impl Interceptor for Broken {
            fn around<'a>(
                &'a self,
                _ctx: &'a mut ExecutionContext,
                _next: Next<'a>,
            ) -> BoxFuture<'a, ChainResult<Response>> {
                Box::pin(async move {
                    Err(ChainError::Protocol(
                        ProtocolViolation::TransactionAlreadyDecided,
                    ))
                })
            }
        }

        let chain = chain_of(
            "/test",
            vec![
                compiled_entry("error", Arc::new(default_boundary())),
                compiled_entry("broken", Arc::new(Broken)),
            ],
        );

        let mut ctx = test_context();
        let result = executor().execute(chain, ok_action("index"), &mut ctx).await;

        assert!(matches!(
            result,
            Err(ChainError::Protocol(ProtocolViolation::TransactionAlreadyDecided))
        ));
        assert!(ctx.render_data().get("error").is_none());
    }

    #[test]
    fn test_settings_defaults() {
        let settings = ErrorBoundarySettings::default();
        assert_eq!(settings.result, FallbackResultKind::View);
        assert_eq!(settings.view, "error");
    }

    #[test]
    fn test_settings_deserialize() {
        let settings: ErrorBoundarySettings =
            serde_json::from_value(json!({ "result": "json" })).unwrap();
        assert_eq!(settings.result, FallbackResultKind::Json);
        assert_eq!(settings.view, "error");

        let unknown = serde_json::from_value::<ErrorBoundarySettings>(
            json!({ "template": "oops" }),
        );
        assert!(unknown.is_err());
    }

    #[test]
    fn test_construct_exposes_details_in_development() {
        let context = FactoryContext::new(Mode::Development);
        assert!(construct(&context, json!({})).is_ok());

        let context = FactoryContext::new(Mode::Production);
        assert!(construct(&context, json!({ "view": "oops" })).is_ok());
    }
}
