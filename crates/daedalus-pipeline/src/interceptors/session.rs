//! Session lifecycle interceptor.
//!
//! Moves the session restored by the host from the request envelope into
//! the execution context, starting a fresh one when nothing was restored.
//! On the way out — after the action ran, failed, or was short-circuited —
//! the (possibly mutated) session is written back into the envelope so the
//! host can persist it.
//!
//! Every interceptor downstream of this one reads and writes the session
//! through [`ExecutionContext::session`] and
//! [`ExecutionContext::session_mut`].

use std::sync::Arc;

use daedalus_core::{BoxFuture, Response, Session};
use serde::Deserialize;
use tracing::debug;

use crate::chain::{Interceptor, Next};
use crate::context::ExecutionContext;
use crate::error::ChainResult;
use crate::factory::FactoryContext;

/// Settings for the session interceptor.
///
/// The interceptor is not configurable today; the struct exists so
/// misspelled settings are rejected instead of silently ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SessionSettings {}

/// Constructs the interceptor for the `session` implementation id.
pub(crate) fn construct(
    _context: &FactoryContext,
    settings: serde_json::Value,
) -> Result<Arc<dyn Interceptor>, serde_json::Error> {
    let _settings: SessionSettings = serde_json::from_value(settings)?;
    Ok(Arc::new(SessionInterceptor::new()))
}

/// Interceptor that owns the session for the duration of a request.
#[derive(Debug, Clone, Default)]
pub struct SessionInterceptor;

impl SessionInterceptor {
    /// Creates a new session interceptor.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Interceptor for SessionInterceptor {
    fn around<'a>(
        &'a self,
        ctx: &'a mut ExecutionContext,
        next: Next<'a>,
    ) -> BoxFuture<'a, ChainResult<Response>> {
        Box::pin(async move {
            if !ctx.has_extension::<Session>() {
                let session = match ctx.request_mut().take_session() {
                    Some(session) => session,
                    None => {
                        debug!(request_id = %ctx.id(), "No restored session, starting fresh");
                        Session::new()
                    }
                };
                ctx.set_extension(session);
            }

            let result = next.run(ctx).await;

            // Write back whether the request succeeded or failed; a failed
            // action may still have parked messages worth persisting.
            if let Some(session) = ctx.session().cloned() {
                ctx.request_mut().set_session(session);
            }

            result
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{
        chain_of, compiled_entry, executor, failing_action, ok_action, scripted_action,
        test_context,
    };
    use daedalus_core::{Request, ResultDescriptor};
    use serde_json::json;

    fn session_chain() -> Arc<crate::compile::RouteChain> {
        chain_of(
            "/test",
            vec![compiled_entry("session", Arc::new(SessionInterceptor::new()))],
        )
    }

    #[tokio::test]
    async fn test_moves_restored_session_into_context() {
        let mut restored = Session::new();
        restored.set("user", json!("athos"));
        let mut ctx =
            ExecutionContext::new(Request::get("/test").with_session(restored));

        let action = scripted_action(|ctx| {
            let user = ctx
                .session()
                .and_then(|session| session.get("user"))
                .cloned();
            assert_eq!(user, Some(json!("athos")));
            Ok(ResultDescriptor::view("index"))
        });

        executor()
            .execute(session_chain(), action, &mut ctx)
            .await
            .unwrap();

        // Ownership moved out of the envelope during the request.
        assert!(ctx.has_extension::<Session>());
    }

    #[tokio::test]
    async fn test_starts_fresh_session_when_none_restored() {
        let mut ctx = test_context();
        assert!(ctx.request().session().is_none());

        let action = scripted_action(|ctx| {
            assert!(ctx.session().is_some_and(Session::is_empty));
            Ok(ResultDescriptor::view("index"))
        });

        executor()
            .execute(session_chain(), action, &mut ctx)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_writes_mutated_session_back_to_envelope() {
        let mut ctx = test_context();

        let action = scripted_action(|ctx| {
            if let Some(session) = ctx.session_mut() {
                session.set("visits", json!(3));
            }
            Ok(ResultDescriptor::view("index"))
        });

        executor()
            .execute(session_chain(), action, &mut ctx)
            .await
            .unwrap();

        let written = ctx.request().session().expect("session written back");
        assert_eq!(written.get("visits"), Some(&json!(3)));
    }

    #[tokio::test]
    async fn test_writes_session_back_when_action_fails() {
        let mut ctx = test_context();

        let result = executor()
            .execute(session_chain(), failing_action("boom"), &mut ctx)
            .await;

        assert!(result.is_err());
        assert!(ctx.request().session().is_some());
    }

    #[tokio::test]
    async fn test_keeps_existing_context_session() {
        let mut ctx = test_context();
        let mut existing = Session::new();
        existing.set("seeded", json!(true));
        ctx.set_extension(existing);

        executor()
            .execute(session_chain(), ok_action("index"), &mut ctx)
            .await
            .unwrap();

        let written = ctx.request().session().expect("session written back");
        assert_eq!(written.get("seeded"), Some(&json!(true)));
    }

    #[test]
    fn test_construct_rejects_unknown_settings() {
        let context = FactoryContext::default();
        let result = construct(&context, json!({ "cookie_name": "sid" }));
        assert!(result.is_err());
    }

    #[test]
    fn test_construct_accepts_empty_settings() {
        let context = FactoryContext::default();
        assert!(construct(&context, json!({})).is_ok());
    }
}
