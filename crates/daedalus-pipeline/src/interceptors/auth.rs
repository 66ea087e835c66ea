//! Authentication guard interceptor.
//!
//! Routes compiled with this interceptor require a logged-in user: a
//! session entry under the configured `user_key`. When present, the value
//! is exposed to the rest of the chain as an [`AuthUser`] extension; when
//! absent, the chain is short-circuited with a redirect to the configured
//! `login_uri` and the action never runs.
//!
//! What the user value looks like is the application's business — a user
//! id, a record snapshot — Daedalus only checks presence. Placing this
//! interceptor after the message interceptor means a "login required"
//! flash queued here survives the redirect.

use std::sync::Arc;

use daedalus_core::{BoxFuture, Response, ResultDescriptor};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::chain::{Interceptor, Next};
use crate::context::ExecutionContext;
use crate::error::ChainResult;
use crate::factory::FactoryContext;

/// Settings for the authentication interceptor.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AuthSettings {
    /// Session key holding the logged-in user.
    pub user_key: String,
    /// Redirect target for unauthenticated requests.
    pub login_uri: String,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            user_key: "user".to_string(),
            login_uri: "/login".to_string(),
        }
    }
}

/// Constructs the interceptor for the `auth` implementation id.
pub(crate) fn construct(
    _context: &FactoryContext,
    settings: serde_json::Value,
) -> Result<Arc<dyn Interceptor>, serde_json::Error> {
    let settings: AuthSettings = serde_json::from_value(settings)?;
    Ok(Arc::new(AuthInterceptor::new(settings)))
}

/// The authenticated user for this request.
///
/// Context extension set by [`AuthInterceptor`] once the session check
/// passed; actions downstream can rely on it being present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    value: Value,
}

impl AuthUser {
    /// Wraps the session value identifying the user.
    #[must_use]
    pub fn new(value: Value) -> Self {
        Self { value }
    }

    /// Returns the user value as stored in the session.
    #[must_use]
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Unwraps the user value.
    #[must_use]
    pub fn into_value(self) -> Value {
        self.value
    }
}

/// Interceptor that gates a route on a logged-in session user.
#[derive(Debug, Clone)]
pub struct AuthInterceptor {
    settings: AuthSettings,
}

impl AuthInterceptor {
    /// Creates an authentication interceptor.
    #[must_use]
    pub fn new(settings: AuthSettings) -> Self {
        Self { settings }
    }
}

impl Default for AuthInterceptor {
    fn default() -> Self {
        Self::new(AuthSettings::default())
    }
}

impl Interceptor for AuthInterceptor {
    fn around<'a>(
        &'a self,
        ctx: &'a mut ExecutionContext,
        next: Next<'a>,
    ) -> BoxFuture<'a, ChainResult<Response>> {
        Box::pin(async move {
            let user = ctx
                .session()
                .and_then(|session| session.get(&self.settings.user_key))
                .cloned();

            match user {
                Some(value) => {
                    debug!(request_id = %ctx.id(), "Session user present, request authenticated");
                    ctx.set_extension(AuthUser::new(value));
                    next.run(ctx).await
                }
                None => {
                    debug!(
                        request_id = %ctx.id(),
                        login_uri = %self.settings.login_uri,
                        "No session user, redirecting to login"
                    );
                    next.finish(
                        ctx,
                        ResultDescriptor::redirect(self.settings.login_uri.clone()),
                    )
                    .await
                }
            }
        })
    }
}
