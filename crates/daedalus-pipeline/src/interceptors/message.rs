//! Flash message interceptor.
//!
//! Gives actions a [`Messages`] collection for one-shot user notices
//! ("Wish added", "Login required"). Delivery depends on how the request
//! ends:
//!
//! - **Rendered results** (view, JSON): the chain injects the collection
//!   into the render data under `"messages"`, so the current response
//!   carries them.
//! - **Redirects**: the browser never renders this response, so undelivered
//!   messages are parked in the session under [`SESSION_MESSAGES_KEY`] and
//!   picked up by this interceptor on the next request.
//!
//! Parked payloads that fail to deserialize (stale format, tampering) are
//! discarded with a warning rather than failing the request.

use std::sync::Arc;

use daedalus_core::{BoxFuture, Response, ResultDescriptor};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::chain::{Interceptor, Next};
use crate::context::ExecutionContext;
use crate::error::ChainResult;
use crate::factory::FactoryContext;

/// Session key under which undelivered messages are parked across a
/// redirect.
pub const SESSION_MESSAGES_KEY: &str = "daedalus.messages";

/// Severity of a flash message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageLevel {
    /// Neutral notice.
    Info,
    /// A completed operation.
    Success,
    /// Something worth attention, request still succeeded.
    Warning,
    /// A failed operation reported to the user.
    Error,
}

/// A single one-shot user notice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlashMessage {
    /// Severity, used by views to pick styling.
    pub level: MessageLevel,
    /// Human-readable text.
    pub text: String,
}

impl FlashMessage {
    /// Creates a flash message.
    pub fn new(level: MessageLevel, text: impl Into<String>) -> Self {
        Self {
            level,
            text: text.into(),
        }
    }
}

/// The per-request flash message collection.
///
/// Lives in the execution context as an extension; actions and interceptors
/// append to it, the render path and the session parking logic consume it.
/// Serializes transparently as a JSON array so the in-context shape and the
/// parked session shape are identical.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Messages {
    entries: Vec<FlashMessage>,
}

impl Messages {
    /// Creates an empty collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a message.
    pub fn push(&mut self, message: FlashMessage) {
        self.entries.push(message);
    }

    /// Appends an info-level message.
    pub fn info(&mut self, text: impl Into<String>) {
        self.push(FlashMessage::new(MessageLevel::Info, text));
    }

    /// Appends a success-level message.
    pub fn success(&mut self, text: impl Into<String>) {
        self.push(FlashMessage::new(MessageLevel::Success, text));
    }

    /// Appends a warning-level message.
    pub fn warning(&mut self, text: impl Into<String>) {
        self.push(FlashMessage::new(MessageLevel::Warning, text));
    }

    /// Appends an error-level message.
    pub fn error(&mut self, text: impl Into<String>) {
        self.push(FlashMessage::new(MessageLevel::Error, text));
    }

    /// Returns `true` if no messages are queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the number of queued messages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns the queued messages in insertion order.
    #[must_use]
    pub fn entries(&self) -> &[FlashMessage] {
        &self.entries
    }

    /// Removes and returns all queued messages.
    pub fn drain(&mut self) -> Vec<FlashMessage> {
        std::mem::take(&mut self.entries)
    }
}

/// Settings for the message interceptor.
///
/// No knobs today; present so misspelled settings fail loudly.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MessageSettings {}

/// Constructs the interceptor for the `message` implementation id.
pub(crate) fn construct(
    _context: &FactoryContext,
    settings: serde_json::Value,
) -> Result<Arc<dyn Interceptor>, serde_json::Error> {
    let _settings: MessageSettings = serde_json::from_value(settings)?;
    Ok(Arc::new(MessageInterceptor::new()))
}

/// Interceptor that carries flash messages across requests.
#[derive(Debug, Clone, Default)]
pub struct MessageInterceptor;

impl MessageInterceptor {
    /// Creates a new message interceptor.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Moves messages parked in the session into a live collection.
    fn unpark(ctx: &mut ExecutionContext) -> Messages {
        let mut live = Messages::new();
        let parked = ctx
            .session_mut()
            .and_then(|session| session.remove(SESSION_MESSAGES_KEY));
        if let Some(value) = parked {
            match serde_json::from_value::<Vec<FlashMessage>>(value) {
                Ok(entries) => live.entries.extend(entries),
                Err(error) => {
                    warn!(request_id = %ctx.id(), %error, "Discarding unreadable parked messages");
                }
            }
        }
        live
    }

    /// Parks undelivered messages in the session for the next request.
    fn park(ctx: &mut ExecutionContext) {
        let Some(messages) = ctx.remove_extension::<Messages>() else {
            return;
        };
        if messages.is_empty() {
            return;
        }
        match serde_json::to_value(&messages) {
            Ok(value) => {
                if let Some(session) = ctx.session_mut() {
                    session.set(SESSION_MESSAGES_KEY, value);
                }
            }
            Err(error) => {
                warn!(request_id = %ctx.id(), %error, "Failed to park messages in session");
            }
        }
    }
}

impl Interceptor for MessageInterceptor {
    fn around<'a>(
        &'a self,
        ctx: &'a mut ExecutionContext,
        next: Next<'a>,
    ) -> BoxFuture<'a, ChainResult<Response>> {
        Box::pin(async move {
            let live = Self::unpark(ctx);
            ctx.set_extension(live);

            let result = next.run(ctx).await;

            // Rendered results already carried the messages; only a
            // redirect leaves them undelivered.
            if result.is_ok() && ctx.result().is_some_and(ResultDescriptor::is_redirect) {
                Self::park(ctx);
            }

            result
        })
    }
}
