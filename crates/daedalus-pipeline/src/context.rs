//! Per-request execution context.
//!
//! The [`ExecutionContext`] carries mutable state through one chain
//! traversal: the request envelope, the accumulating render data, typed
//! extensions installed by interceptors, and the chain/transaction state
//! machines. It is owned exclusively by one in-flight request and is
//! discarded at request exit.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use daedalus_core::{DatabaseConnection, RenderData, Request, RequestId, ResultDescriptor};
use serde_json::Value;

use crate::error::ProtocolViolation;

/// Per-request chain traversal state.
///
/// The executor moves the state forward as the chain runs; interceptors
/// never set it directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainState {
    /// The chain has not started yet.
    Pending,
    /// Position `i` of the chain is executing; the index one past the last
    /// interceptor is the action-and-rendering slot.
    Running(usize),
    /// The action ran and a response was produced.
    Completed,
    /// An interceptor short-circuited (or the abort flag was raised); a
    /// response was produced without the action completing the full chain.
    Aborted,
    /// A failure escaped the chain boundary.
    Failed,
}

/// Phase of the request-scoped database transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionPhase {
    /// No transaction was started by this request's chain.
    Inactive,
    /// A transaction is open and undecided.
    Active,
    /// The transaction was committed.
    Committed,
    /// The transaction was rolled back.
    RolledBack,
}

impl TransactionPhase {
    /// Returns `true` while a transaction is open and undecided.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        matches!(self, Self::Active)
    }

    /// Returns `true` once a commit-or-rollback decision was recorded.
    #[must_use]
    pub const fn is_decided(&self) -> bool {
        matches!(self, Self::Committed | Self::RolledBack)
    }
}

/// The exactly-once commit-or-rollback decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionDecision {
    /// The transaction was committed.
    Commit,
    /// The transaction was rolled back.
    Rollback,
}

/// Context that flows through one interceptor chain traversal.
///
/// Interceptors enrich the context with typed extensions (session, flash
/// messages, bound models) and expose values into the render data consumed
/// by the result renderer at the innermost point of the chain.
///
/// # Example
///
/// ```
/// use daedalus_core::Request;
/// use daedalus_pipeline::ExecutionContext;
///
/// let mut ctx = ExecutionContext::new(Request::get("/articles"));
/// ctx.expose("title", serde_json::json!("Archive"));
///
/// assert_eq!(ctx.request().uri(), "/articles");
/// assert!(ctx.render_data().contains_key("title"));
/// ```
pub struct ExecutionContext {
    /// Unique identifier for this request.
    id: RequestId,

    /// The request envelope being processed.
    request: Request,

    /// When the traversal started.
    started_at: Instant,

    /// Values exposed for result rendering, in insertion order.
    render_data: RenderData,

    /// The descriptor most recently handed to the renderer.
    result: Option<ResultDescriptor>,

    /// Chain traversal state.
    chain_state: ChainState,

    /// Raised by a short-circuiting interceptor or a terminal result.
    aborted: bool,

    /// Raised by an action that succeeded but must not be persisted.
    suppress_commit: bool,

    /// Transaction phase for the request-scoped connection.
    transaction_phase: TransactionPhase,

    /// Request-scoped database connection, if the host attached one.
    connection: Option<Arc<dyn DatabaseConnection>>,

    /// Type-erased extension data keyed by type.
    extensions: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl ExecutionContext {
    /// Creates a context for one request with a fresh request ID.
    #[must_use]
    pub fn new(request: Request) -> Self {
        Self {
            id: RequestId::new(),
            request,
            started_at: Instant::now(),
            render_data: RenderData::new(),
            result: None,
            chain_state: ChainState::Pending,
            aborted: false,
            suppress_commit: false,
            transaction_phase: TransactionPhase::Inactive,
            connection: None,
            extensions: HashMap::new(),
        }
    }

    /// Attaches a request-scoped database connection.
    ///
    /// The connection must not be shared with any other in-flight request;
    /// transaction-state ownership is exclusive to this request.
    #[must_use]
    pub fn with_connection(mut self, connection: Arc<dyn DatabaseConnection>) -> Self {
        self.connection = Some(connection);
        self
    }

    /// Returns the request ID.
    #[must_use]
    pub fn id(&self) -> RequestId {
        self.id
    }

    /// Returns the request envelope.
    #[must_use]
    pub fn request(&self) -> &Request {
        &self.request
    }

    /// Returns the request envelope mutably.
    pub fn request_mut(&mut self) -> &mut Request {
        &mut self.request
    }

    /// Returns when the traversal started.
    #[must_use]
    pub fn started_at(&self) -> Instant {
        self.started_at
    }

    /// Returns the elapsed time since the traversal started.
    #[must_use]
    pub fn elapsed(&self) -> std::time::Duration {
        self.started_at.elapsed()
    }

    /// Returns the request-scoped database connection, if any.
    #[must_use]
    pub fn connection(&self) -> Option<&Arc<dyn DatabaseConnection>> {
        self.connection.as_ref()
    }

    /// Exposes a value to the result renderer under the given key.
    ///
    /// Values render in insertion order; exposing a key twice replaces the
    /// earlier value in place.
    pub fn expose(&mut self, key: impl Into<String>, value: Value) {
        self.render_data.insert(key.into(), value);
    }

    /// Returns the values exposed so far.
    #[must_use]
    pub fn render_data(&self) -> &RenderData {
        &self.render_data
    }

    /// Returns the descriptor most recently handed to the renderer.
    ///
    /// `None` until the chain reaches its innermost point (or an
    /// interceptor renders its own descriptor).
    #[must_use]
    pub fn result(&self) -> Option<&ResultDescriptor> {
        self.result.as_ref()
    }

    /// Records the descriptor being rendered.
    pub(crate) fn set_result(&mut self, descriptor: ResultDescriptor) {
        self.result = Some(descriptor);
    }

    /// Returns the chain traversal state.
    #[must_use]
    pub fn chain_state(&self) -> ChainState {
        self.chain_state
    }

    /// Moves the chain state machine forward.
    pub(crate) fn set_chain_state(&mut self, state: ChainState) {
        self.chain_state = state;
    }

    /// Raises the abort flag.
    ///
    /// The chain still unwinds normally (so the transaction decision is
    /// made), but the final state becomes [`ChainState::Aborted`].
    pub fn abort(&mut self) {
        self.aborted = true;
    }

    /// Returns `true` once the abort flag was raised.
    #[must_use]
    pub fn aborted(&self) -> bool {
        self.aborted
    }

    /// Signals that the action succeeded but its work must not persist.
    ///
    /// The transaction interceptor rolls back instead of committing and the
    /// request still completes normally.
    pub fn suppress_commit(&mut self) {
        self.suppress_commit = true;
    }

    /// Returns `true` if commit suppression was requested.
    #[must_use]
    pub fn commit_suppressed(&self) -> bool {
        self.suppress_commit
    }

    /// Returns the transaction phase.
    #[must_use]
    pub fn transaction_phase(&self) -> TransactionPhase {
        self.transaction_phase
    }

    /// Marks the request transaction as open and undecided.
    ///
    /// Called by the transaction interceptor after it started a transaction
    /// on the request's connection.
    pub fn mark_transaction_active(&mut self) {
        self.transaction_phase = TransactionPhase::Active;
    }

    /// Records the exactly-once commit-or-rollback decision.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolViolation::TransactionAlreadyDecided`] if a
    /// decision was already recorded and
    /// [`ProtocolViolation::TransactionNotActive`] if no transaction is
    /// open.
    pub fn record_transaction_decision(
        &mut self,
        decision: TransactionDecision,
    ) -> Result<(), ProtocolViolation> {
        match self.transaction_phase {
            TransactionPhase::Active => {
                self.transaction_phase = match decision {
                    TransactionDecision::Commit => TransactionPhase::Committed,
                    TransactionDecision::Rollback => TransactionPhase::RolledBack,
                };
                Ok(())
            }
            TransactionPhase::Committed | TransactionPhase::RolledBack => {
                Err(ProtocolViolation::TransactionAlreadyDecided)
            }
            TransactionPhase::Inactive => Err(ProtocolViolation::TransactionNotActive),
        }
    }

    /// Stores a typed extension value, replacing any prior value of the
    /// same type.
    ///
    /// # Example
    ///
    /// ```
    /// use daedalus_core::Request;
    /// use daedalus_pipeline::ExecutionContext;
    ///
    /// #[derive(Debug, PartialEq)]
    /// struct PageSize(usize);
    ///
    /// let mut ctx = ExecutionContext::new(Request::get("/"));
    /// ctx.set_extension(PageSize(25));
    ///
    /// assert_eq!(ctx.get_extension::<PageSize>(), Some(&PageSize(25)));
    /// ```
    pub fn set_extension<T: Send + Sync + 'static>(&mut self, value: T) {
        self.extensions.insert(TypeId::of::<T>(), Box::new(value));
    }

    /// Retrieves a typed extension value.
    #[must_use]
    pub fn get_extension<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.extensions
            .get(&TypeId::of::<T>())
            .and_then(|v| v.downcast_ref())
    }

    /// Retrieves a typed extension value mutably.
    pub fn get_extension_mut<T: Send + Sync + 'static>(&mut self) -> Option<&mut T> {
        self.extensions
            .get_mut(&TypeId::of::<T>())
            .and_then(|v| v.downcast_mut())
    }

    /// Removes and returns a typed extension value.
    pub fn remove_extension<T: Send + Sync + 'static>(&mut self) -> Option<T> {
        self.extensions
            .remove(&TypeId::of::<T>())
            .and_then(|v| v.downcast().ok())
            .map(|b| *b)
    }

    /// Checks whether an extension of the given type exists.
    #[must_use]
    pub fn has_extension<T: Send + Sync + 'static>(&self) -> bool {
        self.extensions.contains_key(&TypeId::of::<T>())
    }

    /// Returns the context session, if the session interceptor attached one.
    #[must_use]
    pub fn session(&self) -> Option<&daedalus_core::Session> {
        self.get_extension::<daedalus_core::Session>()
    }

    /// Returns the context session mutably.
    pub fn session_mut(&mut self) -> Option<&mut daedalus_core::Session> {
        self.get_extension_mut::<daedalus_core::Session>()
    }
}

impl std::fmt::Debug for ExecutionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutionContext")
            .field("id", &self.id)
            .field("request", &self.request)
            .field("chain_state", &self.chain_state)
            .field("transaction_phase", &self.transaction_phase)
            .field("aborted", &self.aborted)
            .field("suppress_commit", &self.suppress_commit)
            .field("has_connection", &self.connection.is_some())
            .finish_non_exhaustive()
    }
}
