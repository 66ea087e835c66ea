//! Interceptor trait and nested chain execution.
//!
//! A compiled chain executes as a nested "around" invocation, not a flat
//! sequence: interceptor `i` receives a [`Next`] continuation representing
//! "interceptors `i+1..n`, then the action, then result rendering", and
//! decides whether to proceed or to short-circuit with its own result.
//! Interceptors registered earlier therefore see both the before and after
//! phase of everything nested inside them.
//!
//! # Example
//!
//! ```ignore
//! use daedalus_pipeline::{ChainResult, ExecutionContext, Interceptor, Next};
//! use daedalus_core::{BoxFuture, Response};
//!
//! struct TimingInterceptor;
//!
//! impl Interceptor for TimingInterceptor {
//!     fn around<'a>(
//!         &'a self,
//!         ctx: &'a mut ExecutionContext,
//!         next: Next<'a>,
//!     ) -> BoxFuture<'a, ChainResult<Response>> {
//!         Box::pin(async move {
//!             let response = next.run(ctx).await;
//!             tracing::debug!(elapsed = ?ctx.elapsed(), "request finished");
//!             response
//!         })
//!     }
//! }
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use daedalus_core::{BoxFuture, Response, ResultDescriptor, ResultRenderer};

use crate::action::Action;
use crate::compile::RouteChain;
use crate::context::{ChainState, ExecutionContext};
use crate::error::{ChainResult, ProtocolViolation};
use crate::interceptors::message::Messages;

/// A chain-of-responsibility unit wrapping the action with before/after
/// behavior.
///
/// # Invariants
///
/// - An interceptor consumes its [`Next`] exactly once: either by
///   proceeding ([`Next::run`]) or by short-circuiting
///   ([`Next::finish`]). Move semantics enforce this at compile time; the
///   run's entry ledger backs it at runtime and fails fast with
///   [`ProtocolViolation::DoubleInvocation`].
/// - An interceptor never reorders siblings; it only chooses to proceed or
///   stop at its own position.
/// - Request-level failures from downstream must propagate unchanged
///   unless the interceptor is a declared failure boundary.
pub trait Interceptor: Send + Sync + 'static {
    /// Wraps the downstream chain.
    fn around<'a>(
        &'a self,
        ctx: &'a mut ExecutionContext,
        next: Next<'a>,
    ) -> BoxFuture<'a, ChainResult<Response>>;
}

impl std::fmt::Debug for dyn Interceptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("dyn Interceptor")
    }
}

/// The single-use continuation handed to each interceptor.
///
/// Consuming it with [`Next::run`] executes the rest of the chain;
/// consuming it with [`Next::finish`] renders a result at this position
/// instead, skipping downstream interceptors and the action.
pub struct Next<'a> {
    /// The chain run this continuation belongs to.
    run: &'a ChainRun,
    /// The chain position this continuation enters.
    index: usize,
}

impl<'a> Next<'a> {
    pub(crate) fn new(run: &'a ChainRun, index: usize) -> Self {
        Self { run, index }
    }

    /// Invokes the rest of the chain: downstream interceptors, the action,
    /// and result rendering.
    ///
    /// Consumes `self` so the continuation can only be invoked once.
    ///
    /// # Errors
    ///
    /// Propagates downstream failures and protocol violations unchanged.
    pub async fn run(self, ctx: &mut ExecutionContext) -> ChainResult<Response> {
        self.run.invoke_from(ctx, self.index).await
    }

    /// Returns a handle for rendering a result at this chain position.
    ///
    /// Taken before the continuation is consumed, so a failure boundary can
    /// still render a fallback result after [`Next::run`] reported a
    /// downstream failure.
    #[must_use]
    pub fn render_handle(&self) -> RenderHandle<'a> {
        RenderHandle { run: self.run }
    }

    /// Short-circuits the chain: renders `descriptor` at this position and
    /// raises the abort flag.
    ///
    /// Downstream interceptors and the action never run; interceptors
    /// positioned earlier still see the produced response on their way out.
    ///
    /// # Errors
    ///
    /// Returns a request-level failure if rendering fails.
    pub async fn finish(
        self,
        ctx: &mut ExecutionContext,
        descriptor: ResultDescriptor,
    ) -> ChainResult<Response> {
        ctx.abort();
        self.run.render(ctx, descriptor).await
    }
}

/// Renders a result through the run's renderer, outside the normal
/// innermost rendering point.
///
/// Obtained from [`Next::render_handle`]; used by the error boundary (and
/// any short-circuiting interceptor) to produce a response of its own.
pub struct RenderHandle<'a> {
    run: &'a ChainRun,
}

impl<'a> RenderHandle<'a> {
    /// Renders the descriptor with the current context's render data.
    ///
    /// # Errors
    ///
    /// Returns a request-level failure if rendering fails.
    pub async fn render(
        self,
        ctx: &mut ExecutionContext,
        descriptor: ResultDescriptor,
    ) -> ChainResult<Response> {
        self.run.render(ctx, descriptor).await
    }
}

/// One request's traversal of a compiled chain.
///
/// Owns the shared chain, the action, and the renderer for the duration of
/// the request, plus the per-position entry ledger that backs the
/// single-use continuation guarantee.
pub struct ChainRun {
    chain: Arc<RouteChain>,
    action: Arc<dyn Action>,
    renderer: Arc<dyn ResultRenderer>,
    /// One slot per interceptor plus one for the action-and-rendering step.
    entered: Vec<AtomicBool>,
}

impl ChainRun {
    pub(crate) fn new(
        chain: Arc<RouteChain>,
        action: Arc<dyn Action>,
        renderer: Arc<dyn ResultRenderer>,
    ) -> Self {
        let entered = (0..=chain.len()).map(|_| AtomicBool::new(false)).collect();
        Self {
            chain,
            action,
            renderer,
            entered,
        }
    }

    /// Returns `true` once the action-and-rendering slot was entered.
    pub(crate) fn action_entered(&self) -> bool {
        self.entered
            .last()
            .is_some_and(|slot| slot.load(Ordering::SeqCst))
    }

    /// Enters the chain at `index`: interceptor positions `0..n`, the
    /// action-and-rendering step at `n`.
    pub(crate) fn invoke_from<'a>(
        &'a self,
        ctx: &'a mut ExecutionContext,
        index: usize,
    ) -> BoxFuture<'a, ChainResult<Response>> {
        Box::pin(async move {
            if self.entered[index].swap(true, Ordering::SeqCst) {
                let violator = if index == 0 {
                    "<chain entry>".to_string()
                } else {
                    self.chain.interceptors()[index - 1].name().to_string()
                };
                tracing::error!(
                    request_id = %ctx.id(),
                    interceptor = %violator,
                    "continuation invoked twice"
                );
                return Err(ProtocolViolation::double_invocation(violator).into());
            }
            ctx.set_chain_state(ChainState::Running(index));

            if index < self.chain.len() {
                let entry = &self.chain.interceptors()[index];
                tracing::trace!(interceptor = entry.name(), position = index, "entering interceptor");
                entry.instance().around(ctx, Next::new(self, index + 1)).await
            } else {
                let descriptor = self.action.execute(ctx).await?;
                if let Some(provider) = self.action.data_provider() {
                    for (key, value) in provider.expose() {
                        ctx.expose(key, value);
                    }
                }
                self.render(ctx, descriptor).await
            }
        })
    }

    /// Renders a descriptor with the context's accumulated render data.
    ///
    /// Undelivered flash messages are exposed under the `messages` key for
    /// non-redirect results; redirect results leave them to the message
    /// interceptor, which parks them in the session for the next request.
    pub(crate) fn render<'a>(
        &'a self,
        ctx: &'a mut ExecutionContext,
        descriptor: ResultDescriptor,
    ) -> BoxFuture<'a, ChainResult<Response>> {
        Box::pin(async move {
            ctx.set_result(descriptor.clone());
            let mut data = ctx.render_data().clone();
            if !descriptor.is_redirect() {
                if let Some(messages) = ctx.get_extension::<Messages>() {
                    if !messages.is_empty() {
                        if let Ok(value) = serde_json::to_value(messages) {
                            data.insert("messages".to_string(), value);
                        }
                    }
                }
            }
            let response = self.renderer.render(&descriptor, &data).await?;
            Ok(response)
        })
    }
}

/// Drives compiled chains for inbound requests.
///
/// Holds the process-wide result renderer; everything else is per-request.
pub struct ChainExecutor {
    renderer: Arc<dyn ResultRenderer>,
}

impl ChainExecutor {
    /// Creates an executor rendering through the given collaborator.
    #[must_use]
    pub fn new(renderer: Arc<dyn ResultRenderer>) -> Self {
        Self { renderer }
    }

    /// Executes one request through a compiled chain.
    ///
    /// On return the context's [`ChainState`] is final: `Completed` when
    /// the action slot ran and produced a response, `Aborted` when an
    /// interceptor short-circuited (or the abort flag was raised), and
    /// `Failed` when a failure escaped the chain boundary. A transaction
    /// left undecided is logged; forced rollback is the connection
    /// provider's responsibility.
    ///
    /// # Errors
    ///
    /// Returns the failure that escaped the chain boundary: a request-level
    /// failure when no error boundary was configured for this route, or a
    /// protocol violation.
    pub async fn execute(
        &self,
        chain: Arc<RouteChain>,
        action: Arc<dyn Action>,
        ctx: &mut ExecutionContext,
    ) -> ChainResult<Response> {
        let run = ChainRun::new(chain, action, Arc::clone(&self.renderer));
        tracing::debug!(
            request_id = %ctx.id(),
            route = run.chain.route_key(),
            interceptors = run.chain.len(),
            "chain run starting"
        );

        let result = run.invoke_from(ctx, 0).await;

        let state = match &result {
            Err(_) => ChainState::Failed,
            Ok(_) if ctx.aborted() || !run.action_entered() => ChainState::Aborted,
            Ok(_) => ChainState::Completed,
        };
        ctx.set_chain_state(state);

        if ctx.transaction_phase().is_active() {
            tracing::warn!(
                request_id = %ctx.id(),
                "transaction undecided at chain exit; the connection provider must roll it back"
            );
        }

        match &result {
            Ok(response) => tracing::debug!(
                request_id = %ctx.id(),
                status = %response.status(),
                state = ?state,
                elapsed_ms = ctx.elapsed().as_millis() as u64,
                "chain run finished"
            ),
            Err(err) => tracing::error!(
                request_id = %ctx.id(),
                error = %err,
                "chain run failed"
            ),
        }
        result
    }
}

/// An interceptor built from an async closure.
///
/// # Example
///
/// ```ignore
/// let interceptor = FnInterceptor::new(|ctx, next| {
///     Box::pin(async move {
///         tracing::debug!("before");
///         let response = next.run(ctx).await;
///         tracing::debug!("after");
///         response
///     })
/// });
/// ```
pub struct FnInterceptor<F> {
    func: F,
}

impl<F> FnInterceptor<F>
where
    F: for<'a> Fn(&'a mut ExecutionContext, Next<'a>) -> BoxFuture<'a, ChainResult<Response>>
        + Send
        + Sync
        + 'static,
{
    /// Creates an interceptor from the given closure.
    pub const fn new(func: F) -> Self {
        Self { func }
    }
}

impl<F> Interceptor for FnInterceptor<F>
where
    F: for<'a> Fn(&'a mut ExecutionContext, Next<'a>) -> BoxFuture<'a, ChainResult<Response>>
        + Send
        + Sync
        + 'static,
{
    fn around<'a>(
        &'a self,
        ctx: &'a mut ExecutionContext,
        next: Next<'a>,
    ) -> BoxFuture<'a, ChainResult<Response>> {
        (self.func)(ctx, next)
    }
}
