//! The action collaborator invoked at the innermost point of the chain.
//!
//! Actions are opaque units of business logic. The chain invokes exactly
//! one action per request, after every interceptor's "before" phase and
//! before result rendering. An action returns a [`ResultDescriptor`] naming
//! what to render; it never renders itself.

use std::future::Future;

use daedalus_core::{BoxFuture, DaedalusResult, RenderData, ResultDescriptor};

use crate::context::ExecutionContext;

/// A unit of business logic executed at the innermost point of the chain.
///
/// # Example
///
/// ```
/// use daedalus_core::{BoxFuture, DaedalusResult, ResultDescriptor};
/// use daedalus_pipeline::{Action, ExecutionContext};
///
/// struct ShowArticle;
///
/// impl Action for ShowArticle {
///     fn execute<'a>(
///         &'a self,
///         ctx: &'a mut ExecutionContext,
///     ) -> BoxFuture<'a, DaedalusResult<ResultDescriptor>> {
///         Box::pin(async move {
///             ctx.expose("title", serde_json::json!("Hello"));
///             Ok(ResultDescriptor::view("article"))
///         })
///     }
/// }
/// ```
pub trait Action: Send + Sync + 'static {
    /// Executes the action against the request context.
    ///
    /// A successful return names the result to render. An action that
    /// succeeded but must not persist its database work calls
    /// [`ExecutionContext::suppress_commit`] before returning.
    fn execute<'a>(
        &'a self,
        ctx: &'a mut ExecutionContext,
    ) -> BoxFuture<'a, DaedalusResult<ResultDescriptor>>;

    /// Opts the action into render-data exposure.
    ///
    /// Actions that want a named key-value snapshot merged into the render
    /// data implement [`DataProvider`] and return `Some(self)` here. The
    /// default opts out; there is no runtime introspection.
    fn data_provider(&self) -> Option<&dyn DataProvider> {
        None
    }
}

/// Capability for actions that expose a snapshot of values to the renderer.
pub trait DataProvider: Send + Sync {
    /// Returns the key-value snapshot to merge into the render data.
    fn expose(&self) -> RenderData;
}

/// An action built from an async closure.
///
/// # Example
///
/// ```
/// use daedalus_core::ResultDescriptor;
/// use daedalus_pipeline::FnAction;
///
/// let action = FnAction::new(|_ctx| {
///     Box::pin(async { Ok(ResultDescriptor::view("index")) })
/// });
/// # let _ = action;
/// ```
pub struct FnAction<F> {
    func: F,
}

impl<F> FnAction<F>
where
    F: for<'a> Fn(&'a mut ExecutionContext) -> BoxFuture<'a, DaedalusResult<ResultDescriptor>>
        + Send
        + Sync
        + 'static,
{
    /// Creates an action from the given closure.
    pub const fn new(func: F) -> Self {
        Self { func }
    }
}

impl<F> Action for FnAction<F>
where
    F: for<'a> Fn(&'a mut ExecutionContext) -> BoxFuture<'a, DaedalusResult<ResultDescriptor>>
        + Send
        + Sync
        + 'static,
{
    fn execute<'a>(
        &'a self,
        ctx: &'a mut ExecutionContext,
    ) -> BoxFuture<'a, DaedalusResult<ResultDescriptor>> {
        (self.func)(ctx)
    }
}

/// Boxes a plain async function as an action future.
///
/// Convenience for call sites that want to write `async` blocks without
/// spelling out the pin-box.
pub fn boxed<'a, F>(future: F) -> BoxFuture<'a, DaedalusResult<ResultDescriptor>>
where
    F: Future<Output = DaedalusResult<ResultDescriptor>> + Send + 'a,
{
    Box::pin(future)
}

#[cfg(test)]
mod tests {
    use super::*;
    use daedalus_core::Request;

    #[tokio::test]
    async fn test_fn_action_executes() {
        let action = FnAction::new(|ctx: &mut ExecutionContext| {
            boxed(async move {
                ctx.expose("answer", serde_json::json!(42));
                Ok(ResultDescriptor::json())
            })
        });

        let mut ctx = ExecutionContext::new(Request::get("/"));
        let descriptor = action.execute(&mut ctx).await.unwrap();
        assert_eq!(descriptor, ResultDescriptor::json());
        assert_eq!(ctx.render_data()["answer"], serde_json::json!(42));
    }

    #[test]
    fn test_actions_opt_out_of_data_exposure_by_default() {
        struct Noop;

        impl Action for Noop {
            fn execute<'a>(
                &'a self,
                _ctx: &'a mut ExecutionContext,
            ) -> BoxFuture<'a, DaedalusResult<ResultDescriptor>> {
                Box::pin(async { Ok(ResultDescriptor::none()) })
            }
        }

        assert!(Noop.data_provider().is_none());
    }
}
