//! Test fixtures for chain execution.
//!
//! Scripted actions, recording interceptors, and context builders for
//! exercising chains deterministically, in the same spirit as
//! [`daedalus_core::fixtures`].

use std::sync::Arc;

use daedalus_core::fixtures::plain_renderer;
use daedalus_core::{
    BoxFuture, DaedalusError, DaedalusResult, FieldErrors, ModelBundle, RenderData, Request,
    Response, ResultDescriptor, Validator,
};
use parking_lot::Mutex;

use crate::action::{Action, DataProvider};
use crate::chain::{ChainExecutor, Interceptor, Next};
use crate::compile::{CompiledInterceptor, RouteChain};
use crate::context::ExecutionContext;
use crate::error::ChainResult;

/// An action driven by a synchronous script.
pub struct ScriptedAction {
    script: Box<dyn Fn(&mut ExecutionContext) -> DaedalusResult<ResultDescriptor> + Send + Sync>,
}

impl Action for ScriptedAction {
    fn execute<'a>(
        &'a self,
        ctx: &'a mut ExecutionContext,
    ) -> BoxFuture<'a, DaedalusResult<ResultDescriptor>> {
        Box::pin(async move { (self.script)(ctx) })
    }
}

/// Creates an action from a synchronous script.
pub fn scripted_action<F>(script: F) -> Arc<dyn Action>
where
    F: Fn(&mut ExecutionContext) -> DaedalusResult<ResultDescriptor> + Send + Sync + 'static,
{
    Arc::new(ScriptedAction {
        script: Box::new(script),
    })
}

/// An action that renders the given view.
pub fn ok_action(view: &str) -> Arc<dyn Action> {
    let view = view.to_string();
    scripted_action(move |_ctx| Ok(ResultDescriptor::view(view.clone())))
}

/// An action that fails with an internal error.
pub fn failing_action(message: &str) -> Arc<dyn Action> {
    let message = message.to_string();
    scripted_action(move |_ctx| Err(DaedalusError::internal(message.clone())))
}

/// An action that returns a redirect result.
pub fn redirecting_action(location: &str) -> Arc<dyn Action> {
    let location = location.to_string();
    scripted_action(move |_ctx| Ok(ResultDescriptor::redirect(location.clone())))
}

/// An action that succeeds but suppresses the transaction commit.
pub fn suppressing_action(view: &str) -> Arc<dyn Action> {
    let view = view.to_string();
    scripted_action(move |ctx| {
        ctx.suppress_commit();
        Ok(ResultDescriptor::view(view.clone()))
    })
}

/// An action exposing a key-value snapshot through [`DataProvider`].
pub struct ExposingAction {
    view: String,
    data: RenderData,
}

impl Action for ExposingAction {
    fn execute<'a>(
        &'a self,
        _ctx: &'a mut ExecutionContext,
    ) -> BoxFuture<'a, DaedalusResult<ResultDescriptor>> {
        Box::pin(async move { Ok(ResultDescriptor::view(self.view.clone())) })
    }

    fn data_provider(&self) -> Option<&dyn DataProvider> {
        Some(self)
    }
}

impl DataProvider for ExposingAction {
    fn expose(&self) -> RenderData {
        self.data.clone()
    }
}

/// Creates an action that exposes one key-value pair via [`DataProvider`].
pub fn exposing_action(view: &str, key: &str, value: serde_json::Value) -> Arc<dyn Action> {
    let mut data = RenderData::new();
    data.insert(key.to_string(), value);
    Arc::new(ExposingAction {
        view: view.to_string(),
        data,
    })
}

/// An interceptor recording its entry and exit into a shared log.
pub struct RecordingInterceptor {
    name: &'static str,
    log: Arc<Mutex<Vec<String>>>,
}

impl Interceptor for RecordingInterceptor {
    fn around<'a>(
        &'a self,
        ctx: &'a mut ExecutionContext,
        next: Next<'a>,
    ) -> BoxFuture<'a, ChainResult<Response>> {
        Box::pin(async move {
            self.log.lock().push(format!("enter:{}", self.name));
            let result = next.run(ctx).await;
            self.log.lock().push(format!("exit:{}", self.name));
            result
        })
    }
}

/// Creates a recording interceptor with its own log.
pub fn recording_interceptor(
    name: &'static str,
) -> (Arc<dyn Interceptor>, Arc<Mutex<Vec<String>>>) {
    let log = Arc::new(Mutex::new(Vec::new()));
    (
        recording_interceptor_with_log(name, Arc::clone(&log)),
        log,
    )
}

/// Creates a recording interceptor appending to an existing log.
pub fn recording_interceptor_with_log(
    name: &'static str,
    log: Arc<Mutex<Vec<String>>>,
) -> Arc<dyn Interceptor> {
    Arc::new(RecordingInterceptor { name, log })
}

/// A validator requiring one non-empty field on the bundle.
struct RequireField {
    field: &'static str,
}

impl Validator for RequireField {
    fn validate(&self, bundle: &ModelBundle) -> Result<(), FieldErrors> {
        let present = bundle
            .field(self.field)
            .is_some_and(|value| !value.is_null() && value != &serde_json::Value::from(""));
        if present {
            Ok(())
        } else {
            let mut errors = FieldErrors::new();
            errors.add(self.field, format!("{} is required", self.field));
            Err(errors)
        }
    }
}

/// Creates a validator that rejects bundles missing the given field.
pub fn require_field_validator(field: &'static str) -> Arc<dyn Validator> {
    Arc::new(RequireField { field })
}

/// Creates a context for a plain `GET /test` request.
#[must_use]
pub fn test_context() -> ExecutionContext {
    ExecutionContext::new(Request::get("/test"))
}

/// Creates an executor rendering through the plain test renderer.
#[must_use]
pub fn executor() -> ChainExecutor {
    ChainExecutor::new(plain_renderer())
}

/// Wraps an instance as a compiled chain position.
#[must_use]
pub fn compiled_entry(name: &str, instance: Arc<dyn Interceptor>) -> CompiledInterceptor {
    CompiledInterceptor::new(name, name, daedalus_config::SettingsMap::new(), instance)
}

/// Builds a chain from compiled positions.
#[must_use]
pub fn chain_of(route: &str, entries: Vec<CompiledInterceptor>) -> Arc<RouteChain> {
    Arc::new(RouteChain::new(route, entries))
}
