//! # Daedalus Pipeline
//!
//! Interceptor chain compilation and execution for the Daedalus web
//! framework.
//!
//! The crate has two halves:
//!
//! - **Compile time**: [`RouteChainCompiler`] turns a
//!   [`DaedalusConfig`](daedalus_config::DaedalusConfig) — interceptor
//!   declarations, named stacks, and route mappings — into an immutable
//!   [`ChainSet`] of per-route chains. Stack tokens are expanded, duplicate
//!   interceptors deduplicated to their first occurrence, settings merged
//!   (static < application < route), and every interceptor instantiated
//!   through the [`InterceptorFactory`]. Configuration mistakes surface
//!   here as [`CompileError`]s, never at request time.
//!
//! - **Request time**: [`ChainExecutor`] runs one request through its
//!   compiled chain. Each [`Interceptor`] wraps everything after it via a
//!   single-use [`Next`] continuation, the action executes at the innermost
//!   position, and the result is rendered inside the chain so interceptors
//!   observe render failures too. The per-request [`ExecutionContext`]
//!   carries the request envelope, typed extensions, render data, and
//!   transaction state.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use daedalus_config::DaedalusConfig;
//! use daedalus_core::fixtures::plain_renderer;
//! use daedalus_core::Request;
//! use daedalus_pipeline::fixtures::ok_action;
//! use daedalus_pipeline::{ChainExecutor, ExecutionContext, FactoryContext, RouteChainCompiler};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = DaedalusConfig::builder()
//!     .route("/wishlist", &["defaultStack"])
//!     .build();
//!
//! let chains = RouteChainCompiler::from_config(&config, FactoryContext::default()).compile()?;
//! let executor = ChainExecutor::new(plain_renderer());
//!
//! let mut ctx = ExecutionContext::new(Request::get("/wishlist"));
//! let chain = Arc::clone(chains.chain_for("/wishlist"));
//! let response = executor
//!     .execute(chain, ok_action("wishlist/index"), &mut ctx)
//!     .await?;
//! # Ok(())
//! # }
//! ```
//!
//! The built-in interceptors and the default stacks wiring them live in
//! [`interceptors`].

#![doc(html_root_url = "https://docs.rs/daedalus-pipeline/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod action;
mod chain;
mod compile;
mod context;
mod error;
mod factory;
pub mod fixtures;
pub mod interceptors;
mod registry;
mod settings;
mod stacks;

pub use action::{boxed, Action, DataProvider, FnAction};
pub use chain::{ChainExecutor, FnInterceptor, Interceptor, Next, RenderHandle};
pub use compile::{ChainSet, ChainSetHandle, CompiledInterceptor, RouteChain, RouteChainCompiler};
pub use context::{ChainState, ExecutionContext, TransactionDecision, TransactionPhase};
pub use error::{ChainError, ChainResult, CompileError, ProtocolViolation};
pub use factory::{ConstructorFn, FactoryContext, InterceptorFactory};
pub use registry::{InterceptorDescriptor, InterceptorRegistry};
pub use settings::SettingsMerger;
pub use stacks::StackResolver;

pub use daedalus_core::BoxFuture;
