//! # Daedalus
//!
//! **Declarative interceptor chains and request processing for MVC applications**
//!
//! Daedalus is the request-processing core of an MVC web framework:
//!
//! - 🧩 **Declarative Chains** – Routes map to named interceptor stacks in configuration
//! - 🔁 **Compile Once, Run Everywhere** – Chains are resolved, deduplicated, and
//!   constructed ahead of time, then shared across requests
//! - 🛡️ **Built-in Interceptors** – Sessions, flash messages, error boundary,
//!   transactions, authentication, model binding, and validation
//! - ⚙️ **Layered Settings** – Application-wide interceptor settings with
//!   per-route overrides
//! - 🔌 **Extensible** – Applications register their own interceptor
//!   implementations and validators
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use daedalus::prelude::*;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mode = Mode::from_env()?;
//!     let config = ConfigLoader::new()
//!         .with_file("conf/daedalus.toml")?
//!         .with_mode_file("conf", mode)?
//!         .with_env_prefix("DAEDALUS")
//!         .load()?;
//!
//!     let chains = RouteChainCompiler::from_config(&config, FactoryContext::new(mode))
//!         .compile()?;
//!
//!     let executor = ChainExecutor::new(renderer);
//!     let chain = Arc::clone(chains.chain_for("/wishlist"));
//!     let mut ctx = ExecutionContext::new(request);
//!     let response = executor.execute(chain, action, &mut ctx).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! Each route runs its compiled chain around the action, earlier positions
//! wrapping everything after them:
//!
//! ```text
//! Request → Session → Message → Error → Transaction → Model → Validation → Action
//!                                                                            ↓
//! Response ← Session ← Message ← Error ← Transaction ←──────── Render ←─────┘
//! ```

#![doc(html_root_url = "https://docs.rs/daedalus/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Re-export core types
pub use daedalus_core as core;

// Re-export configuration types
pub use daedalus_config as config;

// Re-export chain compilation and execution types
pub use daedalus_pipeline as pipeline;

/// Prelude module for convenient imports.
///
/// # Example
///
/// ```rust,ignore
/// use daedalus::prelude::*;
/// ```
pub mod prelude {
    pub use daedalus_core::{
        BoxFuture, DaedalusError, DaedalusResult, DatabaseConnection, FieldErrors, ModelBundle,
        Request, RequestId, Response, ResultDescriptor, ResultRenderer, Session, Validator,
    };

    // Re-export configuration types
    pub use daedalus_config::{ConfigLoader, DaedalusConfig, Mode};

    // Re-export chain compilation types
    pub use daedalus_pipeline::{
        ChainSet, ChainSetHandle, FactoryContext, InterceptorFactory, RouteChainCompiler,
    };

    // Re-export chain execution types
    pub use daedalus_pipeline::{
        Action, ChainExecutor, ChainState, ExecutionContext, Interceptor, Next,
    };

    // Re-export the extensions the built-in interceptors publish
    pub use daedalus_pipeline::interceptors::{AuthUser, Messages, Params, ValidationFailures};
}
