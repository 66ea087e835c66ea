//! Built-in interceptors.
//!
//! These are the interceptor kinds the framework declares out of the box
//! and the factory can construct. The default stacks wire them in this
//! order:
//!
//! ```text
//! defaultStack = [session, message, error, transaction, model, validation]
//! authStack    = [session, message, error, transaction, auth, model, validation]
//! ```
//!
//! Earlier positions wrap everything after them, so the session is
//! available to every other interceptor, the error boundary catches
//! failures from the transaction inward, and the transaction covers the
//! action and result rendering.

pub mod auth;
pub mod error_boundary;
pub mod message;
pub mod model;
pub mod params;
pub mod session;
pub mod transaction;
pub mod validation;

pub use auth::{AuthInterceptor, AuthUser};
pub use error_boundary::{ErrorBoundaryInterceptor, FallbackResultKind};
pub use message::{FlashMessage, MessageInterceptor, MessageLevel, Messages};
pub use model::ModelInterceptor;
pub use params::{Params, ParamsInterceptor};
pub use session::SessionInterceptor;
pub use transaction::TransactionInterceptor;
pub use validation::{ValidationFailures, ValidationInterceptor};
