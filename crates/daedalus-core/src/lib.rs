//! # Daedalus Core
//!
//! Core types and collaborator contracts for the Daedalus web framework.
//!
//! This crate provides the foundational types used throughout Daedalus:
//!
//! - [`Request`] / [`Response`] - Framework request and response envelopes
//! - [`RequestId`] - UUID v7 request identifier
//! - [`ResultDescriptor`] - Declarative action results consumed by renderers
//! - [`ResultRenderer`] - Rendering contract at the view boundary
//! - [`DatabaseConnection`] - Transactional database contract
//! - [`Validator`] / [`ModelBundle`] - Model validation contract
//! - [`DaedalusError`] - Standard error type

#![doc(html_root_url = "https://docs.rs/daedalus-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

use std::future::Future;
use std::pin::Pin;

mod database;
mod error;
pub mod fixtures;
mod model;
mod request;
mod response;
mod result;
mod session;

pub use database::{DatabaseConnection, DatabaseError, ResultSet, Row};
pub use error::{DaedalusError, DaedalusResult, ErrorCategory, FieldErrors};
pub use model::{ModelBundle, Validator};
pub use request::{Request, RequestId};
pub use response::Response;
pub use result::{RenderData, ResultDescriptor, ResultRenderer};
pub use session::Session;

/// A boxed future, as returned by collaborator trait methods.
///
/// Collaborator traits ([`DatabaseConnection`], [`ResultRenderer`]) are used
/// as trait objects, so their async methods return boxed futures instead of
/// `impl Future`.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;
