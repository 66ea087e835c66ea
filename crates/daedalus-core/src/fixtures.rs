//! Test fixtures for Daedalus development and testing.
//!
//! This module provides pre-built collaborator doubles that can be used in
//! tests across the Daedalus codebase: a recording database connection and
//! a pair of renderers.
//!
//! # Example
//!
//! ```
//! use daedalus_core::fixtures;
//!
//! let connection = fixtures::recording_connection();
//! assert_eq!(connection.begin_count(), 0);
//! assert!(!connection.in_transaction());
//! ```

use crate::database::{DatabaseConnection, DatabaseError, ResultSet};
use crate::error::{DaedalusError, DaedalusResult};
use crate::response::Response;
use crate::result::{RenderData, ResultDescriptor, ResultRenderer};
use crate::BoxFuture;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A transaction-surface call recorded by [`RecordingConnection`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TxEvent {
    /// A transaction was opened.
    Begin,
    /// A commit was attempted.
    Commit,
    /// A rollback was performed.
    Rollback,
    /// A statement was executed.
    Query(String),
}

/// A [`DatabaseConnection`] that records every call for assertions.
///
/// The fixture mimics driver transaction semantics: a second `begin` while
/// a transaction is active returns `Ok(false)` and records nothing, and on
/// an [`errored`](RecordingConnection::errored) connection `commit` returns
/// `Ok(false)` because the driver already rolled the transaction back.
pub struct RecordingConnection {
    events: Mutex<Vec<TxEvent>>,
    active: AtomicBool,
    errored: bool,
    failing_commit: bool,
}

impl RecordingConnection {
    /// Creates a well-behaved connection.
    #[must_use]
    pub fn new() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
            active: AtomicBool::new(false),
            errored: false,
            failing_commit: false,
        }
    }

    /// Creates a connection whose transaction was rolled back by the
    /// driver after a statement failure, so `commit` returns `Ok(false)`.
    #[must_use]
    pub fn errored() -> Self {
        Self {
            errored: true,
            ..Self::new()
        }
    }

    /// Creates a connection whose `commit` call itself fails.
    #[must_use]
    pub fn failing_commit() -> Self {
        Self {
            failing_commit: true,
            ..Self::new()
        }
    }

    /// Returns the recorded calls in order.
    #[must_use]
    pub fn events(&self) -> Vec<TxEvent> {
        self.events.lock().clone()
    }

    /// Returns how many transactions were actually opened.
    #[must_use]
    pub fn begin_count(&self) -> usize {
        self.count(|event| matches!(event, TxEvent::Begin))
    }

    /// Returns how many commits were attempted.
    #[must_use]
    pub fn commit_count(&self) -> usize {
        self.count(|event| matches!(event, TxEvent::Commit))
    }

    /// Returns how many rollbacks were performed.
    #[must_use]
    pub fn rollback_count(&self) -> usize {
        self.count(|event| matches!(event, TxEvent::Rollback))
    }

    /// Returns `true` while a transaction is open.
    #[must_use]
    pub fn in_transaction(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    fn count(&self, predicate: impl Fn(&TxEvent) -> bool) -> usize {
        self.events.lock().iter().filter(|e| predicate(e)).count()
    }

    fn record(&self, event: TxEvent) {
        self.events.lock().push(event);
    }
}

impl Default for RecordingConnection {
    fn default() -> Self {
        Self::new()
    }
}

impl DatabaseConnection for RecordingConnection {
    fn begin<'a>(&'a self) -> BoxFuture<'a, Result<bool, DatabaseError>> {
        Box::pin(async move {
            if self.active.swap(true, Ordering::SeqCst) {
                return Ok(false);
            }
            self.record(TxEvent::Begin);
            Ok(true)
        })
    }

    fn commit<'a>(&'a self) -> BoxFuture<'a, Result<bool, DatabaseError>> {
        Box::pin(async move {
            self.record(TxEvent::Commit);
            if self.failing_commit {
                // Commit failed outright; the transaction stays open so the
                // caller can still roll it back.
                return Err(DatabaseError::transaction("Commit failed"));
            }
            self.active.store(false, Ordering::SeqCst);
            Ok(!self.errored)
        })
    }

    fn rollback<'a>(&'a self) -> BoxFuture<'a, Result<(), DatabaseError>> {
        Box::pin(async move {
            self.record(TxEvent::Rollback);
            self.active.store(false, Ordering::SeqCst);
            Ok(())
        })
    }

    fn query<'a>(
        &'a self,
        statement: &'a str,
        _params: &'a [serde_json::Value],
    ) -> BoxFuture<'a, Result<ResultSet, DatabaseError>> {
        Box::pin(async move {
            self.record(TxEvent::Query(statement.to_string()));
            Ok(ResultSet::default())
        })
    }
}

/// A [`ResultRenderer`] that renders every descriptor without templates.
///
/// View results become an HTML body naming the view and carrying the render
/// data as JSON, so tests can assert on both.
pub struct PlainRenderer;

impl ResultRenderer for PlainRenderer {
    fn render<'a>(
        &'a self,
        descriptor: &'a ResultDescriptor,
        data: &'a RenderData,
    ) -> BoxFuture<'a, DaedalusResult<Response>> {
        Box::pin(async move {
            match descriptor {
                ResultDescriptor::View { view } => {
                    let json = serde_json::to_string(data)
                        .map_err(|e| DaedalusError::render_for_view(e.to_string(), view))?;
                    Ok(Response::html(format!("<{view}>{json}</{view}>")))
                }
                ResultDescriptor::Json => Response::json(data),
                ResultDescriptor::Redirect { location, status } => {
                    Response::redirect(location, *status)
                }
                ResultDescriptor::None => Ok(Response::no_content()),
            }
        })
    }
}

/// A [`ResultRenderer`] that always fails.
pub struct FailingRenderer;

impl ResultRenderer for FailingRenderer {
    fn render<'a>(
        &'a self,
        descriptor: &'a ResultDescriptor,
        _data: &'a RenderData,
    ) -> BoxFuture<'a, DaedalusResult<Response>> {
        Box::pin(async move {
            match descriptor {
                ResultDescriptor::View { view } => {
                    Err(DaedalusError::render_for_view("Template engine exploded", view))
                }
                _ => Err(DaedalusError::render("Template engine exploded")),
            }
        })
    }
}

/// Creates a well-behaved recording connection.
#[must_use]
pub fn recording_connection() -> Arc<RecordingConnection> {
    Arc::new(RecordingConnection::new())
}

/// Creates a connection whose transaction was already rolled back by the
/// driver, so `commit` returns `Ok(false)`.
#[must_use]
pub fn errored_connection() -> Arc<RecordingConnection> {
    Arc::new(RecordingConnection::errored())
}

/// Creates a connection whose `commit` call fails.
#[must_use]
pub fn failing_commit_connection() -> Arc<RecordingConnection> {
    Arc::new(RecordingConnection::failing_commit())
}

/// Creates a template-free renderer.
#[must_use]
pub fn plain_renderer() -> Arc<PlainRenderer> {
    Arc::new(PlainRenderer)
}

/// Creates a renderer that always fails.
#[must_use]
pub fn failing_renderer() -> Arc<FailingRenderer> {
    Arc::new(FailingRenderer)
}
