//! Database access contract.
//!
//! Daedalus does not ship a driver. Applications provide a
//! [`DatabaseConnection`] implementation and the transaction interceptor
//! drives its `begin`/`commit`/`rollback` surface. The contract mirrors
//! what common drivers expose: nested `begin` calls are no-ops reported
//! through the return value, and `commit` reports whether a commit actually
//! happened or the driver had already discarded the transaction.

use crate::error::DaedalusError;
use crate::BoxFuture;
use indexmap::IndexMap;
use serde_json::Value;
use thiserror::Error;

/// A connection capable of queries and transaction control.
///
/// Transaction semantics:
///
/// * [`begin`](Self::begin) returns `Ok(true)` when a new transaction was
///   opened and `Ok(false)` when one is already active on this connection.
///   A `false` return is not an error; the caller simply joins the
///   transaction already in flight.
/// * [`commit`](Self::commit) returns `Ok(true)` when the transaction was
///   committed and `Ok(false)` when the driver had already rolled it back
///   after an earlier statement failure, so there was nothing to commit.
/// * Implementations must discard any transaction that is still open when
///   the connection is dropped or returned to a pool.
pub trait DatabaseConnection: Send + Sync + 'static {
    /// Opens a transaction, or joins the active one.
    fn begin<'a>(&'a self) -> BoxFuture<'a, Result<bool, DatabaseError>>;

    /// Commits the active transaction.
    fn commit<'a>(&'a self) -> BoxFuture<'a, Result<bool, DatabaseError>>;

    /// Rolls back the active transaction.
    fn rollback<'a>(&'a self) -> BoxFuture<'a, Result<(), DatabaseError>>;

    /// Executes a statement with positional parameters.
    fn query<'a>(
        &'a self,
        statement: &'a str,
        params: &'a [Value],
    ) -> BoxFuture<'a, Result<ResultSet, DatabaseError>>;
}

/// Errors surfaced by [`DatabaseConnection`] implementations.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// The connection itself failed.
    #[error("Database connection error: {message}")]
    Connection {
        /// Human-readable error message.
        message: String,
        /// The underlying driver error.
        #[source]
        source: Option<anyhow::Error>,
    },

    /// A statement failed to execute.
    #[error("Query error: {message}")]
    Query {
        /// Human-readable error message.
        message: String,
        /// The statement that failed, if known.
        statement: Option<String>,
    },

    /// Transaction control failed.
    #[error("Transaction error: {message}")]
    Transaction {
        /// Human-readable error message.
        message: String,
    },
}

impl DatabaseError {
    /// Creates a connection error.
    #[must_use]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a connection error with a source error.
    pub fn connection_with_source(
        message: impl Into<String>,
        source: impl Into<anyhow::Error>,
    ) -> Self {
        Self::Connection {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Creates a query error.
    #[must_use]
    pub fn query(message: impl Into<String>) -> Self {
        Self::Query {
            message: message.into(),
            statement: None,
        }
    }

    /// Creates a query error naming the failing statement.
    #[must_use]
    pub fn query_for_statement(
        message: impl Into<String>,
        statement: impl Into<String>,
    ) -> Self {
        Self::Query {
            message: message.into(),
            statement: Some(statement.into()),
        }
    }

    /// Creates a transaction error.
    #[must_use]
    pub fn transaction(message: impl Into<String>) -> Self {
        Self::Transaction {
            message: message.into(),
        }
    }
}

impl From<DatabaseError> for DaedalusError {
    fn from(err: DatabaseError) -> Self {
        let message = err.to_string();
        Self::database_with_source(message, err)
    }
}

/// Rows returned by a query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultSet {
    rows: Vec<Row>,
}

impl ResultSet {
    /// Creates a result set from rows.
    #[must_use]
    pub fn new(rows: Vec<Row>) -> Self {
        Self { rows }
    }

    /// Returns `true` if no rows were returned.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Returns the number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns the first row, if any.
    #[must_use]
    pub fn first(&self) -> Option<&Row> {
        self.rows.first()
    }

    /// Returns the rows.
    #[must_use]
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Consumes the set and returns its rows.
    #[must_use]
    pub fn into_rows(self) -> Vec<Row> {
        self.rows
    }
}

/// A single row, keyed by column name in select order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    columns: IndexMap<String, Value>,
}

impl Row {
    /// Creates an empty row.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a column value.
    #[must_use]
    pub fn with_column(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.columns.insert(name.into(), value.into());
        self
    }

    /// Returns a column value by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.columns.get(name)
    }

    /// Returns all columns in select order.
    #[must_use]
    pub fn columns(&self) -> &IndexMap<String, Value> {
        &self.columns
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCategory;

    #[test]
    fn test_row_columns_keep_select_order() {
        let row = Row::new()
            .with_column("id", 7)
            .with_column("title", "Matchbox cars");
        let names: Vec<&str> = row.columns().keys().map(String::as_str).collect();
        assert_eq!(names, vec!["id", "title"]);
        assert_eq!(row.get("id"), Some(&Value::from(7)));
        assert_eq!(row.get("missing"), None);
    }

    #[test]
    fn test_result_set_accessors() {
        let set = ResultSet::new(vec![Row::new().with_column("id", 1)]);
        assert!(!set.is_empty());
        assert_eq!(set.len(), 1);
        assert!(set.first().is_some());
    }

    #[test]
    fn test_database_error_converts_to_database_category() {
        let err = DatabaseError::query_for_statement("Syntax error", "SELECT * FORM wish");
        let converted = DaedalusError::from(err);
        assert_eq!(converted.category(), ErrorCategory::Database);
        assert!(converted.to_string().contains("Syntax error"));
    }
}
