//! Error types for Daedalus.
//!
//! This module provides the [`DaedalusError`] type, the standard request-level
//! error used throughout the framework. Every failure that an action, a
//! renderer, or a database collaborator can produce is expressed as a
//! `DaedalusError`, which the interceptor chain propagates outward and the
//! error boundary interceptor may recover from.

use http::StatusCode;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias using [`DaedalusError`].
pub type DaedalusResult<T> = Result<T, DaedalusError>;

/// Categories of errors for classification and handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Model validation errors (invalid input).
    Validation,
    /// Authentication errors (missing or invalid session credentials).
    Authentication,
    /// Resource not found.
    NotFound,
    /// Database errors (connection, query, or transaction failures).
    Database,
    /// Result rendering errors.
    Render,
    /// Internal framework or action errors.
    Internal,
}

impl ErrorCategory {
    /// Returns the default HTTP status code for this error category.
    #[must_use]
    pub const fn default_status_code(&self) -> StatusCode {
        match self {
            Self::Validation => StatusCode::BAD_REQUEST,
            Self::Authentication => StatusCode::UNAUTHORIZED,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Database | Self::Render | Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Standard error type for Daedalus.
///
/// `DaedalusError` provides structured errors with:
/// - Error categorization
/// - HTTP status code mapping
/// - Error chaining support
///
/// # Example
///
/// ```
/// use daedalus_core::{DaedalusError, ErrorCategory};
///
/// fn load_wishlist(id: &str) -> Result<(), DaedalusError> {
///     if id.is_empty() {
///         return Err(DaedalusError::not_found("Wishlist does not exist"));
///     }
///     Ok(())
/// }
/// ```
#[derive(Error, Debug)]
pub enum DaedalusError {
    /// Model validation failed.
    #[error("Validation error: {message}")]
    Validation {
        /// Human-readable error message.
        message: String,
        /// Field-specific validation errors.
        #[source]
        field_errors: Option<FieldErrors>,
    },

    /// Authentication failed.
    #[error("Authentication error: {message}")]
    Authentication {
        /// Human-readable error message.
        message: String,
    },

    /// Resource not found.
    #[error("Not found: {message}")]
    NotFound {
        /// Human-readable error message.
        message: String,
    },

    /// Database error.
    #[error("Database error: {message}")]
    Database {
        /// Human-readable error message.
        message: String,
        /// The underlying error (not exposed to clients).
        #[source]
        source: Option<anyhow::Error>,
    },

    /// Result rendering failed.
    #[error("Render error: {message}")]
    Render {
        /// Human-readable error message.
        message: String,
        /// The view that failed to render, if known.
        view: Option<String>,
    },

    /// Internal framework or action error.
    #[error("Internal error: {message}")]
    Internal {
        /// Human-readable error message.
        message: String,
        /// The underlying error (not exposed to clients).
        #[source]
        source: Option<anyhow::Error>,
    },
}

impl DaedalusError {
    /// Creates a validation error with a message.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            field_errors: None,
        }
    }

    /// Creates a validation error with field-specific errors.
    #[must_use]
    pub fn validation_with_fields(message: impl Into<String>, field_errors: FieldErrors) -> Self {
        Self::Validation {
            message: message.into(),
            field_errors: Some(field_errors),
        }
    }

    /// Creates an authentication error.
    #[must_use]
    pub fn authentication(message: impl Into<String>) -> Self {
        Self::Authentication {
            message: message.into(),
        }
    }

    /// Creates a not found error.
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Creates a database error.
    #[must_use]
    pub fn database(message: impl Into<String>) -> Self {
        Self::Database {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a database error with a source error.
    pub fn database_with_source(
        message: impl Into<String>,
        source: impl Into<anyhow::Error>,
    ) -> Self {
        Self::Database {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Creates a render error.
    #[must_use]
    pub fn render(message: impl Into<String>) -> Self {
        Self::Render {
            message: message.into(),
            view: None,
        }
    }

    /// Creates a render error naming the view that failed.
    #[must_use]
    pub fn render_for_view(message: impl Into<String>, view: impl Into<String>) -> Self {
        Self::Render {
            message: message.into(),
            view: Some(view.into()),
        }
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
            source: None,
        }
    }

    /// Creates an internal error with a source error.
    pub fn internal_with_source(
        message: impl Into<String>,
        source: impl Into<anyhow::Error>,
    ) -> Self {
        Self::Internal {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Returns the error category.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::Validation { .. } => ErrorCategory::Validation,
            Self::Authentication { .. } => ErrorCategory::Authentication,
            Self::NotFound { .. } => ErrorCategory::NotFound,
            Self::Database { .. } => ErrorCategory::Database,
            Self::Render { .. } => ErrorCategory::Render,
            Self::Internal { .. } => ErrorCategory::Internal,
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        self.category().default_status_code()
    }

    /// Returns the field errors carried by a validation error, if any.
    #[must_use]
    pub const fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            Self::Validation {
                field_errors: Some(errors),
                ..
            } => Some(errors),
            _ => None,
        }
    }
}

/// Field-specific validation errors.
///
/// Insertion order is preserved so rendered error lists are stable.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Error)]
#[error("Field validation errors")]
pub struct FieldErrors {
    /// Map of field name to list of error messages.
    pub fields: IndexMap<String, Vec<String>>,
}

impl FieldErrors {
    /// Creates a new empty `FieldErrors`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an error for a field.
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.fields
            .entry(field.into())
            .or_default()
            .push(message.into());
    }

    /// Returns `true` if there are no field errors.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Returns the number of fields with errors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error() {
        let error = DaedalusError::validation("Invalid email format");
        assert_eq!(error.category(), ErrorCategory::Validation);
        assert_eq!(error.status_code(), StatusCode::BAD_REQUEST);
        assert!(error.to_string().contains("Invalid email format"));
    }

    #[test]
    fn test_validation_error_with_fields() {
        let mut field_errors = FieldErrors::new();
        field_errors.add("email", "Invalid format");
        field_errors.add("email", "Must not be empty");
        field_errors.add("name", "Too long");

        let error = DaedalusError::validation_with_fields("Validation failed", field_errors);
        assert_eq!(error.category(), ErrorCategory::Validation);
        assert_eq!(error.field_errors().map(FieldErrors::len), Some(2));
    }

    #[test]
    fn test_authentication_error() {
        let error = DaedalusError::authentication("No user in session");
        assert_eq!(error.category(), ErrorCategory::Authentication);
        assert_eq!(error.status_code(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_not_found_error() {
        let error = DaedalusError::not_found("Wishlist 42 does not exist");
        assert_eq!(error.category(), ErrorCategory::NotFound);
        assert_eq!(error.status_code(), StatusCode::NOT_FOUND);
        assert!(error.to_string().contains("Wishlist 42"));
    }

    #[test]
    fn test_database_error_with_source() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "socket closed");
        let error = DaedalusError::database_with_source("Connection lost", io);
        assert_eq!(error.category(), ErrorCategory::Database);
        assert_eq!(error.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(std::error::Error::source(&error).is_some());
    }

    #[test]
    fn test_render_error_names_view() {
        let error = DaedalusError::render_for_view("Template missing", "wishlist/show");
        match error {
            DaedalusError::Render { view, .. } => {
                assert_eq!(view.as_deref(), Some("wishlist/show"));
            }
            other => panic!("Expected render error, got {other:?}"),
        }
    }

    #[test]
    fn test_internal_error() {
        let error = DaedalusError::internal("Something went wrong");
        assert_eq!(error.category(), ErrorCategory::Internal);
        assert_eq!(error.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_field_errors() {
        let mut errors = FieldErrors::new();
        assert!(errors.is_empty());

        errors.add("email", "Invalid format");
        assert!(!errors.is_empty());
        assert_eq!(errors.len(), 1);

        errors.add("email", "Required");
        assert_eq!(errors.fields["email"].len(), 2);
    }

    #[test]
    fn test_field_errors_preserve_insertion_order() {
        let mut errors = FieldErrors::new();
        errors.add("zebra", "first");
        errors.add("apple", "second");
        errors.add("mango", "third");

        let keys: Vec<_> = errors.fields.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["zebra", "apple", "mango"]);
    }

    #[test]
    fn test_all_error_categories_have_status_codes() {
        let categories = [
            ErrorCategory::Validation,
            ErrorCategory::Authentication,
            ErrorCategory::NotFound,
            ErrorCategory::Database,
            ErrorCategory::Render,
            ErrorCategory::Internal,
        ];

        for category in categories {
            let status = category.default_status_code();
            assert!(
                status.is_client_error() || status.is_server_error(),
                "Category {:?} should map to error status code, got {}",
                category,
                status
            );
        }
    }
}
