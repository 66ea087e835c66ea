//! Error types for chain compilation and execution.
//!
//! Compilation errors ([`CompileError`]) are fatal: a misconfigured chain
//! must never serve requests, because a silently dropped interceptor could
//! skip validation or authentication for a whole route. Execution errors
//! ([`ChainError`]) split into protocol violations, which fail the request
//! fast and bypass the error boundary, and request-level failures, which
//! the error boundary may recover into a fallback result.

use daedalus_core::DaedalusError;
use thiserror::Error;

/// Result alias for chain execution.
pub type ChainResult<T> = Result<T, ChainError>;

/// Errors raised while compiling route chains from configuration.
///
/// All variants are fatal to startup (or to an explicit reload); none of
/// them can occur once a [`crate::ChainSet`] has been built.
#[derive(Error, Debug)]
pub enum CompileError {
    /// An interceptor name survived token expansion but has no declaration.
    #[error("Unknown interceptor: {name}")]
    UnknownInterceptor {
        /// The undeclared interceptor name.
        name: String,
    },

    /// A stack was referenced by name but is not defined.
    #[error("Unknown stack: {name}")]
    UnknownStack {
        /// The undefined stack name.
        name: String,
    },

    /// A route token matched neither a stack nor an interceptor declaration.
    #[error("Unresolved interceptor token '{token}' for route '{route}'")]
    UnresolvedInterceptorToken {
        /// The route whose chain referenced the token.
        route: String,
        /// The token that could not be resolved.
        token: String,
    },

    /// A declaration names an implementation with no registered constructor.
    #[error("Unknown implementation '{implementation}' for interceptor '{interceptor}'")]
    UnknownImplementation {
        /// The interceptor whose declaration is broken.
        interceptor: String,
        /// The implementation identifier that has no constructor.
        implementation: String,
    },

    /// Merged settings did not deserialize into the interceptor's settings
    /// struct.
    #[error("Invalid settings for interceptor '{interceptor}'")]
    InvalidSettings {
        /// The interceptor whose settings were rejected.
        interceptor: String,
        /// The deserialization failure.
        #[source]
        source: serde_json::Error,
    },
}

impl CompileError {
    /// Creates an unknown-interceptor error.
    pub fn unknown_interceptor(name: impl Into<String>) -> Self {
        Self::UnknownInterceptor { name: name.into() }
    }

    /// Creates an unknown-stack error.
    pub fn unknown_stack(name: impl Into<String>) -> Self {
        Self::UnknownStack { name: name.into() }
    }

    /// Creates an unresolved-token error.
    pub fn unresolved_token(route: impl Into<String>, token: impl Into<String>) -> Self {
        Self::UnresolvedInterceptorToken {
            route: route.into(),
            token: token.into(),
        }
    }

    /// Creates an unknown-implementation error.
    pub fn unknown_implementation(
        interceptor: impl Into<String>,
        implementation: impl Into<String>,
    ) -> Self {
        Self::UnknownImplementation {
            interceptor: interceptor.into(),
            implementation: implementation.into(),
        }
    }

    /// Creates an invalid-settings error.
    pub fn invalid_settings(interceptor: impl Into<String>, source: serde_json::Error) -> Self {
        Self::InvalidSettings {
            interceptor: interceptor.into(),
            source,
        }
    }
}

/// Violations of the chain execution protocol.
///
/// These indicate a programming defect in an interceptor implementation,
/// not a request-level failure. They abort the request without committing
/// any transaction and are never caught by the error boundary.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolViolation {
    /// A continuation was invoked more than once within a single run.
    #[error("Continuation invoked twice by '{interceptor}'")]
    DoubleInvocation {
        /// The interceptor (or chain entry point) that re-invoked.
        interceptor: String,
    },

    /// A commit-or-rollback decision was recorded after one already was.
    #[error("Transaction decision recorded twice for the same request")]
    TransactionAlreadyDecided,

    /// A commit-or-rollback decision was recorded with no active transaction.
    #[error("Transaction decision recorded with no active transaction")]
    TransactionNotActive,
}

impl ProtocolViolation {
    /// Creates a double-invocation violation.
    pub fn double_invocation(interceptor: impl Into<String>) -> Self {
        Self::DoubleInvocation {
            interceptor: interceptor.into(),
        }
    }
}

/// Errors surfaced by a chain run.
#[derive(Error, Debug)]
pub enum ChainError {
    /// A chain protocol violation; fails the request fast.
    #[error(transparent)]
    Protocol(#[from] ProtocolViolation),

    /// A request-level failure flowing outward through the nesting;
    /// recoverable by the error boundary.
    #[error(transparent)]
    Request(#[from] DaedalusError),
}

impl ChainError {
    /// Returns `true` for protocol violations.
    #[must_use]
    pub const fn is_protocol(&self) -> bool {
        matches!(self, Self::Protocol(_))
    }

    /// Returns `true` for request-level failures.
    #[must_use]
    pub const fn is_request(&self) -> bool {
        matches!(self, Self::Request(_))
    }
}
