//! Result descriptors and the rendering contract.
//!
//! Actions do not build responses. They return a [`ResultDescriptor`] naming
//! what should be rendered, and a [`ResultRenderer`] turns the descriptor
//! plus the accumulated render data into a concrete [`Response`]. Rendering
//! happens at the innermost point of the interceptor chain, so every
//! interceptor wraps it: the transaction interceptor observes render
//! failures, and the error boundary can substitute its fallback result.

use crate::error::DaedalusResult;
use crate::response::Response;
use crate::BoxFuture;
use http::StatusCode;
use indexmap::IndexMap;
use serde_json::Value;

/// Data exposed for rendering, in exposure order.
pub type RenderData = IndexMap<String, Value>;

/// A declarative description of what to render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResultDescriptor {
    /// Render a named view with the accumulated render data.
    View {
        /// View identifier, resolved by the renderer.
        view: String,
    },
    /// Serialize the accumulated render data as JSON.
    Json,
    /// Redirect the client.
    Redirect {
        /// Redirect target.
        location: String,
        /// Redirect status code.
        status: StatusCode,
    },
    /// No body, `204 No Content`.
    None,
}

impl ResultDescriptor {
    /// Creates a view result.
    #[must_use]
    pub fn view(view: impl Into<String>) -> Self {
        Self::View { view: view.into() }
    }

    /// Creates a JSON result.
    #[must_use]
    pub const fn json() -> Self {
        Self::Json
    }

    /// Creates a `302 Found` redirect result.
    #[must_use]
    pub fn redirect(location: impl Into<String>) -> Self {
        Self::Redirect {
            location: location.into(),
            status: StatusCode::FOUND,
        }
    }

    /// Creates a redirect result with an explicit status code.
    #[must_use]
    pub fn redirect_with_status(location: impl Into<String>, status: StatusCode) -> Self {
        Self::Redirect {
            location: location.into(),
            status,
        }
    }

    /// Creates an empty result.
    #[must_use]
    pub const fn none() -> Self {
        Self::None
    }

    /// Returns `true` if this result is a redirect.
    ///
    /// The message interceptor uses this to decide whether flash messages
    /// should be parked in the session for the next request.
    #[must_use]
    pub const fn is_redirect(&self) -> bool {
        matches!(self, Self::Redirect { .. })
    }
}

/// The rendering contract at the view boundary.
///
/// Implementations own template lookup, serialization, and whatever engine
/// they use; Daedalus only hands them the descriptor and the render data.
/// Render failures propagate through the chain exactly like action failures.
pub trait ResultRenderer: Send + Sync + 'static {
    /// Renders a result descriptor into a response.
    fn render<'a>(
        &'a self,
        descriptor: &'a ResultDescriptor,
        data: &'a RenderData,
    ) -> BoxFuture<'a, DaedalusResult<Response>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_view_constructor() {
        let descriptor = ResultDescriptor::view("wishlist/show");
        assert_eq!(
            descriptor,
            ResultDescriptor::View {
                view: "wishlist/show".to_string()
            }
        );
        assert!(!descriptor.is_redirect());
    }

    #[test]
    fn test_redirect_defaults_to_found() {
        let descriptor = ResultDescriptor::redirect("/login");
        match &descriptor {
            ResultDescriptor::Redirect { location, status } => {
                assert_eq!(location, "/login");
                assert_eq!(*status, StatusCode::FOUND);
            }
            other => panic!("Expected redirect, got {other:?}"),
        }
        assert!(descriptor.is_redirect());
    }

    #[test]
    fn test_redirect_with_status() {
        let descriptor =
            ResultDescriptor::redirect_with_status("/done", StatusCode::SEE_OTHER);
        match descriptor {
            ResultDescriptor::Redirect { status, .. } => {
                assert_eq!(status, StatusCode::SEE_OTHER);
            }
            other => panic!("Expected redirect, got {other:?}"),
        }
    }
}
