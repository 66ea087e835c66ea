//! Request envelope types.
//!
//! The [`Request`] envelope is what the front controller hands to the
//! interceptor chain: the HTTP method, the matched route URI, the decoded
//! request parameters, and the session restored for this client (if any).
//! Daedalus itself performs no HTTP parsing or routing; the host does both
//! and builds this envelope.

use crate::session::Session;
use http::Method;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// A unique identifier for each request, using UUID v7.
///
/// UUID v7 is time-ordered, which makes it ideal for request tracking
/// and log correlation.
///
/// # Example
///
/// ```
/// use daedalus_core::RequestId;
///
/// let id = RequestId::new();
/// println!("Request ID: {}", id);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(Uuid);

impl RequestId {
    /// Creates a new unique request ID using UUID v7.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Creates a `RequestId` from an existing UUID.
    ///
    /// Useful when the ID was assigned by an upstream proxy or service.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for RequestId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl From<RequestId> for Uuid {
    fn from(id: RequestId) -> Self {
        id.0
    }
}

/// The request envelope handed to the interceptor chain.
///
/// Parameters are an ordered map of decoded values (query string, form
/// fields, and path captures merged by the host). The optional session is
/// whatever the host restored for this client; the session interceptor
/// moves it into the execution context and starts a fresh one when absent.
///
/// # Example
///
/// ```
/// use daedalus_core::Request;
/// use http::Method;
/// use serde_json::json;
///
/// let request = Request::new(Method::POST, "/wishlist/add")
///     .with_param("title", json!("Fishing rod"))
///     .with_param("priority", json!(2));
///
/// assert_eq!(request.uri(), "/wishlist/add");
/// assert_eq!(request.param("title"), Some(&json!("Fishing rod")));
/// ```
#[derive(Debug, Clone)]
pub struct Request {
    /// HTTP method of the request.
    method: Method,
    /// The matched route URI.
    uri: String,
    /// Decoded request parameters in arrival order.
    params: IndexMap<String, Value>,
    /// Session restored by the host, if any.
    session: Option<Session>,
}

impl Request {
    /// Creates a new request envelope.
    #[must_use]
    pub fn new(method: Method, uri: impl Into<String>) -> Self {
        Self {
            method,
            uri: uri.into(),
            params: IndexMap::new(),
            session: None,
        }
    }

    /// Creates a GET request envelope, the common case in tests.
    #[must_use]
    pub fn get(uri: impl Into<String>) -> Self {
        Self::new(Method::GET, uri)
    }

    /// Adds a single parameter.
    #[must_use]
    pub fn with_param(mut self, name: impl Into<String>, value: Value) -> Self {
        self.params.insert(name.into(), value);
        self
    }

    /// Replaces all parameters.
    #[must_use]
    pub fn with_params(mut self, params: IndexMap<String, Value>) -> Self {
        self.params = params;
        self
    }

    /// Attaches a restored session.
    #[must_use]
    pub fn with_session(mut self, session: Session) -> Self {
        self.session = Some(session);
        self
    }

    /// Returns the HTTP method.
    #[must_use]
    pub const fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the matched route URI.
    #[must_use]
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Returns all parameters.
    #[must_use]
    pub const fn params(&self) -> &IndexMap<String, Value> {
        &self.params
    }

    /// Returns a single parameter by name.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&Value> {
        self.params.get(name)
    }

    /// Returns the restored session, if any.
    #[must_use]
    pub const fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// Takes the restored session out of the envelope.
    ///
    /// The session interceptor uses this to move ownership of the session
    /// into the execution context.
    pub fn take_session(&mut self) -> Option<Session> {
        self.session.take()
    }

    /// Stores a session back into the envelope.
    ///
    /// The session interceptor writes the context session back here after
    /// the chain unwinds so the host can persist it.
    pub fn set_session(&mut self, session: Session) {
        self.session = Some(session);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_id_is_unique() {
        let a = RequestId::new();
        let b = RequestId::new();
        assert_ne!(a, b);
    }

    #[test]
    fn test_request_id_roundtrip_through_uuid() {
        let id = RequestId::new();
        let uuid: Uuid = id.into();
        assert_eq!(RequestId::from_uuid(uuid), id);
    }

    #[test]
    fn test_request_id_display_parses_back() {
        let id = RequestId::new();
        let parsed = Uuid::parse_str(&id.to_string()).expect("should parse");
        assert_eq!(&parsed, id.as_uuid());
    }

    #[test]
    fn test_request_builder() {
        let request = Request::new(Method::POST, "/wishlist/add")
            .with_param("title", json!("Boat"))
            .with_param("priority", json!(1));

        assert_eq!(request.method(), &Method::POST);
        assert_eq!(request.uri(), "/wishlist/add");
        assert_eq!(request.params().len(), 2);
        assert_eq!(request.param("priority"), Some(&json!(1)));
        assert!(request.param("missing").is_none());
    }

    #[test]
    fn test_request_params_preserve_order() {
        let request = Request::get("/search")
            .with_param("z", json!(1))
            .with_param("a", json!(2))
            .with_param("m", json!(3));

        let keys: Vec<_> = request.params().keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["z", "a", "m"]);
    }

    #[test]
    fn test_take_session() {
        let mut request = Request::get("/").with_session(Session::new());
        assert!(request.session().is_some());

        let session = request.take_session();
        assert!(session.is_some());
        assert!(request.session().is_none());
    }
}
