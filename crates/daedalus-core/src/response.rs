//! Response envelope types.

use crate::error::DaedalusError;
use bytes::Bytes;
use http::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE, LOCATION};
use http::StatusCode;
use serde::Serialize;

/// The response envelope produced by rendering a result descriptor.
///
/// Daedalus does not transmit responses; the host takes the envelope and
/// writes it to the wire with whatever HTTP stack it uses.
#[derive(Debug, Clone)]
pub struct Response {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
}

impl Response {
    /// Creates an empty response with the given status.
    #[must_use]
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: Bytes::new(),
        }
    }

    /// Creates a `200 OK` response with an HTML body.
    #[must_use]
    pub fn html(body: impl Into<Bytes>) -> Self {
        let mut response = Self::new(StatusCode::OK).with_body(body);
        response.headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static("text/html; charset=utf-8"),
        );
        response
    }

    /// Creates a `200 OK` response with a JSON body serialized from `value`.
    pub fn json<T: Serialize>(value: &T) -> Result<Self, DaedalusError> {
        let body = serde_json::to_vec(value)
            .map_err(|e| DaedalusError::render(format!("JSON serialization failed: {e}")))?;
        let mut response = Self::new(StatusCode::OK).with_body(body);
        response
            .headers
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(response)
    }

    /// Creates a redirect response with a `Location` header.
    pub fn redirect(location: &str, status: StatusCode) -> Result<Self, DaedalusError> {
        let value = HeaderValue::from_str(location)
            .map_err(|_| DaedalusError::render(format!("invalid redirect location: {location}")))?;
        let mut response = Self::new(status);
        response.headers.insert(LOCATION, value);
        Ok(response)
    }

    /// Creates a `204 No Content` response.
    #[must_use]
    pub fn no_content() -> Self {
        Self::new(StatusCode::NO_CONTENT)
    }

    /// Replaces the body.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Adds a header.
    #[must_use]
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Returns the status code.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Returns the headers.
    #[must_use]
    pub const fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns mutable access to the headers.
    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// Returns the body.
    #[must_use]
    pub const fn body(&self) -> &Bytes {
        &self.body
    }

    /// Returns the body as UTF-8 text, replacing invalid sequences.
    #[must_use]
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Returns the `Location` header value, if present and valid UTF-8.
    #[must_use]
    pub fn location(&self) -> Option<&str> {
        self.headers.get(LOCATION).and_then(|v| v.to_str().ok())
    }
}
