//! Session state carried across requests.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// A client session: an identifier plus an ordered map of values.
///
/// Daedalus does not persist sessions itself. The host restores a session
/// before dispatch and stores it again afterwards; inside the chain the
/// session interceptor guarantees one exists in the execution context so
/// downstream interceptors and actions can rely on it.
///
/// # Example
///
/// ```
/// use daedalus_core::Session;
/// use serde_json::json;
///
/// let mut session = Session::new();
/// session.set("user", json!({"id": 7, "name": "Mira"}));
///
/// assert!(session.contains("user"));
/// assert_eq!(session.get("user").unwrap()["id"], 7);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Unique session identifier.
    id: Uuid,
    /// Session values in insertion order.
    values: IndexMap<String, Value>,
}

impl Session {
    /// Creates a new empty session with a fresh UUID v7 identifier.
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: Uuid::now_v7(),
            values: IndexMap::new(),
        }
    }

    /// Creates a session with a specific identifier.
    ///
    /// Used by hosts restoring a session from their own store.
    #[must_use]
    pub fn with_id(id: Uuid) -> Self {
        Self {
            id,
            values: IndexMap::new(),
        }
    }

    /// Returns the session identifier.
    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.id
    }

    /// Returns a session value by key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Sets a session value, replacing any previous value under the key.
    pub fn set(&mut self, key: impl Into<String>, value: Value) {
        self.values.insert(key.into(), value);
    }

    /// Removes and returns a session value.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.values.shift_remove(key)
    }

    /// Returns `true` if the session has a value under the key.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Returns `true` if the session holds no values.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Returns the number of session values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns all session values.
    #[must_use]
    pub const fn values(&self) -> &IndexMap<String, Value> {
        &self.values
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
