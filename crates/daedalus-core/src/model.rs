//! Model bundles and validation.
//!
//! The model interceptor folds request parameters into named
//! [`ModelBundle`]s before the action runs; the validation interceptor then
//! applies registered [`Validator`]s to each bundle. Validation is
//! synchronous and pure, so validators stay trivial to test.

use crate::error::FieldErrors;
use indexmap::IndexMap;
use serde_json::Value;

/// A named bag of model fields populated from request parameters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelBundle {
    name: String,
    fields: IndexMap<String, Value>,
}

impl ModelBundle {
    /// Creates an empty bundle.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: IndexMap::new(),
        }
    }

    /// Adds a field value.
    #[must_use]
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Sets a field value in place.
    pub fn set_field(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(name.into(), value.into());
    }

    /// Returns the bundle name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns a field value by name.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Returns all fields in population order.
    #[must_use]
    pub fn fields(&self) -> &IndexMap<String, Value> {
        &self.fields
    }
}

/// Validates a model bundle.
///
/// Return `Err` with the accumulated field errors to reject the bundle;
/// the validation interceptor records them in the context for the
/// response, and can short-circuit to a configured view.
pub trait Validator: Send + Sync + 'static {
    /// Checks the bundle, returning every field error found.
    fn validate(&self, bundle: &ModelBundle) -> Result<(), FieldErrors>;
}
