//! Scalar field values.

use parking_lot::RwLock;
use serde::Serialize;
use serde_json::Value;

use super::{FieldId, FieldValue};

/// A single scalar value behind a lock, tagged with its field id.
#[derive(Debug, Default)]
pub struct ScalarField<T> {
    id: Option<FieldId>,
    value: RwLock<T>,
}

/// Unsigned 64-bit counter or quantity.
pub type UInt64Field = ScalarField<u64>;
/// Signed 64-bit value.
pub type Int64Field = ScalarField<i64>;
/// Floating point measurement.
pub type Float64Field = ScalarField<f64>;
/// Free-form text.
pub type StringField = ScalarField<String>;
/// Flag.
pub type BoolField = ScalarField<bool>;

impl<T> ScalarField<T>
where
    T: Clone + Default + Serialize + Send + Sync + 'static,
{
    /// Create an untagged value.
    pub fn new(value: T) -> Self {
        Self {
            id: None,
            value: RwLock::new(value),
        }
    }

    /// Current value.
    pub fn get(&self) -> T {
        self.value.read().clone()
    }

    /// Replace the value.
    pub fn set(&self, value: T) {
        *self.value.write() = value;
    }

    /// Mutate the value in place.
    pub fn update(&self, f: impl FnOnce(&mut T)) {
        f(&mut self.value.write());
    }
}

impl<T> FieldValue for ScalarField<T>
where
    T: Clone + Default + Serialize + Send + Sync + 'static,
{
    fn clone_self(&self) -> Box<dyn FieldValue> {
        Box::new(Self::default())
    }

    fn field_id(&self) -> Option<FieldId> {
        self.id
    }

    fn set_field_id(&mut self, id: FieldId) {
        self.id = Some(id);
    }

    fn to_json(&self) -> Value {
        serde_json::to_value(&*self.value.read()).unwrap_or(Value::Null)
    }
}
