//! Field values and the prototype capability.
//!
//! Every registrable type implements [`FieldValue`]. The registry keeps one
//! boxed instance per field as a prototype and calls
//! [`FieldValue::clone_self`] on it to manufacture fresh values, which are
//! handed out as [`SharedField`] handles.
//!
//! Dynamic type checks go through the inherent helpers on `dyn FieldValue`
//! ([`value_type_id`](trait.FieldValue.html#method.value_type_id),
//! [`downcast_ref`](trait.FieldValue.html#method.downcast_ref)) rather than
//! through [`AsAny`] directly, so that a `SharedField` is never mistaken for
//! the `Arc` wrapping it.

pub mod scalar;

use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub use scalar::{BoolField, Float64Field, Int64Field, ScalarField, StringField, UInt64Field};

/// Numeric identity assigned to a registered field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldId(pub u32);

impl FieldId {
    /// Raw numeric value.
    pub fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for FieldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for FieldId {
    fn from(id: u32) -> Self {
        FieldId(id)
    }
}

/// Type-erasure plumbing for [`FieldValue`], implemented for every sized
/// `Send + Sync + 'static` type.
pub trait AsAny: Any + Send + Sync {
    /// Borrow as `&dyn Any` for downcasting.
    fn as_any(&self) -> &dyn Any;
    /// Convert a shared handle into `Arc<dyn Any>` for owned downcasting.
    fn into_any_arc(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
    /// Fully qualified name of the concrete type.
    fn type_name(&self) -> &'static str;
}

impl<T: Any + Send + Sync> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any_arc(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }

    fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }
}

/// A value in the self-describing data model.
///
/// Implementors double as prototypes: `clone_self` must return a new default
/// instance of the implementor's own concrete type. The serialize hooks take
/// `&self` because values are shared; types that need to stage data before
/// serialization use interior mutability.
pub trait FieldValue: AsAny {
    /// Produce a fresh default instance of this value's concrete type.
    fn clone_self(&self) -> Box<dyn FieldValue>;

    /// The field id this value represents, if it has been tagged.
    fn field_id(&self) -> Option<FieldId>;

    /// Tag this value with a field id.
    fn set_field_id(&mut self, id: FieldId);

    /// Structured view of the value, consumed by serializers.
    fn to_json(&self) -> Value;

    /// Called once before the value is serialized.
    fn pre_serialize(&self) {}

    /// Called once after the value is serialized, whether or not the write
    /// succeeded.
    fn post_serialize(&self) {}
}

/// Shared handle to a produced field value.
pub type SharedField = Arc<dyn FieldValue>;

impl dyn FieldValue {
    /// `TypeId` of the concrete value type.
    pub fn value_type_id(&self) -> TypeId {
        AsAny::as_any(self).type_id()
    }

    /// Name of the concrete value type, for diagnostics.
    pub fn value_type_name(&self) -> &'static str {
        AsAny::type_name(self)
    }

    /// Whether `other` has the same concrete type as `self`.
    pub fn same_type_as(&self, other: &dyn FieldValue) -> bool {
        self.value_type_id() == other.value_type_id()
    }

    /// Whether the concrete type is `T`.
    pub fn is<T: FieldValue>(&self) -> bool {
        self.value_type_id() == TypeId::of::<T>()
    }

    /// Borrow as the concrete type `T`.
    pub fn downcast_ref<T: FieldValue>(&self) -> Option<&T> {
        AsAny::as_any(self).downcast_ref::<T>()
    }
}

impl fmt::Debug for dyn FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldValue")
            .field("type", &self.value_type_name())
            .field("field_id", &self.field_id())
            .finish()
    }
}

/// Downcast a shared value to its concrete type.
///
/// Returns `None` when the value is not a `T`.
pub fn downcast_shared<T: FieldValue>(field: SharedField) -> Option<Arc<T>> {
    AsAny::into_any_arc(field).downcast::<T>().ok()
}
