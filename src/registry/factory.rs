//! Instance factory: fresh values from registered prototypes.

use std::sync::Arc;

use super::FieldRegistry;
use crate::error::FieldError;
use crate::value::{downcast_shared, FieldId, FieldValue, SharedField};

impl FieldRegistry {
    /// Build a fresh instance of the field registered under `id`.
    ///
    /// Every call returns a new value tagged with `id`; the registry keeps
    /// no reference to it. Returns `None` for an unknown id.
    pub fn get_shared_instance(&self, id: FieldId) -> Option<SharedField> {
        // Entries are immutable, so the prototype can be used after the lock
        // is released.
        self.entry(id).map(|e| e.instantiate())
    }

    /// Build a fresh instance of the field registered under `name`.
    pub fn get_shared_instance_by_name(&self, name: &str) -> Option<SharedField> {
        self.entry_by_name(name).map(|e| e.instantiate())
    }

    /// [`get_shared_instance`](Self::get_shared_instance) downcast to `T`.
    ///
    /// Returns `None` if the id is unknown or the field is not a `T`.
    pub fn get_shared_instance_as<T: FieldValue>(&self, id: FieldId) -> Option<Arc<T>> {
        self.get_shared_instance(id).and_then(downcast_shared::<T>)
    }

    /// [`get_shared_instance_by_name`](Self::get_shared_instance_by_name)
    /// downcast to `T`.
    pub fn get_shared_instance_by_name_as<T: FieldValue>(&self, name: &str) -> Option<Arc<T>> {
        self.get_shared_instance_by_name(name)
            .and_then(downcast_shared::<T>)
    }

    /// Typed form of [`register_and_get_field`](Self::register_and_get_field).
    pub fn register_and_get_field_as<T: FieldValue>(
        &self,
        name: &str,
        prototype: T,
        description: &str,
    ) -> Result<Arc<T>, FieldError> {
        let instance = self.register_and_get_field(name, Box::new(prototype), description)?;
        let produced = instance.value_type_name();
        downcast_shared::<T>(instance).ok_or_else(|| FieldError::PrototypeMismatch {
            name: name.to_string(),
            expected: std::any::type_name::<T>(),
            produced,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RegistryConfig;
    use crate::value::{StringField, UInt64Field};
    use std::sync::Weak;

    #[test]
    fn test_instances_are_distinct() {
        let registry = FieldRegistry::with_config(&RegistryConfig::new().with_first_field_id(1000));
        let id = registry
            .register_field("test.counter", Box::new(UInt64Field::new(41)), "test field")
            .unwrap();

        let a = registry.get_shared_instance(id).unwrap();
        let b = registry.get_shared_instance(id).unwrap();
        assert!(!Arc::ptr_eq(&a, &b));
        assert!(a.is::<UInt64Field>());
        assert!(b.is::<UInt64Field>());
        assert_eq!(a.field_id(), Some(FieldId(1000)));

        // Values start from the type default, not the prototype's contents.
        let typed = registry.get_shared_instance_as::<UInt64Field>(id).unwrap();
        assert_eq!(typed.get(), 0);
        typed.set(5);
        assert_eq!(
            registry
                .get_shared_instance_as::<UInt64Field>(id)
                .unwrap()
                .get(),
            0
        );
    }

    #[test]
    fn test_lookup_by_name() {
        let registry = FieldRegistry::new();
        registry
            .register_field("dev.name", Box::new(StringField::default()), "device name")
            .unwrap();

        let value = registry
            .get_shared_instance_by_name_as::<StringField>("DEV.NAME")
            .unwrap();
        value.set("wlan0".to_string());
        assert_eq!(value.get(), "wlan0");
        assert!(registry
            .get_shared_instance_by_name_as::<UInt64Field>("dev.name")
            .is_none());
    }

    #[test]
    fn test_unknown_is_none() {
        let registry = FieldRegistry::new();
        assert!(registry.get_shared_instance(FieldId(1)).is_none());
        assert!(registry.get_shared_instance_by_name("nope").is_none());
        assert!(registry.get_shared_instance_as::<UInt64Field>(FieldId(1)).is_none());
    }

    #[test]
    fn test_register_and_get_field_as() {
        let registry = FieldRegistry::new();
        let counter = registry
            .register_and_get_field_as("dev.count", UInt64Field::default(), "count")
            .unwrap();
        assert_eq!(counter.field_id(), registry.get_field_id("dev.count"));

        let err = registry
            .register_and_get_field_as("dev.count", StringField::default(), "count")
            .unwrap_err();
        assert!(matches!(err, FieldError::NameConflict { .. }));
    }

    /// Produces an instance of a different type than itself.
    #[derive(Debug, Default)]
    struct Liar {
        id: Option<FieldId>,
    }

    impl FieldValue for Liar {
        fn clone_self(&self) -> Box<dyn FieldValue> {
            Box::new(UInt64Field::default())
        }

        fn field_id(&self) -> Option<FieldId> {
            self.id
        }

        fn set_field_id(&mut self, id: FieldId) {
            self.id = Some(id);
        }

        fn to_json(&self) -> serde_json::Value {
            serde_json::Value::Null
        }
    }

    #[test]
    fn test_prototype_mismatch_reported() {
        let registry = FieldRegistry::new();
        let err = registry
            .register_and_get_field_as("liar", Liar::default(), "")
            .unwrap_err();
        assert!(matches!(err, FieldError::PrototypeMismatch { .. }));
    }

    /// Registers a child field while being instantiated.
    struct Composite {
        id: Option<FieldId>,
        registry: Weak<FieldRegistry>,
        child: Option<SharedField>,
    }

    impl FieldValue for Composite {
        fn clone_self(&self) -> Box<dyn FieldValue> {
            let child = self.registry.upgrade().map(|registry| {
                registry
                    .register_and_get_field(
                        "composite.child",
                        Box::new(StringField::default()),
                        "nested field",
                    )
                    .unwrap()
            });
            Box::new(Composite {
                id: None,
                registry: self.registry.clone(),
                child,
            })
        }

        fn field_id(&self) -> Option<FieldId> {
            self.id
        }

        fn set_field_id(&mut self, id: FieldId) {
            self.id = Some(id);
        }

        fn to_json(&self) -> serde_json::Value {
            serde_json::json!({ "child": self.child.as_ref().map(|c| c.to_json()) })
        }
    }

    #[test]
    fn test_nested_registration_during_instantiation() {
        let registry = Arc::new(FieldRegistry::new());
        let proto = Composite {
            id: None,
            registry: Arc::downgrade(&registry),
            child: None,
        };

        let value = registry
            .register_and_get_field("composite", Box::new(proto), "parent")
            .unwrap();

        let parent_id = registry.get_field_id("composite").unwrap();
        let child_id = registry.get_field_id("composite.child").unwrap();
        assert!(parent_id < child_id);
        assert_eq!(value.field_id(), Some(parent_id));

        let composite = value.downcast_ref::<Composite>().unwrap();
        assert_eq!(composite.child.as_ref().unwrap().field_id(), Some(child_id));
    }
}
