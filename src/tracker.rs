//! The process-wide field tracker.
//!
//! A [`FieldTracker`] is built once at startup and handed to every
//! subsystem that registers fields, produces values or serializes them.
//! There is no global instance; share it through an `Arc`.

use std::io::Write;
use std::sync::Arc;

use crate::catalog::FieldListing;
use crate::config::RegistryConfig;
use crate::error::SerializeError;
use crate::registry::FieldRegistry;
use crate::serializer::{JsonSerializer, RenameMap, SerializerRegistry};
use crate::value::SharedField;

/// Token the built-in JSON serializer is bound to.
pub const JSON_FORMAT: &str = "json";

/// Field registry, serializer registry and field listing for one process.
#[derive(Debug)]
pub struct FieldTracker {
    config: RegistryConfig,
    fields: Arc<FieldRegistry>,
    serializers: Arc<SerializerRegistry>,
}

impl FieldTracker {
    /// Build a tracker from `config`.
    pub fn new(config: RegistryConfig) -> Self {
        let fields = Arc::new(FieldRegistry::with_config(&config));
        let serializers = Arc::new(SerializerRegistry::new());
        if config.register_json {
            serializers.register_serializer(JSON_FORMAT, Arc::new(JsonSerializer::new()));
        }
        log::info!(
            "Field tracker ready (first id {}, lock timeout {:?}, catalog at {})",
            config.first_field_id,
            config.lock_timeout(),
            config.catalog_path
        );
        Self {
            config,
            fields,
            serializers,
        }
    }

    /// Build a tracker configured from the environment.
    pub fn from_env() -> Self {
        Self::new(RegistryConfig::from_env())
    }

    /// Configuration the tracker was built with.
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// The field registry.
    pub fn fields(&self) -> &Arc<FieldRegistry> {
        &self.fields
    }

    /// The serializer registry.
    pub fn serializers(&self) -> &Arc<SerializerRegistry> {
        &self.serializers
    }

    /// Serialize `value` with the serializer bound to `token`.
    pub fn serialize(
        &self,
        token: &str,
        out: &mut dyn Write,
        value: &SharedField,
        rename: Option<&RenameMap>,
    ) -> Result<(), SerializeError> {
        self.serializers.serialize(token, out, value, rename)
    }

    /// Field listing endpoint over this tracker's registries.
    pub fn listing(&self) -> FieldListing {
        FieldListing::new(
            Arc::clone(&self.fields),
            Arc::clone(&self.serializers),
            self.config.catalog_path.clone(),
        )
    }
}

impl Default for FieldTracker {
    fn default() -> Self {
        Self::new(RegistryConfig::default())
    }
}
