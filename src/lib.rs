//! # field-registry
//!
//! Runtime field registry and serialization dispatch for a self-describing
//! telemetry data model.
//!
//! Independent subsystems register named fields at runtime. Each field gets
//! a stable numeric id, a prototype used to build fresh values of its type,
//! and a description that is published through the field listing. Output
//! formats are provided by serializers bound to string tokens, and every
//! value that goes through a serializer has its pre- and post-serialize
//! hooks run as a pair.
//!
//! ```ignore
//! let tracker = FieldTracker::new(RegistryConfig::default());
//! let id = tracker
//!     .fields()
//!     .register_field("dev.packets", Box::new(UInt64Field::default()), "packets seen")?;
//! let packets = tracker.fields().get_shared_instance(id).unwrap();
//! tracker.serialize("json", &mut std::io::stdout(), &packets, None)?;
//! ```

pub mod catalog;
pub mod config;
pub mod error;
pub mod registry;
pub mod serializer;
pub mod server;
pub mod tracker;
pub mod value;

pub use catalog::{FieldCatalog, FieldListing};
pub use config::RegistryConfig;
pub use error::{FieldError, SerializeError};
pub use registry::{FieldInfo, FieldRegistry};
pub use serializer::{
    JsonSerializer, NamedPath, RenameMap, SerializationScope, Serializer, SerializerRegistry,
};
pub use tracker::FieldTracker;
pub use value::{FieldId, FieldValue, SharedField};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
