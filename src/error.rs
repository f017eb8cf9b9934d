//! Error types for field registration and serialization.

use thiserror::Error;

/// Errors returned by field registration.
///
/// Lookup misses are not errors; they surface as `None` from the lookup
/// methods on [`FieldRegistry`](crate::registry::FieldRegistry).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FieldError {
    /// The name is already registered with a prototype of a different type.
    #[error("field '{name}' already registered as {existing}, cannot re-register as {incoming}")]
    NameConflict {
        /// Name as supplied by the conflicting caller.
        name: String,
        /// Type name of the prototype already on file.
        existing: &'static str,
        /// Type name of the rejected prototype.
        incoming: &'static str,
    },

    /// A prototype produced an instance of a different type than itself.
    #[error("prototype for '{name}' produced {produced}, expected {expected}")]
    PrototypeMismatch {
        /// Registered field name.
        name: String,
        /// Type the caller asked for.
        expected: &'static str,
        /// Type the prototype actually produced.
        produced: &'static str,
    },

    /// The id counter cannot advance any further.
    #[error("field id space exhausted while registering '{0}'")]
    IdSpaceExhausted(String),
}

/// Errors returned by concrete serializers and by
/// [`SerializerRegistry::serialize`](crate::serializer::SerializerRegistry::serialize).
#[derive(Debug, Error)]
pub enum SerializeError {
    /// No serializer is bound to the requested format token.
    #[error("no serializer registered for '{0}'")]
    UnboundSerializer(String),

    /// Writing to the output stream failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encoding failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Rendering an HTML template failed.
    #[error("Template error: {0}")]
    Template(#[from] tera::Error),

    /// The request path is not one the field listing answers.
    #[error("no field listing at '{0}'")]
    UnknownPath(String),

    /// The serializer cannot render this value.
    #[error("Unsupported value: {0}")]
    Unsupported(String),
}

impl SerializeError {
    /// Whether the caller can recover by binding a serializer or picking
    /// another format.
    pub fn is_unbound(&self) -> bool {
        matches!(self, SerializeError::UnboundSerializer(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_conflict_message() {
        let err = FieldError::NameConflict {
            name: "test.counter".to_string(),
            existing: "u64",
            incoming: "alloc::string::String",
        };
        let msg = err.to_string();
        assert!(msg.contains("test.counter"));
        assert!(msg.contains("u64"));
        assert!(msg.contains("alloc::string::String"));
    }

    #[test]
    fn test_io_error_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "closed");
        let err: SerializeError = io.into();
        assert!(matches!(err, SerializeError::Io(_)));
        assert!(!err.is_unbound());
        assert!(SerializeError::UnboundSerializer("json".into()).is_unbound());
    }
}
