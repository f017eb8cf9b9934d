//! Field listing endpoint.
//!
//! Publishes the registry's name/id/description triples under
//! `{catalog_path}.{format}`:
//!
//! - `GET /system/tracked_fields.json` — through the serializer bound to `json`
//! - `GET /system/tracked_fields.html` — built-in HTML table
//!
//! Any bound serializer token works as the extension. The endpoint is
//! transport-agnostic; [`crate::server`] binds it to an axum router.

mod html;

use std::sync::Arc;

use bytes::Bytes;
use serde_json::Value;

use crate::error::SerializeError;
use crate::registry::{FieldInfo, FieldRegistry};
use crate::serializer::SerializerRegistry;
use crate::value::{FieldId, FieldValue, SharedField};

const HTML_FORMAT: &str = "html";
const HTML_CONTENT_TYPE: &str = "text/html; charset=utf-8";

/// Point-in-time copy of the registry, serializable like any other value.
#[derive(Debug, Clone, Default)]
pub struct FieldCatalog {
    id: Option<FieldId>,
    fields: Vec<FieldInfo>,
}

impl FieldCatalog {
    /// Wrap a registry snapshot.
    pub fn new(fields: Vec<FieldInfo>) -> Self {
        Self { id: None, fields }
    }

    /// The listed fields, ordered by id.
    pub fn fields(&self) -> &[FieldInfo] {
        &self.fields
    }
}

impl FieldValue for FieldCatalog {
    fn clone_self(&self) -> Box<dyn FieldValue> {
        Box::new(FieldCatalog::default())
    }

    fn field_id(&self) -> Option<FieldId> {
        self.id
    }

    fn set_field_id(&mut self, id: FieldId) {
        self.id = Some(id);
    }

    fn to_json(&self) -> Value {
        serde_json::to_value(&self.fields).unwrap_or(Value::Null)
    }
}

/// Read-only HTTP-style view of a [`FieldRegistry`].
#[derive(Debug, Clone)]
pub struct FieldListing {
    fields: Arc<FieldRegistry>,
    serializers: Arc<SerializerRegistry>,
    path: String,
}

impl FieldListing {
    /// Serve `fields` under `path` (without extension), rendering through
    /// `serializers`.
    pub fn new(
        fields: Arc<FieldRegistry>,
        serializers: Arc<SerializerRegistry>,
        path: impl Into<String>,
    ) -> Self {
        Self {
            fields,
            serializers,
            path: path.into(),
        }
    }

    /// Path stem served by this endpoint.
    pub fn path(&self) -> &str {
        &self.path
    }

    fn format_of<'p>(&self, path: &'p str) -> Option<&'p str> {
        path.strip_prefix(self.path.as_str())?
            .strip_prefix('.')
            .filter(|format| !format.is_empty())
    }

    /// Whether this endpoint answers `method path`.
    pub fn matches(&self, path: &str, method: &str) -> bool {
        if !method.eq_ignore_ascii_case("GET") {
            return false;
        }
        match self.format_of(path) {
            Some(format) => format == HTML_FORMAT || self.serializers.can_serialize(format),
            None => false,
        }
    }

    /// Content type of the response for `path`, if it is served.
    pub fn content_type(&self, path: &str) -> Option<String> {
        let format = self.format_of(path)?;
        match self.serializers.get(format) {
            Some(serializer) => Some(serializer.content_type().to_string()),
            None if format == HTML_FORMAT => Some(HTML_CONTENT_TYPE.to_string()),
            None => None,
        }
    }

    /// Render the catalog for `path`.
    ///
    /// The registry lock is held only while the snapshot is copied. A
    /// serializer bound to the extension takes precedence over the built-in
    /// HTML table.
    pub fn handle(
        &self,
        path: &str,
        _method: &str,
        _body: &[u8],
    ) -> Result<Bytes, SerializeError> {
        let format = self
            .format_of(path)
            .ok_or_else(|| SerializeError::UnknownPath(path.to_string()))?;
        let catalog = FieldCatalog::new(self.fields.snapshot());

        if format == HTML_FORMAT && !self.serializers.can_serialize(format) {
            return Ok(Bytes::from(html::render(catalog.fields())?));
        }

        let value: SharedField = Arc::new(catalog);
        let mut out = Vec::new();
        self.serializers.serialize(format, &mut out, &value, None)?;
        Ok(Bytes::from(out))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::serializer::JsonSerializer;
    use crate::value::{StringField, UInt64Field};

    fn listing() -> FieldListing {
        let fields = Arc::new(FieldRegistry::new());
        fields
            .register_field("dev.packets", Box::new(UInt64Field::default()), "packets seen")
            .unwrap();
        fields
            .register_field("dev.name", Box::new(StringField::default()), "device name")
            .unwrap();

        let serializers = Arc::new(SerializerRegistry::new());
        serializers.register_serializer("json", Arc::new(JsonSerializer::new()));
        FieldListing::new(fields, serializers, "/system/tracked_fields")
    }

    #[test]
    fn test_matches() {
        let listing = listing();
        assert!(listing.matches("/system/tracked_fields.json", "GET"));
        assert!(listing.matches("/system/tracked_fields.html", "get"));
        assert!(!listing.matches("/system/tracked_fields.json", "POST"));
        assert!(!listing.matches("/system/tracked_fields.cbor", "GET"));
        assert!(!listing.matches("/system/tracked_fields", "GET"));
        assert!(!listing.matches("/system/tracked_fields.", "GET"));
        assert!(!listing.matches("/other.json", "GET"));
    }

    #[test]
    fn test_handle_json() {
        let listing = listing();
        let body = listing
            .handle("/system/tracked_fields.json", "GET", &[])
            .unwrap();
        let json: Value = serde_json::from_slice(&body).unwrap();
        let rows = json.as_array().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["id"], 1);
        assert_eq!(rows[0]["name"], "dev.packets");
        assert_eq!(rows[0]["description"], "packets seen");
        assert_eq!(rows[1]["name"], "dev.name");
        assert_eq!(
            listing.content_type("/system/tracked_fields.json").as_deref(),
            Some("application/json")
        );
    }

    #[test]
    fn test_handle_html() {
        let listing = listing();
        let body = listing
            .handle("/system/tracked_fields.html", "GET", &[])
            .unwrap();
        let html = String::from_utf8(body.to_vec()).unwrap();
        assert!(html.contains("dev.packets"));
        assert!(html.contains("device name"));
        assert_eq!(
            listing.content_type("/system/tracked_fields.html").as_deref(),
            Some(HTML_CONTENT_TYPE)
        );
    }

    #[test]
    fn test_handle_unbound_format() {
        let listing = listing();
        let err = listing
            .handle("/system/tracked_fields.cbor", "GET", &[])
            .unwrap_err();
        assert!(err.is_unbound());
        assert_eq!(listing.content_type("/system/tracked_fields.cbor"), None);
    }

    #[test]
    fn test_handle_path_outside_catalog() {
        let listing = listing();
        for path in ["/other.json", "/system/tracked_fields", "/system/tracked_fields."] {
            let err = listing.handle(path, "GET", &[]).unwrap_err();
            assert!(matches!(err, SerializeError::UnknownPath(ref p) if p == path));
            assert!(!err.is_unbound());
        }
    }

    #[test]
    fn test_listing_reflects_new_fields() {
        let listing = listing();
        listing
            .fields
            .register_field("dev.late", Box::new(UInt64Field::default()), "late")
            .unwrap();
        let body = listing
            .handle("/system/tracked_fields.json", "GET", &[])
            .unwrap();
        let json: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json.as_array().unwrap().len(), 3);
    }
}
