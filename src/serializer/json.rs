//! JSON output.

use std::io::Write;

use serde_json::{Map, Value};

use super::{RenameMap, Serializer};
use crate::error::SerializeError;
use crate::value::SharedField;

/// Renders [`FieldValue::to_json`](crate::value::FieldValue::to_json).
///
/// A value renamed in the call's [`RenameMap`] is wrapped in a one-key
/// object under its alias.
#[derive(Debug, Clone, Default)]
pub struct JsonSerializer {
    pretty: bool,
}

impl JsonSerializer {
    /// Compact output.
    pub fn new() -> Self {
        Self::default()
    }

    /// Indented output.
    pub fn pretty() -> Self {
        Self { pretty: true }
    }
}

impl Serializer for JsonSerializer {
    fn content_type(&self) -> &str {
        "application/json"
    }

    fn serialize(
        &self,
        out: &mut dyn Write,
        value: &SharedField,
        rename: Option<&RenameMap>,
    ) -> Result<(), SerializeError> {
        let body = value.to_json();
        let alias = rename
            .and_then(|map| map.get(value))
            .and_then(|path| path.rename.as_deref());

        let body = match alias {
            Some(name) => {
                let mut wrapped = Map::new();
                wrapped.insert(name.to_string(), body);
                Value::Object(wrapped)
            }
            None => body,
        };

        if self.pretty {
            serde_json::to_writer_pretty(&mut *out, &body)?;
        } else {
            serde_json::to_writer(&mut *out, &body)?;
        }
        Ok(())
    }
}
