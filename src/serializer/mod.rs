//! Serializer registry and dispatch.
//!
//! Output formats are bound to string tokens (`"json"`, `"json-pretty"`,
//! ...). At most one serializer is bound per token; binding a token again
//! replaces the previous serializer. Every value passed through
//! [`SerializerRegistry::serialize`] is bracketed by a
//! [`SerializationScope`], so its pre- and post-serialize hooks always run
//! as a pair.

pub mod json;
pub mod scope;

use std::collections::HashMap;
use std::io::Write;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::SerializeError;
use crate::value::SharedField;

pub use json::JsonSerializer;
pub use scope::SerializationScope;

/// Renders field values for one output format.
pub trait Serializer: Send + Sync {
    /// MIME type of the produced output.
    fn content_type(&self) -> &str {
        "application/octet-stream"
    }

    /// Write `value` to `out`.
    ///
    /// `rename` carries per-call aliases; serializers that support renamed
    /// views look the value up in it.
    fn serialize(
        &self,
        out: &mut dyn Write,
        value: &SharedField,
        rename: Option<&RenameMap>,
    ) -> Result<(), SerializeError>;
}

/// Alias and resolved element path for one value in a [`RenameMap`].
#[derive(Debug, Clone, Default)]
pub struct NamedPath {
    /// Name to publish the value under, if different from its own.
    pub rename: Option<String>,
    /// Elements walked to reach the value, outermost first. Path-aware
    /// hooks run over these instead of over the value alone.
    pub resolved_path: Vec<SharedField>,
}

impl NamedPath {
    /// Path through `resolved_path` published under `rename`.
    pub fn new(rename: Option<String>, resolved_path: Vec<SharedField>) -> Self {
        Self {
            rename,
            resolved_path,
        }
    }

    /// Alias a single value.
    pub fn renamed(name: impl Into<String>, value: &SharedField) -> Self {
        Self::new(Some(name.into()), vec![Arc::clone(value)])
    }

    /// Run pre-hooks outermost first. If one unwinds, the elements already
    /// entered get their post-hooks before the panic continues.
    pub(crate) fn pre_serialize(&self) {
        let mut entered = PartialPath {
            path: &self.resolved_path,
            entered: 0,
        };
        for element in &self.resolved_path {
            element.pre_serialize();
            entered.entered += 1;
        }
        // Complete; the post-hooks now belong to the caller's scope.
        entered.entered = 0;
    }

    pub(crate) fn post_serialize(&self) {
        for element in self.resolved_path.iter().rev() {
            element.post_serialize();
        }
    }
}

struct PartialPath<'a> {
    path: &'a [SharedField],
    entered: usize,
}

impl Drop for PartialPath<'_> {
    fn drop(&mut self) {
        for element in self.path[..self.entered].iter().rev() {
            element.post_serialize();
        }
    }
}

/// Per-call mapping from a value (by identity) to its [`NamedPath`].
#[derive(Debug, Clone, Default)]
pub struct RenameMap {
    entries: HashMap<usize, (SharedField, NamedPath)>,
}

fn identity(value: &SharedField) -> usize {
    Arc::as_ptr(value) as *const () as usize
}

impl RenameMap {
    /// Create an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Map `value` to `path`, replacing any previous mapping.
    pub fn insert(&mut self, value: &SharedField, path: NamedPath) {
        self.entries
            .insert(identity(value), (Arc::clone(value), path));
    }

    /// Path mapped for `value`, if any.
    pub fn get(&self, value: &SharedField) -> Option<&NamedPath> {
        self.entries.get(&identity(value)).map(|(_, path)| path)
    }

    /// Remove the mapping for `value`.
    pub fn remove(&mut self, value: &SharedField) -> Option<NamedPath> {
        self.entries.remove(&identity(value)).map(|(_, path)| path)
    }

    /// Number of mapped values.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is mapped.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Registry of serializers keyed by format token.
///
/// The lock covers only binding changes and lookups; the write itself runs
/// after the lock is released.
#[derive(Default)]
pub struct SerializerRegistry {
    serializers: RwLock<HashMap<String, Arc<dyn Serializer>>>,
}

impl SerializerRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `serializer` to `token`, returning the serializer it replaced.
    pub fn register_serializer(
        &self,
        token: &str,
        serializer: Arc<dyn Serializer>,
    ) -> Option<Arc<dyn Serializer>> {
        let previous = self
            .serializers
            .write()
            .insert(token.to_string(), serializer);
        if previous.is_some() {
            log::debug!("Replaced serializer for '{}'", token);
        } else {
            log::debug!("Registered serializer for '{}'", token);
        }
        previous
    }

    /// Unbind `token`. Does nothing if it was not bound.
    pub fn remove_serializer(&self, token: &str) -> Option<Arc<dyn Serializer>> {
        let removed = self.serializers.write().remove(token);
        if removed.is_some() {
            log::debug!("Removed serializer for '{}'", token);
        }
        removed
    }

    /// Whether a serializer is bound to `token`.
    pub fn can_serialize(&self, token: &str) -> bool {
        self.serializers.read().contains_key(token)
    }

    /// Serializer bound to `token`.
    pub fn get(&self, token: &str) -> Option<Arc<dyn Serializer>> {
        self.serializers.read().get(token).cloned()
    }

    /// Bound tokens, sorted.
    pub fn tokens(&self) -> Vec<String> {
        let mut tokens: Vec<String> = self.serializers.read().keys().cloned().collect();
        tokens.sort();
        tokens
    }

    /// Serialize `value` to `out` with the serializer bound to `token`.
    ///
    /// Fails with [`SerializeError::UnboundSerializer`] without touching
    /// `out` or running any hooks when nothing is bound. Otherwise the
    /// value's hooks run around the write, and the post-hook runs even when
    /// the serializer fails.
    pub fn serialize(
        &self,
        token: &str,
        out: &mut dyn Write,
        value: &SharedField,
        rename: Option<&RenameMap>,
    ) -> Result<(), SerializeError> {
        let serializer = self.get(token).ok_or_else(|| {
            log::warn!("No serializer registered for '{}'", token);
            SerializeError::UnboundSerializer(token.to_string())
        })?;

        let _scope = SerializationScope::enter(value, rename);
        serializer.serialize(out, value, rename)
    }
}

impl std::fmt::Debug for SerializerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerializerRegistry")
            .field("tokens", &self.tokens())
            .finish()
    }
}
