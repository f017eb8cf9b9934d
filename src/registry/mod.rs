//! Field registry: the name ↔ id ↔ prototype mapping.
//!
//! Subsystems register the fields they publish once, typically at startup,
//! and keep the returned [`FieldId`]. Names are dot-namespaced by convention
//! (`plugin.foo.some_field`) and compared case-insensitively. The registry
//! only grows; ids are never reused.
//!
//! A single reentrant, timed lock guards every operation. Reentrancy lets a
//! prototype register the fields it depends on while it is being
//! instantiated inside [`FieldRegistry::register_and_get_field`].

mod factory;
mod lock;

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use crate::config::RegistryConfig;
use crate::error::FieldError;
use crate::value::{FieldId, FieldValue, SharedField};

use lock::TimedReentrantLock;

/// One registered field. Immutable once inserted.
struct FieldEntry {
    id: FieldId,
    name: String,
    description: String,
    prototype: Box<dyn FieldValue>,
}

impl FieldEntry {
    fn instantiate(&self) -> SharedField {
        let mut value = self.prototype.clone_self();
        value.set_field_id(self.id);
        Arc::from(value)
    }
}

struct FieldTable {
    next_id: u64,
    by_name: HashMap<String, Arc<FieldEntry>>,
    by_id: BTreeMap<FieldId, Arc<FieldEntry>>,
}

impl FieldTable {
    fn new(first_id: u32) -> Self {
        Self {
            next_id: u64::from(first_id),
            by_name: HashMap::new(),
            by_id: BTreeMap::new(),
        }
    }

    fn allocate_id(&mut self, name: &str) -> Result<FieldId, FieldError> {
        let id = u32::try_from(self.next_id)
            .map_err(|_| FieldError::IdSpaceExhausted(name.to_string()))?;
        self.next_id += 1;
        Ok(FieldId(id))
    }

    /// Resolve `key` before registering it, reserving an id if it is new.
    fn claim(
        &mut self,
        key: &str,
        name: &str,
        prototype: &dyn FieldValue,
    ) -> Result<Claim, FieldError> {
        match self.by_name.get(key) {
            Some(existing) => {
                check_type(name, existing, prototype)?;
                Ok(Claim::Existing(Arc::clone(existing)))
            }
            None => Ok(Claim::Vacant(self.allocate_id(name)?)),
        }
    }

    /// Store a tagged entry under its reserved id.
    ///
    /// A nested call may have registered the same name while the prototype
    /// was being tagged; the earlier entry wins and the reserved id is
    /// left unused.
    fn insert(
        &mut self,
        key: String,
        entry: Arc<FieldEntry>,
    ) -> Result<Arc<FieldEntry>, FieldError> {
        if let Some(existing) = self.by_name.get(&key) {
            check_type(&entry.name, existing, &*entry.prototype)?;
            log::warn!(
                "Field '{}' was registered during its own registration; id {} left unused",
                entry.name,
                entry.id
            );
            return Ok(Arc::clone(existing));
        }
        self.by_name.insert(key, Arc::clone(&entry));
        self.by_id.insert(entry.id, Arc::clone(&entry));
        Ok(entry)
    }
}

enum Claim {
    Existing(Arc<FieldEntry>),
    Vacant(FieldId),
}

fn check_type(
    name: &str,
    existing: &FieldEntry,
    prototype: &dyn FieldValue,
) -> Result<(), FieldError> {
    if existing.prototype.same_type_as(prototype) {
        return Ok(());
    }
    log::warn!(
        "Refusing to re-register field '{}' as {}: already registered as {}",
        name,
        prototype.value_type_name(),
        existing.prototype.value_type_name()
    );
    Err(FieldError::NameConflict {
        name: name.to_string(),
        existing: existing.prototype.value_type_name(),
        incoming: prototype.value_type_name(),
    })
}

fn fold_name(name: &str) -> String {
    name.to_lowercase()
}

/// Name, id and description of a registered field, as published by the
/// field listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldInfo {
    /// Assigned id.
    pub id: FieldId,
    /// Name as first registered.
    pub name: String,
    /// Human-readable description.
    pub description: String,
    /// Concrete type of the prototype.
    #[serde(rename = "type")]
    pub type_name: &'static str,
}

/// Registry of named fields and their prototypes.
pub struct FieldRegistry {
    table: TimedReentrantLock<FieldTable>,
}

impl FieldRegistry {
    /// Create a registry with default configuration.
    pub fn new() -> Self {
        Self::with_config(&RegistryConfig::default())
    }

    /// Create a registry using the lock timeout and first id from `config`.
    pub fn with_config(config: &RegistryConfig) -> Self {
        Self {
            table: TimedReentrantLock::new(
                "field registry",
                config.lock_timeout(),
                FieldTable::new(config.first_field_id),
            ),
        }
    }

    /// Register a field and return its id.
    ///
    /// If `name` is already registered with a prototype of the same type,
    /// the existing id is returned and `prototype` and `description` are
    /// dropped. A prototype of a different type is rejected with
    /// [`FieldError::NameConflict`] and nothing changes.
    ///
    /// # Panics
    ///
    /// Panics if the registry lock cannot be acquired within the configured
    /// timeout.
    pub fn register_field(
        &self,
        name: &str,
        prototype: Box<dyn FieldValue>,
        description: &str,
    ) -> Result<FieldId, FieldError> {
        let entry = self.insert(name, prototype, description)?;
        Ok(entry.id)
    }

    /// Register a field if needed and return a fresh instance of it.
    ///
    /// The instance comes from whichever prototype is on file after the
    /// call, so for an existing name `prototype` and `description` are
    /// ignored. The registry lock is held until the instance exists; the
    /// prototype may register further fields from the same thread while it
    /// builds the instance.
    ///
    /// # Panics
    ///
    /// Panics if the registry lock cannot be acquired within the configured
    /// timeout.
    pub fn register_and_get_field(
        &self,
        name: &str,
        prototype: Box<dyn FieldValue>,
        description: &str,
    ) -> Result<SharedField, FieldError> {
        let guard = self.table.lock();
        let entry = self.insert(name, prototype, description)?;
        let instance = entry.instantiate();
        drop(guard);
        Ok(instance)
    }

    /// Id registered for `name`.
    pub fn get_field_id(&self, name: &str) -> Option<FieldId> {
        let guard = self.table.lock();
        let table = guard.borrow();
        table.by_name.get(&fold_name(name)).map(|e| e.id)
    }

    /// Name registered for `id`.
    pub fn get_field_name(&self, id: FieldId) -> Option<String> {
        self.entry(id).map(|e| e.name.clone())
    }

    /// Description registered for `id`.
    pub fn get_field_description(&self, id: FieldId) -> Option<String> {
        self.entry(id).map(|e| e.description.clone())
    }

    /// Number of registered fields.
    pub fn len(&self) -> usize {
        let guard = self.table.lock();
        let len = guard.borrow().by_id.len();
        len
    }

    /// Whether nothing has been registered yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy of every registered field's metadata, ordered by id.
    ///
    /// The lock is held only while copying.
    pub fn snapshot(&self) -> Vec<FieldInfo> {
        let guard = self.table.lock();
        let table = guard.borrow();
        table
            .by_id
            .values()
            .map(|e| FieldInfo {
                id: e.id,
                name: e.name.clone(),
                description: e.description.clone(),
                type_name: e.prototype.value_type_name(),
            })
            .collect()
    }

    /// Bound on lock acquisition before a holder is reported as stuck.
    pub fn lock_timeout(&self) -> Duration {
        self.table.timeout()
    }

    /// Register under the lock without keeping the table borrowed while
    /// prototype code runs. Tagging and dropping the prototype may call
    /// back into the registry.
    fn insert(
        &self,
        name: &str,
        mut prototype: Box<dyn FieldValue>,
        description: &str,
    ) -> Result<Arc<FieldEntry>, FieldError> {
        let guard = self.table.lock();
        let key = fold_name(name);

        let claim = guard.borrow_mut().claim(&key, name, &*prototype);
        let id = match claim? {
            Claim::Existing(entry) => return Ok(entry),
            Claim::Vacant(id) => id,
        };

        prototype.set_field_id(id);
        log::debug!(
            "Registered field '{}' as {} ({})",
            name,
            id,
            prototype.value_type_name()
        );

        let entry = Arc::new(FieldEntry {
            id,
            name: name.to_string(),
            description: description.to_string(),
            prototype,
        });
        let stored = guard.borrow_mut().insert(key, Arc::clone(&entry));
        stored
    }

    fn entry(&self, id: FieldId) -> Option<Arc<FieldEntry>> {
        let guard = self.table.lock();
        let table = guard.borrow();
        table.by_id.get(&id).cloned()
    }

    fn entry_by_name(&self, name: &str) -> Option<Arc<FieldEntry>> {
        let guard = self.table.lock();
        let table = guard.borrow();
        table.by_name.get(&fold_name(name)).cloned()
    }
}

impl Default for FieldRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for FieldRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldRegistry")
            .field("fields", &self.len())
            .field("lock_timeout", &self.lock_timeout())
            .finish()
    }
}
