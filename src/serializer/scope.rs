//! Scope guard pairing pre- and post-serialize hooks.

use super::{NamedPath, RenameMap};
use crate::value::SharedField;

/// Brackets the serialization of one value.
///
/// Creating the scope runs the pre-serialize hook; dropping it runs the
/// matching post-serialize hook, including when the write returns an error
/// or unwinds. A path-aware pre-hook that unwinds part way runs the
/// post-hooks of the elements already entered.
///
/// When the rename map has a non-empty path for the value the
/// path-aware hooks run instead of the value's own, and the choice made on
/// entry is the one mirrored on exit.
#[must_use = "hooks are paired with the lifetime of the scope"]
pub struct SerializationScope<'a> {
    value: &'a SharedField,
    path: Option<&'a NamedPath>,
}

impl<'a> SerializationScope<'a> {
    /// Enter the scope for `value`, running its pre-serialize hook.
    pub fn enter(value: &'a SharedField, rename: Option<&'a RenameMap>) -> Self {
        let path = rename
            .and_then(|map| map.get(value))
            .filter(|path| !path.resolved_path.is_empty());

        match path {
            Some(path) => path.pre_serialize(),
            None => value.pre_serialize(),
        }

        Self { value, path }
    }

    /// Whether the path-aware hooks were selected.
    pub fn is_path_aware(&self) -> bool {
        self.path.is_some()
    }
}

impl Drop for SerializationScope<'_> {
    fn drop(&mut self) {
        match self.path {
            Some(path) => path.post_serialize(),
            None => self.value.post_serialize(),
        }
    }
}
