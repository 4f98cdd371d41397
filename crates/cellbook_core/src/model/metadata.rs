//! Observable metadata container.
//!
//! # Responsibility
//! - Hold the JSON key/value metadata owned by exactly one cell.
//! - Emit one change event per effective mutation.
//!
//! # Invariants
//! - Values are the closed JSON sum type; nothing non-serializable can be
//!   stored, so `to_map` is a structural copy, not a coercion.
//! - Setting a key to an equal value emits nothing.
//! - After `dispose`, every mutation is a no-op and the container is empty.

use crate::signal::Signal;
use serde_json::{Map, Value};
use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;

/// Kind of one metadata mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetadataChangeKind {
    Added,
    Updated,
    Removed,
}

/// Change event payload for one metadata mutation.
#[derive(Debug, Clone, PartialEq)]
pub struct MetadataChange {
    pub key: String,
    pub kind: MetadataChangeKind,
    pub old_value: Option<Value>,
    pub new_value: Option<Value>,
}

/// Observable string-to-JSON map, exclusively owned by one cell model.
#[derive(Default)]
pub struct MetadataContainer {
    entries: RefCell<BTreeMap<String, Value>>,
    changed: Signal<MetadataChange>,
    disposed: Cell<bool>,
}

impl MetadataContainer {
    /// Creates an empty container.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a clone of the value stored under `key`.
    pub fn get(&self, key: &str) -> Option<Value> {
        self.entries.borrow().get(key).cloned()
    }

    /// Stores `value` under `key` and returns the previous value.
    ///
    /// Emits one `Added`/`Updated` event unless the value is unchanged.
    /// No-op when the container is disposed.
    pub fn set(&self, key: &str, value: Value) -> Option<Value> {
        if self.disposed.get() {
            return None;
        }
        let old_value = self.entries.borrow_mut().insert(key.to_string(), value.clone());
        if old_value.as_ref() == Some(&value) {
            return old_value;
        }
        let kind = if old_value.is_some() {
            MetadataChangeKind::Updated
        } else {
            MetadataChangeKind::Added
        };
        self.changed.emit(&MetadataChange {
            key: key.to_string(),
            kind,
            old_value: old_value.clone(),
            new_value: Some(value),
        });
        old_value
    }

    /// Removes `key` and returns the previous value.
    ///
    /// Emits one `Removed` event when the key existed. No-op when disposed.
    pub fn remove(&self, key: &str) -> Option<Value> {
        if self.disposed.get() {
            return None;
        }
        let old_value = self.entries.borrow_mut().remove(key)?;
        self.changed.emit(&MetadataChange {
            key: key.to_string(),
            kind: MetadataChangeKind::Removed,
            old_value: Some(old_value.clone()),
            new_value: None,
        });
        Some(old_value)
    }

    /// Returns the stored keys in sorted order.
    pub fn keys(&self) -> Vec<String> {
        self.entries.borrow().keys().cloned().collect()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.borrow().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    /// Returns the change signal for this container.
    pub fn changed(&self) -> &Signal<MetadataChange> {
        &self.changed
    }

    /// Returns a structural copy of the entries for serialization.
    pub fn to_map(&self) -> Map<String, Value> {
        self.entries
            .borrow()
            .iter()
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }

    /// Releases the container. Idempotent; clears all entries silently.
    pub fn dispose(&self) {
        if self.disposed.replace(true) {
            return;
        }
        self.entries.borrow_mut().clear();
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.get()
    }
}
