//! Dictionary object implementation.
//!
//! String-keyed, insertion-ordered mapping used for keyword arguments,
//! `__kwdefaults__`, `__annotations__`, function `__dict__` and module
//! namespaces. Keys are identifiers, so lookups hash the key text directly.

use crate::object::type_obj::TypeId;
use crate::object::{ObjectHeader, PyObject};
use crate::value::Value;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use std::any::Any;
use std::sync::Arc;

#[derive(Debug, Default, Clone)]
struct DictStorage {
    /// Entries in insertion order.
    entries: Vec<(Arc<str>, Value)>,
    /// Key to position in `entries`.
    index: FxHashMap<Arc<str>, usize>,
}

/// Dict object.
///
/// Mutation goes through an internal lock so a shared dict (module globals,
/// a function's `__dict__`) can be updated through `&self`.
#[derive(Debug)]
pub struct DictObject {
    header: ObjectHeader,
    storage: RwLock<DictStorage>,
}

impl DictObject {
    /// Create an empty dict.
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Create an empty dict with room for `capacity` entries.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            header: ObjectHeader::new(TypeId::DICT),
            storage: RwLock::new(DictStorage {
                entries: Vec::with_capacity(capacity),
                index: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
            }),
        }
    }

    /// Build from `(key, value)` pairs. Later duplicates overwrite earlier ones.
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (Arc<str>, Value)>,
    {
        let dict = Self::new();
        for (key, value) in pairs {
            dict.set(key, value);
        }
        dict
    }

    /// Get a value by key.
    #[inline]
    pub fn get(&self, key: &str) -> Option<Value> {
        let storage = self.storage.read();
        storage
            .index
            .get(key)
            .map(|&pos| storage.entries[pos].1.clone())
    }

    /// Insert or overwrite a value. Overwriting keeps the original position.
    pub fn set(&self, key: Arc<str>, value: Value) {
        let mut storage = self.storage.write();
        if let Some(&pos) = storage.index.get(&key) {
            storage.entries[pos].1 = value;
        } else {
            let pos = storage.entries.len();
            storage.index.insert(Arc::clone(&key), pos);
            storage.entries.push((key, value));
        }
    }

    /// Remove a key, preserving the order of the remaining entries.
    pub fn remove(&self, key: &str) -> Option<Value> {
        let mut storage = self.storage.write();
        let pos = storage.index.remove(key)?;
        let (_, value) = storage.entries.remove(pos);
        for slot in storage.index.values_mut() {
            if *slot > pos {
                *slot -= 1;
            }
        }
        Some(value)
    }

    #[inline]
    pub fn contains(&self, key: &str) -> bool {
        self.storage.read().index.contains_key(key)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.storage.read().entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Keys in insertion order.
    pub fn keys(&self) -> Vec<Arc<str>> {
        self.storage
            .read()
            .entries
            .iter()
            .map(|(k, _)| Arc::clone(k))
            .collect()
    }

    /// Snapshot of all entries in insertion order.
    pub fn items(&self) -> Vec<(Arc<str>, Value)> {
        self.storage.read().entries.clone()
    }

    /// Shallow copy.
    pub fn copy(&self) -> DictObject {
        Self {
            header: ObjectHeader::new(TypeId::DICT),
            storage: RwLock::new(self.storage.read().clone()),
        }
    }
}

impl Default for DictObject {
    fn default() -> Self {
        Self::new()
    }
}

impl PyObject for DictObject {
    fn header(&self) -> &ObjectHeader {
        &self.header
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any_arc(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }

    fn repr(&self) -> String {
        let parts: Vec<String> = self
            .items()
            .iter()
            .map(|(k, v)| format!("'{}': {}", k, v.repr()))
            .collect();
        format!("{{{}}}", parts.join(", "))
    }
}
