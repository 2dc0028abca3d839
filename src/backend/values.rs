use std::collections::{
    BTreeMap,
    BTreeSet
};

use crate::curve::coefficient::key::Key;

pub type KeySet = BTreeSet<Key>;

/// Value container shared with the optimization back-end: one value per key.
#[derive(Clone, Debug)]
pub struct Values<V> {
    map: BTreeMap<Key, V>
}

impl<V> Default for Values<V> {
    fn default() -> Self {
        Values::new()
    }
}

impl<V> Values<V> {
    pub fn new() -> Values<V> {
        Values { map: BTreeMap::new() }
    }

    /// Inserts or replaces the value stored under `key`.
    pub fn insert(&mut self, key: Key, value: V) -> Option<V> {
        self.map.insert(key, value)
    }

    pub fn at(&self, key: Key) -> Option<&V> {
        self.map.get(&key)
    }

    pub fn exists(&self, key: Key) -> bool {
        self.map.contains_key(&key)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn keys(&self) -> KeySet {
        self.map.keys().copied().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Key, &V)> {
        self.map.iter().map(|(k, v)| (*k, v))
    }
}
