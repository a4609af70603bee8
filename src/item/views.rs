use super::hook::Hook;
use super::map::{ItemMap, StateKey};
use super::state_item::{StateValue, Updater};
use crate::error::Result;
use std::fmt;

/// Read-only map from key to hook activation.
///
/// The key set is fixed at construction; there is no way to add, remove or
/// replace entries.
pub struct StateItemHooks<K, V> {
    map: ItemMap<K, V>,
}

impl<K: StateKey, V: StateValue> StateItemHooks<K, V> {
    pub(crate) fn new(map: ItemMap<K, V>) -> Self {
        Self { map }
    }

    /// Activate a subscriber for `key`.
    pub fn use_hook(&self, key: &K) -> Result<Hook<V>> {
        Ok(self.map.get(key)?.hook())
    }

    /// Activate a subscriber for `key` that re-renders through `on_render`.
    pub fn use_hook_with<F>(&self, key: &K, on_render: F) -> Result<Hook<V>>
    where
        F: Fn(&V) + Send + Sync + 'static,
    {
        Ok(self.map.get(key)?.hook_with(on_render))
    }

    /// Number of listeners currently registered for `key`.
    pub fn listener_count(&self, key: &K) -> Result<usize> {
        Ok(self.map.get(key)?.listener_count())
    }

    /// Whether `key` was present at construction.
    pub fn contains_key(&self, key: &K) -> bool {
        self.map.get(key).is_ok()
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.map.keys().iter()
    }

    pub fn len(&self) -> usize {
        self.map.keys().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<K, V> Clone for StateItemHooks<K, V> {
    fn clone(&self) -> Self {
        Self {
            map: self.map.clone(),
        }
    }
}

impl<K: StateKey, V: StateValue> fmt::Debug for StateItemHooks<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.map.keys()).finish()
    }
}

/// Read-only map from key to updater.
pub struct StateItemUpdaters<K, V> {
    map: ItemMap<K, V>,
}

impl<K: StateKey, V: StateValue> StateItemUpdaters<K, V> {
    pub(crate) fn new(map: ItemMap<K, V>) -> Self {
        Self { map }
    }

    /// Owned write handle for `key`.
    pub fn get(&self, key: &K) -> Result<Updater<V>> {
        Ok(self.map.get(key)?.updater())
    }

    /// Replace the value under `key`.
    pub fn set(&self, key: &K, value: V) -> Result<()> {
        self.map.get(key)?.updater().set(value)
    }

    /// Compute the new value under `key` from its current one.
    pub fn apply<F>(&self, key: &K, f: F) -> Result<()>
    where
        F: FnOnce(&V) -> V + Send + 'static,
    {
        self.map.get(key)?.updater().apply(f)
    }

    /// Current value under `key`.
    pub fn value(&self, key: &K) -> Result<V> {
        Ok(self.map.get(key)?.get_value())
    }

    /// `(key, updater)` pairs in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&K, Updater<V>)> {
        self.map.iter().map(|(key, item)| (key, item.updater()))
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.map.keys().iter()
    }

    pub fn len(&self) -> usize {
        self.map.keys().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<K, V> Clone for StateItemUpdaters<K, V> {
    fn clone(&self) -> Self {
        Self {
            map: self.map.clone(),
        }
    }
}

impl<K: StateKey, V: StateValue> fmt::Debug for StateItemUpdaters<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.map.keys()).finish()
    }
}
