use super::state_item::{StateItem, StateValue};
use crate::config::StateConfig;
use crate::error::{Result, StateError};
use rustc_hash::FxHashMap;
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::Arc;

/// Keys that name the state items of a container.
pub trait StateKey: Eq + Hash + Clone + Debug + Send + Sync + 'static {}

impl<T: Eq + Hash + Clone + Debug + Send + Sync + 'static> StateKey for T {}

/// Fixed, ordered key set of one container.
pub(crate) struct KeySet<K> {
    keys: Vec<K>,
    index: FxHashMap<K, usize>,
}

impl<K: StateKey> KeySet<K> {
    pub(crate) fn position(&self, key: &K) -> Option<usize> {
        self.index.get(key).copied()
    }

    pub(crate) fn keys(&self) -> &[K] {
        &self.keys
    }
}

/// One state item per key, in the key order given at construction.
pub(crate) struct ItemMap<K, V> {
    keys: Arc<KeySet<K>>,
    items: Arc<[StateItem<V>]>,
}

impl<K: StateKey, V: StateValue> ItemMap<K, V> {
    /// Build the items. A repeated key keeps its first position and takes
    /// the last value.
    pub(crate) fn build<I>(initial: I, config: StateConfig) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
    {
        let mut keys = Vec::new();
        let mut index = FxHashMap::default();
        let mut values: Vec<V> = Vec::new();

        for (key, value) in initial {
            match index.get(&key) {
                Some(&position) => values[position] = value,
                None => {
                    index.insert(key.clone(), keys.len());
                    keys.push(key);
                    values.push(value);
                }
            }
        }

        let items = keys
            .iter()
            .zip(values)
            .map(|(key, value)| StateItem::labeled(format!("{key:?}"), value, config.fanout))
            .collect();

        tracing::debug!(items = keys.len(), fanout = ?config.fanout, "state items created");

        Self {
            keys: Arc::new(KeySet { keys, index }),
            items,
        }
    }

    pub(crate) fn get(&self, key: &K) -> Result<&StateItem<V>> {
        self.keys
            .position(key)
            .map(|position| &self.items[position])
            .ok_or_else(|| StateError::unknown_key(key))
    }

    pub(crate) fn items(&self) -> &[StateItem<V>] {
        &self.items
    }

    pub(crate) fn key_set(&self) -> &Arc<KeySet<K>> {
        &self.keys
    }

    pub(crate) fn keys(&self) -> &[K] {
        self.keys.keys()
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (&K, &StateItem<V>)> {
        self.keys.keys().iter().zip(self.items.iter())
    }
}

impl<K, V> Clone for ItemMap<K, V> {
    fn clone(&self) -> Self {
        Self {
            keys: Arc::clone(&self.keys),
            items: Arc::clone(&self.items),
        }
    }
}
