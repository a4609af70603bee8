use crate::error::{Result, StateError};
use crate::item::{ItemMap, KeySet, StateItem, StateKey, StateValue};
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;

/// Composite read-only view of every state item of a store at one instant.
///
/// Snapshots are handed out as `Arc<Snapshot>`; pointer identity
/// (`Arc::ptr_eq`) is the change signal. Two reads with no write in between
/// return the same `Arc`.
pub struct Snapshot<K, V> {
    keys: Arc<KeySet<K>>,
    values: Vec<V>,
}

impl<K: StateKey, V: StateValue> Snapshot<K, V> {
    /// Value under `key`, or `None` for a key outside the store.
    pub fn get(&self, key: &K) -> Option<&V> {
        self.keys.position(key).map(|position| &self.values[position])
    }

    /// Like [`get`](Self::get), with an unknown key reported as an error.
    pub fn try_get(&self, key: &K) -> Result<&V> {
        self.get(key).ok_or_else(|| StateError::unknown_key(key))
    }

    /// Copy of this snapshot with one field replaced.
    ///
    /// Reducers build their result with this; returning the input `Arc`
    /// unchanged instead means "nothing happened".
    pub fn with(&self, key: &K, value: V) -> Result<Arc<Self>> {
        let position = self
            .keys
            .position(key)
            .ok_or_else(|| StateError::unknown_key(key))?;
        let mut values = self.values.clone();
        values[position] = value;
        Ok(Arc::new(Self {
            keys: Arc::clone(&self.keys),
            values,
        }))
    }

    /// `(key, value)` pairs in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.keys.keys().iter().zip(self.values.iter())
    }

    /// Keys in store order.
    pub fn keys(&self) -> &[K] {
        self.keys.keys()
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the store was built without keys.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub(crate) fn values(&self) -> &[V] {
        &self.values
    }

    pub(crate) fn shares_keys(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.keys, &other.keys) || self.keys.keys() == other.keys.keys()
    }
}

impl<K: StateKey, V: StateValue + fmt::Debug> fmt::Debug for Snapshot<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

/// Memoized snapshot reader.
///
/// Each read compares every item against the cached snapshot and only
/// allocates a new one when at least one field differs.
pub(crate) struct GetState<K, V> {
    map: ItemMap<K, V>,
    cached: Arc<Mutex<Arc<Snapshot<K, V>>>>,
}

impl<K: StateKey, V: StateValue> GetState<K, V> {
    pub(crate) fn new(map: ItemMap<K, V>) -> Self {
        let initial = Snapshot {
            keys: Arc::clone(map.key_set()),
            values: map.items().iter().map(StateItem::get_value).collect(),
        };
        Self {
            map,
            cached: Arc::new(Mutex::new(Arc::new(initial))),
        }
    }

    pub(crate) fn get(&self) -> Arc<Snapshot<K, V>> {
        let mut cached = self.cached.lock();
        let changed = self
            .map
            .items()
            .iter()
            .zip(cached.values())
            .any(|(item, last)| item.with(|current| current != last));

        if changed {
            let values = self.map.items().iter().map(StateItem::get_value).collect();
            *cached = Arc::new(Snapshot {
                keys: Arc::clone(self.map.key_set()),
                values,
            });
            tracing::trace!("snapshot refreshed");
        }

        Arc::clone(&cached)
    }
}

impl<K, V> Clone for GetState<K, V> {
    fn clone(&self) -> Self {
        Self {
            map: self.map.clone(),
            cached: Arc::clone(&self.cached),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StateConfig;

    fn reader() -> (ItemMap<&'static str, i32>, GetState<&'static str, i32>) {
        let map = ItemMap::build([("a", 1), ("b", 2)], StateConfig::default());
        (map.clone(), GetState::new(map))
    }

    #[test]
    fn repeated_reads_return_same_snapshot() {
        let (_, get_state) = reader();
        let first = get_state.get();
        let second = get_state.get();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn write_produces_new_snapshot() {
        let (map, get_state) = reader();
        let before = get_state.get();

        map.get(&"a").unwrap().updater().set(5).unwrap();
        let after = get_state.get();

        assert!(!Arc::ptr_eq(&before, &after));
        assert_eq!(after.get(&"a"), Some(&5));
        assert_eq!(after.get(&"b"), Some(&2));
        assert_eq!(before.get(&"a"), Some(&1));
    }

    #[test]
    fn write_of_equal_value_keeps_snapshot() {
        let (map, get_state) = reader();
        let before = get_state.get();

        map.get(&"b").unwrap().updater().set(2).unwrap();
        assert!(Arc::ptr_eq(&before, &get_state.get()));
    }

    #[test]
    fn write_and_revert_keeps_snapshot() {
        let (map, get_state) = reader();
        let before = get_state.get();

        let a = map.get(&"a").unwrap().updater();
        a.set(9).unwrap();
        a.set(1).unwrap();
        assert!(Arc::ptr_eq(&before, &get_state.get()));
    }

    #[test]
    fn with_replaces_one_field() {
        let (_, get_state) = reader();
        let snapshot = get_state.get();
        let edited = snapshot.with(&"b", 20).unwrap();

        assert_eq!(edited.iter().collect::<Vec<_>>(), vec![(&"a", &1), (&"b", &20)]);
        assert!(edited.shares_keys(&snapshot));
        assert!(snapshot.with(&"c", 0).is_err());
        assert_eq!(format!("{snapshot:?}"), r#"{"a": 1, "b": 2}"#);
    }
}
