use crate::config::StateConfig;
use crate::item::{ItemMap, StateItemHooks, StateItemUpdaters, StateKey, StateValue};
use std::fmt;

/// Independent state items exposed as read-only hook and updater maps.
///
/// There is no reducer and no composite snapshot: every key is written on
/// its own and only that key's subscribers hear about it.
pub struct GlobalState<K, V> {
    state_item_updaters: StateItemUpdaters<K, V>,
    state_item_hooks: StateItemHooks<K, V>,
}

impl<K: StateKey, V: StateValue> GlobalState<K, V> {
    /// Per-key updaters.
    pub fn state_item_updaters(&self) -> &StateItemUpdaters<K, V> {
        &self.state_item_updaters
    }

    /// Per-key hooks for views.
    pub fn state_item_hooks(&self) -> &StateItemHooks<K, V> {
        &self.state_item_hooks
    }

    /// Split into the updaters and hooks maps.
    pub fn into_parts(self) -> (StateItemUpdaters<K, V>, StateItemHooks<K, V>) {
        (self.state_item_updaters, self.state_item_hooks)
    }
}

impl<K: StateKey, V: StateValue> fmt::Debug for GlobalState<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GlobalState")
            .field("keys", &self.state_item_hooks)
            .finish()
    }
}

/// Create one independent state item per key.
///
/// Keys keep the order of `initial`; pass an array, `Vec` or `BTreeMap` when
/// that order matters.
///
/// # Examples
///
/// ```
/// use globstate::create_global_state;
///
/// let state = create_global_state([("counter", 0), ("other", 10)]);
/// let hook = state.state_item_hooks().use_hook(&"counter").unwrap();
///
/// state.state_item_updaters().apply(&"counter", |n| n + 1).unwrap();
/// assert_eq!(hook.value(), 1);
/// ```
pub fn create_global_state<K, V, I>(initial: I) -> GlobalState<K, V>
where
    K: StateKey,
    V: StateValue,
    I: IntoIterator<Item = (K, V)>,
{
    create_global_state_with_config(initial, StateConfig::default())
}

/// Like [`create_global_state`], with explicit configuration for every item.
pub fn create_global_state_with_config<K, V, I>(initial: I, config: StateConfig) -> GlobalState<K, V>
where
    K: StateKey,
    V: StateValue,
    I: IntoIterator<Item = (K, V)>,
{
    let map = ItemMap::build(initial, config);
    GlobalState {
        state_item_updaters: StateItemUpdaters::new(map.clone()),
        state_item_hooks: StateItemHooks::new(map),
    }
}
