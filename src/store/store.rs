use super::dispatch::{Dispatch, Reducer};
use super::snapshot::{GetState, Snapshot};
use crate::config::StateConfig;
use crate::error::Result;
use crate::item::{ItemMap, StateItemHooks, StateKey, StateValue};
use std::fmt;
use std::marker::PhantomData;
use std::ops::Deref;
use std::sync::Arc;

/// The `{get_state, dispatch}` pair handed to an enhancer.
///
/// Dispatches from several threads are serialized, so each reducer run sees
/// the result of the previous one. Writes made through hook updaters are not
/// part of that ordering and may interleave with a running dispatch.
pub struct StoreApi<K, V, A> {
    get_state: GetState<K, V>,
    dispatch: Dispatch<K, V, A>,
}

impl<K: StateKey, V: StateValue, A> StoreApi<K, V, A> {
    /// Memoized composite read.
    ///
    /// Returns the same `Arc` until some item's value changes.
    pub fn get_state(&self) -> Arc<Snapshot<K, V>> {
        self.get_state.get()
    }

    /// Run the reducer and write back the fields it changed.
    ///
    /// Only items whose value differs are written, so listeners of other
    /// items hear nothing. A reducer that returns the snapshot it was given
    /// writes nothing at all.
    pub fn dispatch(&self, action: &A) -> Result<()> {
        self.dispatch.dispatch(action)
    }
}

impl<K, V, A> Clone for StoreApi<K, V, A> {
    fn clone(&self) -> Self {
        Self {
            get_state: self.get_state.clone(),
            dispatch: self.dispatch.clone(),
        }
    }
}

impl<K, V, A> fmt::Debug for StoreApi<K, V, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreApi").finish_non_exhaustive()
    }
}

/// A reducer-driven store.
///
/// Holds the per-key hooks and whatever the enhancer built from the base
/// [`StoreApi`]. The store dereferences to the enhanced value, so methods the
/// enhancer defines are the ones callers reach.
///
/// # Examples
///
/// ```
/// use globstate::{create_store, Snapshot};
/// use std::sync::Arc;
///
/// enum Action {
///     Increment,
/// }
///
/// let store = create_store(
///     |state: &Arc<Snapshot<&'static str, i64>>, action: &Action| match action {
///         Action::Increment => {
///             let count = state.get(&"count").copied().unwrap_or_default();
///             state.with(&"count", count + 1).unwrap_or_else(|_| Arc::clone(state))
///         }
///     },
///     [("count", 0), ("other", 0)],
/// );
///
/// let hook = store.state_item_hooks().use_hook(&"count").unwrap();
/// store.dispatch(&Action::Increment).unwrap();
/// assert_eq!(hook.value(), 1);
/// assert_eq!(store.get_state().get(&"count"), Some(&1));
/// ```
pub struct Store<K, V, A, E = StoreApi<K, V, A>> {
    state_item_hooks: StateItemHooks<K, V>,
    enhanced: E,
    _action: PhantomData<fn(&A)>,
}

impl<K, V, A, E> Store<K, V, A, E> {
    /// Per-key hooks for views.
    pub fn state_item_hooks(&self) -> &StateItemHooks<K, V> {
        &self.state_item_hooks
    }

    /// The enhancer's output.
    pub fn enhanced(&self) -> &E {
        &self.enhanced
    }

    /// Split into the hooks map and the enhancer's output.
    pub fn into_parts(self) -> (StateItemHooks<K, V>, E) {
        (self.state_item_hooks, self.enhanced)
    }
}

impl<K, V, A, E> Deref for Store<K, V, A, E> {
    type Target = E;

    fn deref(&self) -> &E {
        &self.enhanced
    }
}

impl<K: StateKey, V: StateValue, A, E: fmt::Debug> fmt::Debug for Store<K, V, A, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("state_item_hooks", &self.state_item_hooks)
            .field("enhanced", &self.enhanced)
            .finish()
    }
}

/// Create a store with the identity enhancer.
pub fn create_store<K, V, A, R, I>(reducer: R, initial: I) -> Store<K, V, A>
where
    K: StateKey,
    V: StateValue,
    R: Fn(&Arc<Snapshot<K, V>>, &A) -> Arc<Snapshot<K, V>> + Send + Sync + 'static,
    I: IntoIterator<Item = (K, V)>,
{
    create_store_with_config(reducer, initial, std::convert::identity, StateConfig::default())
}

/// Create a store whose `{get_state, dispatch}` pair is passed through
/// `enhancer`.
pub fn create_store_with_enhancer<K, V, A, R, I, E, F>(
    reducer: R,
    initial: I,
    enhancer: F,
) -> Store<K, V, A, E>
where
    K: StateKey,
    V: StateValue,
    R: Fn(&Arc<Snapshot<K, V>>, &A) -> Arc<Snapshot<K, V>> + Send + Sync + 'static,
    I: IntoIterator<Item = (K, V)>,
    F: FnOnce(StoreApi<K, V, A>) -> E,
{
    create_store_with_config(reducer, initial, enhancer, StateConfig::default())
}

/// Create a store with an enhancer and explicit configuration.
pub fn create_store_with_config<K, V, A, R, I, E, F>(
    reducer: R,
    initial: I,
    enhancer: F,
    config: StateConfig,
) -> Store<K, V, A, E>
where
    K: StateKey,
    V: StateValue,
    R: Fn(&Arc<Snapshot<K, V>>, &A) -> Arc<Snapshot<K, V>> + Send + Sync + 'static,
    I: IntoIterator<Item = (K, V)>,
    F: FnOnce(StoreApi<K, V, A>) -> E,
{
    let map = ItemMap::build(initial, config);
    let get_state = GetState::new(map.clone());
    let reducer: Arc<Reducer<K, V, A>> = Arc::new(reducer);
    let dispatch = Dispatch::new(map.clone(), get_state.clone(), reducer);

    Store {
        state_item_hooks: StateItemHooks::new(map),
        enhanced: enhancer(StoreApi {
            get_state,
            dispatch,
        }),
        _action: PhantomData,
    }
}
