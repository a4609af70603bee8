use super::snapshot::{GetState, Snapshot};
use crate::error::{Result, StateError};
use crate::item::{ItemMap, StateKey, StateValue, Update};
use parking_lot::ReentrantMutex;
use std::sync::Arc;

/// Pure function from the current snapshot and an action to the next
/// snapshot. Returning the input `Arc` means "no change".
pub type Reducer<K, V, A> = dyn Fn(&Arc<Snapshot<K, V>>, &A) -> Arc<Snapshot<K, V>> + Send + Sync;

/// Runs the reducer and writes back only the fields that changed.
///
/// Dispatches are serialized across threads. The lock is reentrant, so a
/// listener may dispatch again from inside a fan-out.
pub(crate) struct Dispatch<K, V, A> {
    map: ItemMap<K, V>,
    get_state: GetState<K, V>,
    reducer: Arc<Reducer<K, V, A>>,
    serial: Arc<ReentrantMutex<()>>,
}

impl<K: StateKey, V: StateValue, A> Dispatch<K, V, A> {
    pub(crate) fn new(
        map: ItemMap<K, V>,
        get_state: GetState<K, V>,
        reducer: Arc<Reducer<K, V, A>>,
    ) -> Self {
        Self {
            map,
            get_state,
            reducer,
            serial: Arc::new(ReentrantMutex::new(())),
        }
    }

    /// Items are written in key order; each finishes its fan-out before the
    /// next one is written. A listener failure does not stop later items,
    /// and the first failure is returned once every changed item is written.
    pub(crate) fn dispatch(&self, action: &A) -> Result<()> {
        let _serial = self.serial.lock();
        let old_state = self.get_state.get();
        let new_state = (self.reducer)(&old_state, action);

        if Arc::ptr_eq(&old_state, &new_state) {
            tracing::debug!("reducer returned the current snapshot, nothing to write");
            return Ok(());
        }
        if !old_state.shares_keys(&new_state) {
            return Err(StateError::KeyMismatch);
        }

        let mut written = 0;
        let mut first_error = None;
        for ((before, after), item) in old_state
            .values()
            .iter()
            .zip(new_state.values())
            .zip(self.map.items())
        {
            if before == after {
                continue;
            }
            written += 1;
            if let Err(err) = item.update(Update::Set(after.clone())) {
                first_error.get_or_insert(err);
            }
        }

        tracing::debug!(written, "dispatch applied");
        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

impl<K, V, A> Clone for Dispatch<K, V, A> {
    fn clone(&self) -> Self {
        Self {
            map: self.map.clone(),
            get_state: self.get_state.clone(),
            reducer: Arc::clone(&self.reducer),
            serial: Arc::clone(&self.serial),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StateConfig;
    use crate::item::Subscription;
    use std::sync::atomic::{AtomicUsize, Ordering};

    enum Action {
        SetA(i32),
        SetB(i32),
        Noop,
        Foreign,
    }

    type Items = ItemMap<&'static str, i32>;
    type State = Arc<Snapshot<&'static str, i32>>;

    fn setup() -> (Items, GetState<&'static str, i32>, Dispatch<&'static str, i32, Action>) {
        let map = ItemMap::build([("a", 0), ("b", 0)], StateConfig::default());
        let foreign = GetState::new(ItemMap::build([("z", 0)], StateConfig::default())).get();
        let get_state = GetState::new(map.clone());
        let reducer: Arc<Reducer<&'static str, i32, Action>> =
            Arc::new(move |state: &State, action: &Action| match action {
                Action::SetA(v) => state.with(&"a", *v).unwrap_or_else(|_| Arc::clone(state)),
                Action::SetB(v) => state.with(&"b", *v).unwrap_or_else(|_| Arc::clone(state)),
                Action::Noop => Arc::clone(state),
                Action::Foreign => Arc::clone(&foreign),
            });
        let dispatch = Dispatch::new(map.clone(), get_state.clone(), reducer);
        (map, get_state, dispatch)
    }

    fn counter(map: &Items, key: &'static str) -> (Arc<AtomicUsize>, Subscription) {
        let count = Arc::new(AtomicUsize::new(0));
        let count_clone = count.clone();
        let subscription = map.get(&key).unwrap().subscribe(move |_| {
            count_clone.fetch_add(1, Ordering::SeqCst);
        });
        (count, subscription)
    }

    #[test]
    fn only_changed_items_are_notified() {
        let (map, get_state, dispatch) = setup();
        let (a_calls, _a) = counter(&map, "a");
        let (b_calls, _b) = counter(&map, "b");

        dispatch.dispatch(&Action::SetA(3)).unwrap();

        assert_eq!(a_calls.load(Ordering::SeqCst), 1);
        assert_eq!(b_calls.load(Ordering::SeqCst), 0);
        assert_eq!(get_state.get().get(&"a"), Some(&3));
    }

    #[test]
    fn same_snapshot_short_circuits() {
        let (map, get_state, dispatch) = setup();
        let (a_calls, _a) = counter(&map, "a");
        let before = get_state.get();

        dispatch.dispatch(&Action::Noop).unwrap();

        assert_eq!(a_calls.load(Ordering::SeqCst), 0);
        assert!(Arc::ptr_eq(&before, &get_state.get()));
    }

    #[test]
    fn equal_new_snapshot_writes_nothing() {
        let (map, get_state, dispatch) = setup();
        let (a_calls, _a) = counter(&map, "a");
        let before = get_state.get();

        dispatch.dispatch(&Action::SetA(0)).unwrap();

        assert_eq!(a_calls.load(Ordering::SeqCst), 0);
        assert!(Arc::ptr_eq(&before, &get_state.get()));
    }

    #[test]
    fn foreign_snapshot_is_rejected() {
        let (map, _, dispatch) = setup();
        assert_eq!(
            dispatch.dispatch(&Action::Foreign).unwrap_err(),
            StateError::KeyMismatch
        );
        assert_eq!(map.get(&"a").unwrap().get_value(), 0);
    }

    #[test]
    fn listener_may_dispatch_again() {
        let (map, get_state, dispatch) = setup();
        let _follow = {
            let dispatch = dispatch.clone();
            map.get(&"a").unwrap().subscribe(move |v: &i32| {
                dispatch.dispatch(&Action::SetB(v * 100)).unwrap();
            })
        };

        dispatch.dispatch(&Action::SetA(2)).unwrap();

        let state = get_state.get();
        assert_eq!(state.get(&"a"), Some(&2));
        assert_eq!(state.get(&"b"), Some(&200));
    }
}
