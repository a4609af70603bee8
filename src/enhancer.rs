//! Ready-made store enhancers.
//!
//! An enhancer receives the base [`StoreApi`] when the store is built and
//! returns whatever the store should expose instead.

use crate::error::Result;
use crate::item::{StateKey, StateValue};
use crate::store::{Snapshot, StoreApi};
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Store surface that logs every dispatch.
pub struct LoggedStore<K, V, A> {
    api: StoreApi<K, V, A>,
    name: Arc<str>,
    dispatched: Arc<AtomicUsize>,
}

impl<K: StateKey, V: StateValue, A: fmt::Debug> LoggedStore<K, V, A> {
    pub fn get_state(&self) -> Arc<Snapshot<K, V>> {
        self.api.get_state()
    }

    /// Dispatch inside a `dispatch` span and log whether the snapshot
    /// changed.
    pub fn dispatch(&self, action: &A) -> Result<()> {
        let span = tracing::debug_span!("dispatch", store = %self.name, ?action);
        let _enter = span.enter();

        self.dispatched.fetch_add(1, Ordering::Relaxed);
        let before = self.api.get_state();
        let result = self.api.dispatch(action);
        let changed = !Arc::ptr_eq(&before, &self.api.get_state());

        match &result {
            Ok(()) => tracing::debug!(changed, "action dispatched"),
            Err(err) => tracing::warn!(changed, error = %err, "action dispatched with errors"),
        }
        result
    }

    /// Number of actions dispatched through this store.
    pub fn dispatched(&self) -> usize {
        self.dispatched.load(Ordering::Relaxed)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The undecorated store surface.
    pub fn api(&self) -> &StoreApi<K, V, A> {
        &self.api
    }
}

impl<K, V, A> Clone for LoggedStore<K, V, A> {
    fn clone(&self) -> Self {
        Self {
            api: self.api.clone(),
            name: Arc::clone(&self.name),
            dispatched: Arc::clone(&self.dispatched),
        }
    }
}

impl<K, V, A> fmt::Debug for LoggedStore<K, V, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoggedStore")
            .field("name", &self.name)
            .field("dispatched", &self.dispatched.load(Ordering::Relaxed))
            .finish()
    }
}

/// Enhancer that wraps dispatch with `tracing` output.
///
/// ```
/// use globstate::{create_store_with_enhancer, enhancer, Snapshot};
/// use std::sync::Arc;
///
/// let store = create_store_with_enhancer(
///     |state: &Arc<Snapshot<&'static str, u32>>, step: &u32| {
///         let value = state.get(&"total").copied().unwrap_or_default();
///         state.with(&"total", value + step).unwrap_or_else(|_| Arc::clone(state))
///     },
///     [("total", 0)],
///     enhancer::logging("totals"),
/// );
///
/// store.dispatch(&3).unwrap();
/// assert_eq!(store.dispatched(), 1);
/// assert_eq!(store.get_state().get(&"total"), Some(&3));
/// ```
pub fn logging<K, V, A>(name: &str) -> impl FnOnce(StoreApi<K, V, A>) -> LoggedStore<K, V, A> {
    let name: Arc<str> = Arc::from(name);
    move |api| LoggedStore {
        api,
        name,
        dispatched: Arc::new(AtomicUsize::new(0)),
    }
}
