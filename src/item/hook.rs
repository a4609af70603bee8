use super::state_item::{Listener, ListenerId, StateItem, StateValue, Subscription, Updater};
use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;

/// Subscriber-local copy of a state value.
///
/// This is the view layer's reactive cell: a write stores the value and then
/// asks the view to re-render.
pub struct LocalState<V> {
    value: Arc<RwLock<V>>,
    on_render: Option<Listener<V>>,
}

impl<V: StateValue> LocalState<V> {
    /// Create a cell without a re-render callback.
    pub fn new(initial: V) -> Self {
        Self {
            value: Arc::new(RwLock::new(initial)),
            on_render: None,
        }
    }

    /// Create a cell that calls `on_render` after every [`set`](Self::set).
    pub fn with_render<F>(initial: V, on_render: F) -> Self
    where
        F: Fn(&V) + Send + Sync + 'static,
    {
        Self {
            value: Arc::new(RwLock::new(initial)),
            on_render: Some(Arc::new(on_render)),
        }
    }

    /// Clone of the cell's value.
    pub fn get(&self) -> V {
        self.value.read().clone()
    }

    /// Store `value`, then re-render if a callback is set.
    pub fn set(&self, value: V) {
        *self.value.write() = value;
        if let Some(render) = &self.on_render {
            let current = self.get();
            render(&current);
        }
    }
}

impl<V> Clone for LocalState<V> {
    fn clone(&self) -> Self {
        Self {
            value: Arc::clone(&self.value),
            on_render: self.on_render.clone(),
        }
    }
}

/// An active subscription of one view to one state item.
///
/// Activation copies the item's current value into a [`LocalState`] and
/// registers a single listener that keeps it in sync. Dropping the hook is
/// the cleanup: the listener is removed and no further values arrive.
///
/// # Examples
///
/// ```
/// use globstate::StateItem;
///
/// let item = StateItem::new(1);
/// let hook = item.hook();
/// assert_eq!(hook.value(), 1);
///
/// hook.updater().set(2).unwrap();
/// assert_eq!(hook.value(), 2);
///
/// drop(hook);
/// assert_eq!(item.listener_count(), 0);
/// ```
pub struct Hook<V> {
    local: LocalState<V>,
    updater: Updater<V>,
    subscription: Subscription,
}

impl<V: StateValue> Hook<V> {
    /// The value as last seen by this subscriber.
    pub fn value(&self) -> V {
        self.local.get()
    }

    /// Write handle for the underlying item.
    pub fn updater(&self) -> &Updater<V> {
        &self.updater
    }

    /// `(value, updater)`, the shape a view component destructures.
    pub fn pair(&self) -> (V, Updater<V>) {
        (self.value(), self.updater.clone())
    }

    /// Listener registration owned by this hook.
    pub fn subscription_id(&self) -> ListenerId {
        self.subscription.id()
    }
}

impl<V> fmt::Debug for Hook<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hook")
            .field("updater", &self.updater)
            .field("subscription", &self.subscription)
            .finish_non_exhaustive()
    }
}

impl<V: StateValue> StateItem<V> {
    /// Activate a subscriber for this item.
    pub fn hook(&self) -> Hook<V> {
        self.activate(LocalState::new(self.get_value()))
    }

    /// Activate a subscriber whose view re-renders through `on_render`.
    pub fn hook_with<F>(&self, on_render: F) -> Hook<V>
    where
        F: Fn(&V) + Send + Sync + 'static,
    {
        self.activate(LocalState::with_render(self.get_value(), on_render))
    }

    fn activate(&self, local: LocalState<V>) -> Hook<V> {
        let setter = local.clone();
        let subscription = self.subscribe(move |value| setter.set(value.clone()));
        Hook {
            local,
            updater: self.updater(),
            subscription,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn hook_tracks_item_until_dropped() {
        let item = StateItem::new("a".to_string());
        let hook = item.hook();
        assert_eq!(item.listener_count(), 1);

        item.updater().set("b".to_string()).unwrap();
        assert_eq!(hook.value(), "b");

        let (value, updater) = hook.pair();
        assert_eq!(value, "b");
        drop(hook);
        assert_eq!(item.listener_count(), 0);

        updater.set("c".to_string()).unwrap();
        assert_eq!(item.get_value(), "c");
    }

    #[test]
    fn hook_with_renders_on_each_push() {
        let item = StateItem::new(0);
        let renders = Arc::new(AtomicUsize::new(0));
        let renders_clone = renders.clone();

        let hook = item.hook_with(move |_| {
            renders_clone.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(renders.load(Ordering::SeqCst), 0);

        hook.updater().apply(|n| n + 1).unwrap();
        hook.updater().apply(|n| n + 1).unwrap();
        assert_eq!(renders.load(Ordering::SeqCst), 2);
        assert_eq!(hook.value(), 2);
    }

    #[test]
    fn each_hook_registers_once() {
        let item = StateItem::new(0);
        let first = item.hook();
        let second = item.hook();

        assert_eq!(item.listener_count(), 2);
        assert_ne!(first.subscription_id(), second.subscription_id());

        drop(first);
        assert_eq!(item.listener_count(), 1);
        item.updater().set(9).unwrap();
        assert_eq!(second.value(), 9);
    }

    #[test]
    fn local_state_is_shared_between_clones() {
        let local = LocalState::new(1);
        let other = local.clone();
        other.set(5);
        assert_eq!(local.get(), 5);
    }
}
