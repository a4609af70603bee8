use crate::config::FanoutPolicy;
use crate::error::{Result, StateError};
use parking_lot::{RwLock, RwLockUpgradableReadGuard};
use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

/// Values that can be held by a state item.
///
/// Equality is what the store uses to decide whether a field changed.
pub trait StateValue: Clone + PartialEq + Send + Sync + 'static {}

impl<T: Clone + PartialEq + Send + Sync + 'static> StateValue for T {}

pub(crate) type Listener<V> = Arc<dyn Fn(&V) + Send + Sync>;

/// A write to a state item: either a replacement value or a function of the
/// current value.
pub enum Update<V> {
    /// Replace the value.
    Set(V),
    /// Compute the new value from the current one.
    Apply(Box<dyn FnOnce(&V) -> V + Send>),
}

impl<V> Update<V> {
    /// Build a functional update.
    pub fn apply<F>(f: F) -> Self
    where
        F: FnOnce(&V) -> V + Send + 'static,
    {
        Update::Apply(Box::new(f))
    }
}

impl<V> From<V> for Update<V> {
    fn from(value: V) -> Self {
        Update::Set(value)
    }
}

impl<V: fmt::Debug> fmt::Debug for Update<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Update::Set(value) => f.debug_tuple("Set").field(value).finish(),
            Update::Apply(_) => f.write_str("Apply(..)"),
        }
    }
}

/// Identifies one registration in a state item's listener list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(usize);

struct Inner<V> {
    value: V,
    // Insertion order is notification order.
    listeners: Vec<(ListenerId, Listener<V>)>,
    next_listener: usize,
}

/// A single mutable cell with an ordered list of listeners.
///
/// Every write commits the new value and then synchronously calls each
/// listener registered at the time of the write, in registration order.
/// Listeners registered or removed while a fan-out is running only affect
/// later writes.
///
/// A listener may write to any state item, including this one; the nested
/// write runs its own fan-out to completion before the outer one resumes.
/// Every listener is called with the value current at the time of its call,
/// so after a nested write all listeners have last seen the final value.
///
/// # Examples
///
/// ```
/// use globstate::StateItem;
///
/// let item = StateItem::new(5);
/// item.updater().apply(|n| n + 1).unwrap();
/// assert_eq!(item.get_value(), 6);
///
/// item.updater().set(7).unwrap();
/// assert_eq!(item.get_value(), 7);
/// ```
pub struct StateItem<V> {
    inner: Arc<RwLock<Inner<V>>>,
    label: Arc<str>,
    policy: FanoutPolicy,
}

impl<V: StateValue> StateItem<V> {
    /// Create a standalone item with the default fan-out policy.
    pub fn new(initial: V) -> Self {
        Self::labeled("item", initial, FanoutPolicy::default())
    }

    pub(crate) fn labeled(label: impl Into<Arc<str>>, initial: V, policy: FanoutPolicy) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Inner {
                value: initial,
                listeners: Vec::new(),
                next_listener: 0,
            })),
            label: label.into(),
            policy,
        }
    }

    /// Name used for this item in logs and errors.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Get a clone of the current value.
    pub fn get_value(&self) -> V {
        self.inner.read().value.clone()
    }

    /// Read the current value without cloning.
    pub fn with<R>(&self, f: impl FnOnce(&V) -> R) -> R {
        f(&self.inner.read().value)
    }

    /// Get a write handle for this item.
    pub fn updater(&self) -> Updater<V> {
        Updater { item: self.clone() }
    }

    /// Apply an update and notify every listener.
    ///
    /// An [`Update::Apply`] function may read this item but must not write to
    /// it.
    pub fn update(&self, update: impl Into<Update<V>>) -> Result<()> {
        let listeners: Vec<Listener<V>> = {
            let current = self.inner.upgradable_read();
            let next = match update.into() {
                Update::Set(value) => value,
                Update::Apply(f) => f(&current.value),
            };
            let mut inner = RwLockUpgradableReadGuard::upgrade(current);
            inner.value = next;
            inner
                .listeners
                .iter()
                .map(|(_, listener)| Arc::clone(listener))
                .collect()
        };
        self.fan_out(&listeners)
    }

    /// Register a listener called with the new value after every write.
    ///
    /// Each call registers a separate listener, even for the same closure.
    /// The listener stays registered until the returned [`Subscription`] is
    /// dropped.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&V) + Send + Sync + 'static,
    {
        let id = {
            let mut inner = self.inner.write();
            let id = ListenerId(inner.next_listener);
            inner.next_listener += 1;
            inner.listeners.push((id, Arc::new(listener)));
            id
        };

        let item = Arc::downgrade(&self.inner);
        Subscription::new(id, move || {
            if let Some(inner) = item.upgrade() {
                let removed = {
                    let mut inner = inner.write();
                    inner
                        .listeners
                        .iter()
                        .position(|(listener, _)| *listener == id)
                        .map(|index| inner.listeners.remove(index))
                };
                // Dropped outside the lock; the listener may own other subscriptions.
                drop(removed);
            }
        })
    }

    /// Number of currently registered listeners.
    pub fn listener_count(&self) -> usize {
        self.inner.read().listeners.len()
    }

    // Each listener gets the value current at its own call, so a write-back
    // from an earlier listener is what the later ones see.
    fn fan_out(&self, listeners: &[Listener<V>]) -> Result<()> {
        tracing::trace!(item = %self.label, listeners = listeners.len(), "notifying listeners");

        match self.policy {
            FanoutPolicy::Strict => {
                for listener in listeners {
                    listener(&self.get_value());
                }
                Ok(())
            }
            FanoutPolicy::Isolate => {
                let mut failed = 0;
                for (index, listener) in listeners.iter().enumerate() {
                    let value = self.get_value();
                    let result = panic::catch_unwind(AssertUnwindSafe(|| listener(&value)));
                    if let Err(payload) = result {
                        failed += 1;
                        tracing::error!(
                            item = %self.label,
                            index,
                            panic = panic_message(payload.as_ref()),
                            "listener panicked during fan-out"
                        );
                    }
                }

                if failed == 0 {
                    Ok(())
                } else {
                    Err(StateError::ListenerPanicked {
                        item: self.label.to_string(),
                        failed,
                    })
                }
            }
        }
    }
}

impl<V> Clone for StateItem<V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            label: Arc::clone(&self.label),
            policy: self.policy,
        }
    }
}

impl<V> fmt::Debug for StateItem<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateItem")
            .field("label", &self.label)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("<non-string panic payload>")
}

/// Write handle for one state item.
pub struct Updater<V> {
    item: StateItem<V>,
}

impl<V: StateValue> Updater<V> {
    /// Replace the value.
    pub fn set(&self, value: V) -> Result<()> {
        self.item.update(Update::Set(value))
    }

    /// Compute the new value from the current one.
    pub fn apply<F>(&self, f: F) -> Result<()>
    where
        F: FnOnce(&V) -> V + Send + 'static,
    {
        self.item.update(Update::apply(f))
    }

    /// Apply either kind of update.
    pub fn update(&self, update: impl Into<Update<V>>) -> Result<()> {
        self.item.update(update)
    }
}

impl<V> Clone for Updater<V> {
    fn clone(&self) -> Self {
        Self {
            item: self.item.clone(),
        }
    }
}

impl<V> fmt::Debug for Updater<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Updater").field(&self.item.label).finish()
    }
}

/// RAII guard for a listener registration.
///
/// Dropping the guard removes the listener. The cleanup runs exactly once.
#[must_use = "dropping a Subscription unregisters its listener"]
pub struct Subscription {
    id: ListenerId,
    cleanup: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
    fn new(id: ListenerId, cleanup: impl FnOnce() + Send + Sync + 'static) -> Self {
        Self {
            id,
            cleanup: Some(Box::new(cleanup)),
        }
    }

    /// The listener registration this guard owns.
    pub fn id(&self) -> ListenerId {
        self.id
    }

    /// Remove the listener now.
    pub fn unsubscribe(self) {
        drop(self);
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(cleanup) = self.cleanup.take() {
            cleanup();
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}
