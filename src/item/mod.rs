//! State items: the atomic cells of every container.
//!
//! A state item owns one value and the ordered list of listeners that want
//! to hear about writes to it. Views subscribe through a [`Hook`], which
//! mirrors the value into a subscriber-local [`LocalState`] for as long as
//! the hook lives.

mod hook;
mod map;
mod state_item;
mod views;

pub use hook::{Hook, LocalState};
pub use map::StateKey;
pub(crate) use map::{ItemMap, KeySet};
pub use state_item::{ListenerId, StateItem, StateValue, Subscription, Update, Updater};
pub use views::{StateItemHooks, StateItemUpdaters};
