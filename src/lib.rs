//! # Globstate
//!
//! Keyed global state with per-key subscriptions.
//!
//! Globstate provides two ways of holding a fixed set of named values:
//!
//! ## Global state (uncoordinated)
//!
//! [`create_global_state`] builds one [`StateItem`] per key and exposes
//! read-only maps of updaters and hooks. Each key is written on its own.
//!
//! ## Store (reducer-driven)
//!
//! [`create_store`] wires the same items through a reducer:
//! - `get_state()` returns a memoized [`Snapshot`] whose `Arc` only changes
//!   when some field does
//! - `dispatch(action)` writes back only the fields the reducer changed, so
//!   subscribers of other keys are not notified
//! - An optional enhancer can wrap `{get_state, dispatch}` (see [`enhancer`])
//!
//! Views subscribe with [`Hook`]s. A hook mirrors one item into a local cell
//! and unsubscribes when dropped. All writes run their listener fan-out to
//! completion before returning.

pub mod config;
pub mod enhancer;
pub mod error;
pub mod global;
pub mod item;
pub mod store;

// Re-export main types for convenience
pub use config::{FanoutPolicy, StateConfig};
pub use error::{Result, StateError};
pub use global::{create_global_state, create_global_state_with_config, GlobalState};
pub use item::{
    Hook, ListenerId, LocalState, StateItem, StateItemHooks, StateItemUpdaters, StateKey,
    StateValue, Subscription, Update, Updater,
};
pub use store::{
    create_store, create_store_with_config, create_store_with_enhancer, Reducer, Snapshot, Store,
    StoreApi,
};
