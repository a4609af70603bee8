//! Reducer-driven stores.
//!
//! A store keeps one state item per key and coordinates writes through a
//! reducer: [`StoreApi::get_state`] hands out a memoized [`Snapshot`] and
//! [`StoreApi::dispatch`] writes back only the fields the reducer changed.

mod dispatch;
mod snapshot;
mod store;

pub use dispatch::Reducer;
pub use snapshot::Snapshot;
pub use store::{
    create_store, create_store_with_config, create_store_with_enhancer, Store, StoreApi,
};
