//! Uncoordinated per-key state.

mod global_state;

pub use global_state::{create_global_state, create_global_state_with_config, GlobalState};
