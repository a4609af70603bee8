//! Error types for state containers.

use thiserror::Error;

/// Errors raised by state items, stores and their read-only views.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StateError {
    /// A key that was not present when the container was built.
    #[error("unknown state key: {key}")]
    UnknownKey { key: String },

    /// A reducer returned a snapshot that belongs to a different key set.
    #[error("reducer returned a snapshot with a different key set")]
    KeyMismatch,

    /// Listeners panicked during a fan-out. The new value is committed and
    /// the remaining listeners were still notified.
    #[error("{failed} listener(s) of state item {item} panicked")]
    ListenerPanicked { item: String, failed: usize },
}

impl StateError {
    pub(crate) fn unknown_key<K: std::fmt::Debug>(key: &K) -> Self {
        StateError::UnknownKey {
            key: format!("{key:?}"),
        }
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, StateError>;
