//! Container configuration.

/// How a state item treats a listener that panics during fan-out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FanoutPolicy {
    /// Catch each listener panic, log it, keep notifying the rest and report
    /// the failures as [`StateError::ListenerPanicked`](crate::StateError).
    #[default]
    Isolate,
    /// Let the first panic unwind to the caller of the write. Listeners after
    /// the panicking one are not notified; the value stays committed.
    Strict,
}

/// Options shared by every state item of one container.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StateConfig {
    pub fanout: FanoutPolicy,
}

impl StateConfig {
    /// Default configuration: listener panics are isolated.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the listener panic policy.
    pub fn fanout(mut self, policy: FanoutPolicy) -> Self {
        self.fanout = policy;
        self
    }
}
