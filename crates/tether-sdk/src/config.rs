//! Tracker configuration.

use std::time::Duration;

/// Configuration for a [`ConnectionTracker`](crate::ConnectionTracker).
#[derive(Clone, Debug)]
pub struct TrackerConfig {
    /// How long a wait for stability lasts when the caller gives no timeout
    /// (in milliseconds). Auth handshakes can be slow, so keep this generous.
    pub default_timeout_ms: u64,
    /// Buffered settled signals per subscriber before old ones are dropped.
    pub settled_capacity: usize,
    /// Raw events buffered between the transport and the dispatcher.
    pub dispatch_buffer: usize,
    /// Whether `wait_and_report` surfaces terminal failures to the notifier.
    pub notify_failures: bool,
}

impl TrackerConfig {
    pub fn default_timeout(&self) -> Duration {
        Duration::from_millis(self.default_timeout_ms)
    }
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            default_timeout_ms: 30_000,
            settled_capacity: 100,
            dispatch_buffer: 100,
            notify_failures: true,
        }
    }
}

/// Builder for tracker configuration.
pub struct TrackerConfigBuilder {
    config: TrackerConfig,
}

impl TrackerConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: TrackerConfig::default(),
        }
    }

    pub fn default_timeout(mut self, ms: u64) -> Self {
        self.config.default_timeout_ms = ms;
        self
    }

    pub fn settled_capacity(mut self, capacity: usize) -> Self {
        self.config.settled_capacity = capacity.max(1);
        self
    }

    pub fn dispatch_buffer(mut self, size: usize) -> Self {
        self.config.dispatch_buffer = size.max(1);
        self
    }

    pub fn notify_failures(mut self, enabled: bool) -> Self {
        self.config.notify_failures = enabled;
        self
    }

    pub fn build(self) -> TrackerConfig {
        self.config
    }
}

impl Default for TrackerConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = TrackerConfig::default();

        assert_eq!(config.default_timeout(), Duration::from_secs(30));
        assert_eq!(config.settled_capacity, 100);
        assert!(config.notify_failures);
    }

    #[test]
    fn test_builder() {
        let config = TrackerConfigBuilder::new()
            .default_timeout(500)
            .settled_capacity(8)
            .dispatch_buffer(0)
            .notify_failures(false)
            .build();

        assert_eq!(config.default_timeout_ms, 500);
        assert_eq!(config.settled_capacity, 8);
        // broadcast/mpsc channels reject a zero capacity
        assert_eq!(config.dispatch_buffer, 1);
        assert!(!config.notify_failures);
    }
}
