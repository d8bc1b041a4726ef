use std::time::Duration;

/// Options for a [`Monitor`](crate::Monitor).
///
/// Use the builder pattern to customize, or use [`Default`] for sensible
/// defaults.
///
/// # Examples
///
/// ```rust
/// use kansoku::MonitorConfig;
///
/// let config = MonitorConfig::default()
///     .with_initial_capacity(1024)               // Expecting a chatty subject
///     .with_ignore_subscription_failures(true);  // Monitor what can be monitored
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MonitorConfig {
    /// Keep going when the subject refuses a handler for one of its events.
    /// The event is then left unmonitored and a warning is logged.
    /// Default: false
    ignore_subscription_failures: bool,

    /// Number of occurrences the log reserves room for up front.
    /// Default: 64
    initial_capacity: usize,

    /// How long [`EventRecording::settle_on`](crate::EventRecording::settle_on)
    /// waits unless overridden with `within`.
    /// Default: 1s
    settle_timeout: Duration,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        MonitorConfig {
            ignore_subscription_failures: false,
            initial_capacity: 64,
            settle_timeout: Self::DEFAULT_SETTLE_TIMEOUT,
        }
    }
}

impl MonitorConfig {
    /// Default timeout for `settle_on` conditions.
    pub const DEFAULT_SETTLE_TIMEOUT: Duration = Duration::from_secs(1);

    /// Set whether a failed subscription aborts monitor creation.
    pub fn with_ignore_subscription_failures(mut self, ignore: bool) -> Self {
        self.ignore_subscription_failures = ignore;
        self
    }

    /// Returns true if failed subscriptions are skipped instead of reported.
    pub fn ignore_subscription_failures(&self) -> bool {
        self.ignore_subscription_failures
    }

    /// Set the number of occurrences the log reserves room for.
    pub fn with_initial_capacity(mut self, capacity: usize) -> Self {
        self.initial_capacity = capacity;
        self
    }

    /// Returns the initial log capacity.
    pub fn initial_capacity(&self) -> usize {
        self.initial_capacity
    }

    /// Set the default timeout for `settle_on` conditions.
    pub fn with_settle_timeout(mut self, timeout: Duration) -> Self {
        self.settle_timeout = timeout;
        self
    }

    /// Returns the default timeout for `settle_on` conditions.
    pub fn settle_timeout(&self) -> Duration {
        self.settle_timeout
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = MonitorConfig::default();
        assert!(!config.ignore_subscription_failures());
        assert_eq!(config.initial_capacity(), 64);
        assert_eq!(config.settle_timeout(), Duration::from_secs(1));
    }

    #[test]
    fn builder_overrides() {
        let config = MonitorConfig::default()
            .with_ignore_subscription_failures(true)
            .with_initial_capacity(8)
            .with_settle_timeout(Duration::from_millis(50));
        assert!(config.ignore_subscription_failures());
        assert_eq!(config.initial_capacity(), 8);
        assert_eq!(config.settle_timeout(), Duration::from_millis(50));
    }
}
