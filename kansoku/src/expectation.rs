use std::{fmt, future::IntoFuture, time::Duration};

use tokio::time::Instant;

use crate::{Error, EventRecording, OccurrenceLog, Result};

/// A condition-based wait on an [`EventRecording`].
///
/// Created by [`EventRecording::settle_on`]. The condition is checked
/// immediately and again after every occurrence the monitor records. When it
/// returns `true` the expectation resolves to `Ok(())`. If the timeout
/// expires first, it resolves to [`Error::SettleTimeout`] carrying the number
/// of occurrences the recording matched at that point.
///
/// Useful when the subject raises events from a background thread or task.
///
/// # Example
///
/// ```ignore
/// let ticks = monitor.recording_for("Tick")?;
///
/// // Wait until 5 ticks are recorded
/// ticks.settle_on(|r| r.count() >= 5).await?;
///
/// // With a custom timeout
/// ticks.settle_on(|r| r.count() >= 5)
///     .within(Duration::from_secs(3))
///     .await?;
/// ```
pub struct Expectation<'a, F> {
    recording: &'a EventRecording,
    log: &'a OccurrenceLog,
    condition: F,
    timeout: Duration,
}

impl<'a, F> Expectation<'a, F>
where
    F: Fn(&EventRecording) -> bool,
{
    pub(crate) fn new(
        recording: &'a EventRecording,
        log: &'a OccurrenceLog,
        condition: F,
        timeout: Duration,
    ) -> Self {
        Self {
            recording,
            log,
            condition,
            timeout,
        }
    }

    /// Override the timeout taken from [`MonitorConfig`](crate::MonitorConfig).
    ///
    /// A timeout too large to add to the current instant (such as
    /// [`Duration::MAX`]) waits without limit.
    pub fn within(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    async fn run(self) -> Result {
        // `None` when the timeout is too large to represent: wait indefinitely.
        let deadline = Instant::now().checked_add(self.timeout);

        loop {
            // Register interest before checking so an append between the
            // check and the await is not missed.
            let mut appended = std::pin::pin!(self.log.appended().notified());
            appended.as_mut().enable();

            if (self.condition)(self.recording) {
                return Ok(());
            }

            let Some(deadline) = deadline else {
                appended.await;
                continue;
            };
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() || tokio::time::timeout(remaining, appended).await.is_err() {
                if (self.condition)(self.recording) {
                    return Ok(());
                }
                let matched = self.recording.count();
                tracing::debug!(
                    event = %self.recording.event_name(),
                    matched,
                    timeout = ?self.timeout,
                    "settle_on timed out"
                );
                return Err(Error::SettleTimeout(self.timeout, matched));
            }
        }
    }
}

impl<'a, F> IntoFuture for Expectation<'a, F>
where
    F: Fn(&EventRecording) -> bool + 'a,
{
    type Output = Result;
    type IntoFuture = std::pin::Pin<Box<dyn std::future::Future<Output = Self::Output> + 'a>>;

    fn into_future(self) -> Self::IntoFuture {
        Box::pin(self.run())
    }
}

impl<F> fmt::Debug for Expectation<'_, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Expectation")
            .field("recording", &self.recording)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}
