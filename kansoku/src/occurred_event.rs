use std::{any::Any, fmt, time::SystemTime};

use crate::{EventName, Parameters};

/// A record of one event raised by a monitored subject.
///
/// Each `OccurredEvent` represents a single raise: the same event raised
/// three times produces three entries, each with its own sequence number.
///
/// # Fields
///
/// - `event_name`: The event that fired
/// - `sequence`: Position in the monitor's total order (strictly increasing, never reused)
/// - `timestamp`: Nanoseconds since Unix epoch at record time, informational only
/// - `parameters`: The arguments passed at raise time, in order
#[derive(Clone)]
pub struct OccurredEvent {
    event_name: EventName,
    sequence: u64,
    timestamp: u64,
    parameters: Parameters,
}

impl OccurredEvent {
    pub(crate) fn new(event_name: EventName, sequence: u64, parameters: Parameters) -> Self {
        Self {
            event_name,
            sequence,
            timestamp: now_nanos(),
            parameters,
        }
    }

    /// Returns the name of the event that fired.
    #[inline]
    pub fn event_name(&self) -> &EventName {
        &self.event_name
    }

    /// Returns the sequence number assigned when this occurrence was recorded.
    #[inline]
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Timestamp in nanoseconds since Unix epoch (u64 truncation).
    ///
    /// Concurrent raises may share a timestamp; use [`sequence`](Self::sequence)
    /// for ordering.
    #[inline]
    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }

    /// Returns the arguments passed when the event was raised.
    #[inline]
    pub fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    /// Returns the first parameter if it is an `S`.
    ///
    /// Subjects pass themselves (or an identifier) as the first parameter by
    /// convention.
    pub fn sender<S: Any>(&self) -> Option<&S> {
        self.parameters.get(0).and_then(|arg| arg.downcast_ref::<S>())
    }

    /// Returns the first parameter that is a `T`.
    pub fn arg<T: Any>(&self) -> Option<&T> {
        self.parameters.first_of::<T>()
    }
}

impl fmt::Debug for OccurredEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OccurredEvent")
            .field("event_name", &self.event_name)
            .field("sequence", &self.sequence)
            .field("parameters", &self.parameters.type_names())
            .finish()
    }
}

impl fmt::Display for OccurredEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#{} {} ({})",
            self.sequence,
            self.event_name,
            self.parameters.type_names().join(", ")
        )
    }
}

fn now_nanos() -> u64 {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or_default()
}
