use std::sync::Arc;

use crate::EventName;

/// The single error type for all Kansoku operations.
///
/// Every fallible Kansoku API returns `kansoku::Result<T>` (alias for
/// `Result<T, kansoku::Error>`). Failures reported by a subject while
/// subscribing are wrapped into variants of this enum so callers only
/// need to handle one error type.
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    #[error("Subject exposes no events to monitor")]
    NotObservable,

    #[error("Event '{0}' is not being monitored")]
    UnmonitoredEvent(EventName),

    #[error("No parameter of event '{event}' (occurrence #{sequence}) is of type {expected}")]
    ArgumentShape {
        event: EventName,
        sequence: u64,
        expected: &'static str,
    },

    #[error("Event '{0}' is not declared by this subject")]
    UnknownEvent(EventName),

    #[error("Failed to subscribe to event '{event}': {source}")]
    Subscription {
        event: EventName,
        #[source]
        source: Arc<Error>,
    },

    #[error("External error: {0}")]
    External(#[source] Arc<dyn std::error::Error + Send + Sync>),

    #[cfg(feature = "tokio")]
    #[error("settle_on condition not met within {0:?}: {1} occurrences matched")]
    SettleTimeout(std::time::Duration, usize),
}

impl Error {
    pub fn external(e: impl std::error::Error + Send + Sync + 'static) -> Self {
        Error::External(Arc::new(e))
    }

    pub(crate) fn subscription(event: EventName, source: Error) -> Self {
        Error::Subscription {
            event,
            source: Arc::new(source),
        }
    }
}

impl PartialEq for Error {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::NotObservable, Self::NotObservable) => true,
            (Self::UnmonitoredEvent(a), Self::UnmonitoredEvent(b)) => a == b,
            (
                Self::ArgumentShape {
                    event: e1,
                    sequence: s1,
                    expected: x1,
                },
                Self::ArgumentShape {
                    event: e2,
                    sequence: s2,
                    expected: x2,
                },
            ) => e1 == e2 && s1 == s2 && x1 == x2,
            (Self::UnknownEvent(a), Self::UnknownEvent(b)) => a == b,
            (
                Self::Subscription {
                    event: e1,
                    source: s1,
                },
                Self::Subscription {
                    event: e2,
                    source: s2,
                },
            ) => e1 == e2 && s1 == s2,
            (Self::External(a), Self::External(b)) => Arc::ptr_eq(a, b),
            #[cfg(feature = "tokio")]
            (Self::SettleTimeout(a1, a2), Self::SettleTimeout(b1, b2)) => a1 == b1 && a2 == b2,
            _ => false,
        }
    }
}

impl Eq for Error {}
