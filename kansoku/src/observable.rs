use std::{fmt, sync::Arc};

use crate::{EventName, Parameters, Result};

/// Callback attached to one event of a subject.
///
/// Receives the arguments the subject passed when raising the event.
pub type Handler = Arc<dyn Fn(&Parameters) + Send + Sync>;

/// Identifies one attached [`Handler`] so it can be removed later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HandlerId(u64);

impl From<u64> for HandlerId {
    fn from(value: u64) -> Self {
        HandlerId(value)
    }
}

impl fmt::Display for HandlerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Capability of a subject whose events can be monitored.
///
/// A subject declares up front which named events it raises and how a generic
/// handler is attached to and detached from each. A [`Monitor`](crate::Monitor)
/// walks [`event_names`](Self::event_names) once at creation and attaches one
/// handler per name.
///
/// Most subjects embed an [`EventHub`](crate::EventHub) and forward to it with
/// [`impl_observable!`](crate::impl_observable). Implement the trait by hand
/// when events are delivered through some other mechanism.
///
/// # Contract
///
/// - `add_handler` must make the handler visible to every raise that starts
///   after it returns, and to no raise that finished before it was called.
/// - `remove_handler` returns `false` if the handler was already gone; it must
///   not fail.
pub trait Observable: Send + Sync {
    /// Names of every event this subject can raise, in declaration order.
    fn event_names(&self) -> Vec<EventName>;

    /// Attach `handler` to `event`.
    fn add_handler(&self, event: &EventName, handler: Handler) -> Result<HandlerId>;

    /// Detach a handler previously returned by [`add_handler`](Self::add_handler).
    fn remove_handler(&self, event: &EventName, id: HandlerId) -> bool;
}

/// Implement [`Observable`] for a type by forwarding to one of its
/// [`EventHub`](crate::EventHub) fields.
///
/// ```rust
/// use kansoku::{EventHub, impl_observable, params};
///
/// struct Door {
///     events: EventHub,
/// }
///
/// impl_observable!(Door, events);
///
/// let door = Door { events: EventHub::new(["Opened", "Closed"]) };
/// door.events.raise("Opened", params![]);
/// ```
#[macro_export]
macro_rules! impl_observable {
    ($subject:ty, $hub:ident) => {
        impl $crate::Observable for $subject {
            fn event_names(&self) -> ::std::vec::Vec<$crate::EventName> {
                $crate::Observable::event_names(&self.$hub)
            }

            fn add_handler(
                &self,
                event: &$crate::EventName,
                handler: $crate::Handler,
            ) -> $crate::Result<$crate::HandlerId> {
                $crate::Observable::add_handler(&self.$hub, event, handler)
            }

            fn remove_handler(&self, event: &$crate::EventName, id: $crate::HandlerId) -> bool {
                $crate::Observable::remove_handler(&self.$hub, event, id)
            }
        }
    };
}
