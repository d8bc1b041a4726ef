use std::{
    collections::HashMap,
    fmt,
    sync::atomic::{AtomicU64, Ordering},
};

use parking_lot::RwLock;

use crate::{
    Error, EventName, Handler, HandlerId, Observable, Parameters, PropertyChangedArgs, Result,
    property_changed::PROPERTY_CHANGED,
};

/// Handler registry a subject embeds to expose named events.
///
/// The set of event names is fixed at construction. Handlers are stored per
/// event; [`raise`](Self::raise) calls a snapshot of the handlers attached at
/// the moment of the raise, outside the lock, so handlers may attach or
/// detach other handlers without deadlocking.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use kansoku::{EventHub, params};
///
/// let hub = Arc::new(EventHub::new(["Changed"]));
/// let monitor = kansoku::monitor(&hub)?;
///
/// hub.raise("Changed", params!["sender"]);
/// assert!(monitor.recording_for("Changed")?.any());
/// # Ok::<(), kansoku::Error>(())
/// ```
pub struct EventHub {
    declared: Vec<EventName>,
    handlers: RwLock<HashMap<EventName, Vec<(HandlerId, Handler)>>>,
    next_id: AtomicU64,
}

impl EventHub {
    /// Create a hub declaring the given events. Duplicate names are collapsed.
    pub fn new<I, N>(names: I) -> Self
    where
        I: IntoIterator<Item = N>,
        N: Into<EventName>,
    {
        let mut declared: Vec<EventName> = Vec::new();
        for name in names {
            let name = name.into();
            if !declared.contains(&name) {
                declared.push(name);
            }
        }
        let handlers = declared.iter().map(|n| (n.clone(), Vec::new())).collect();
        Self {
            declared,
            handlers: RwLock::new(handlers),
            next_id: AtomicU64::new(0),
        }
    }

    /// Number of handlers currently attached to `event`.
    pub fn handler_count(&self, event: &str) -> usize {
        self.handlers.read().get(event).map_or(0, Vec::len)
    }

    /// Raise `event` with the given arguments.
    ///
    /// Returns `false` without calling anything if the hub does not declare
    /// `event`.
    pub fn raise(&self, event: &str, parameters: Parameters) -> bool {
        let handlers: Vec<Handler> = match self.handlers.read().get(event) {
            Some(list) => list.iter().map(|(_, h)| h.clone()).collect(),
            None => return false,
        };
        for handler in handlers {
            handler(&parameters);
        }
        true
    }

    /// Raise the `PropertyChanged` event for `property`, passing `sender`
    /// as the first parameter and a [`PropertyChangedArgs`] as the second.
    pub fn raise_property_changed<S>(&self, sender: S, property: &str) -> bool
    where
        S: std::any::Any + Send + Sync,
    {
        let parameters = Parameters::new()
            .with(sender)
            .with(PropertyChangedArgs::new(property));
        self.raise(PROPERTY_CHANGED, parameters)
    }
}

impl Observable for EventHub {
    fn event_names(&self) -> Vec<EventName> {
        self.declared.clone()
    }

    fn add_handler(&self, event: &EventName, handler: Handler) -> Result<HandlerId> {
        let mut handlers = self.handlers.write();
        let list = handlers
            .get_mut(event.as_str())
            .ok_or_else(|| Error::UnknownEvent(event.clone()))?;
        let id = HandlerId::from(self.next_id.fetch_add(1, Ordering::Relaxed));
        list.push((id, handler));
        Ok(id)
    }

    fn remove_handler(&self, event: &EventName, id: HandlerId) -> bool {
        let mut handlers = self.handlers.write();
        let Some(list) = handlers.get_mut(event.as_str()) else {
            return false;
        };
        let before = list.len();
        list.retain(|(existing, _)| *existing != id);
        list.len() != before
    }
}

impl fmt::Debug for EventHub {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let handlers = self.handlers.read();
        let attached: usize = handlers.values().map(Vec::len).sum();
        f.debug_struct("EventHub")
            .field("declared", &self.declared)
            .field("attached", &attached)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };

    use super::*;
    use crate::params;

    fn counting_handler(counter: &Arc<AtomicUsize>) -> Handler {
        let counter = counter.clone();
        Arc::new(move |_params: &Parameters| {
            counter.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn declared_names_keep_order_without_duplicates() {
        let hub = EventHub::new(["Opened", "Closed", "Opened"]);
        let names: Vec<String> = hub.event_names().iter().map(|n| n.to_string()).collect();
        assert_eq!(names, vec!["Opened", "Closed"]);
    }

    #[test]
    fn raise_invokes_attached_handlers() {
        let hub = EventHub::new(["Opened"]);
        let counter = Arc::new(AtomicUsize::new(0));
        hub.add_handler(&EventName::new("Opened"), counting_handler(&counter))
            .unwrap();

        assert!(hub.raise("Opened", params![]));
        assert!(hub.raise("Opened", params![]));
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn raise_of_undeclared_event_is_noop() {
        let hub = EventHub::new(["Opened"]);
        assert!(!hub.raise("Closed", params![]));
    }

    #[test]
    fn add_handler_rejects_unknown_event() {
        let hub = EventHub::new(["Opened"]);
        let counter = Arc::new(AtomicUsize::new(0));
        let err = hub
            .add_handler(&EventName::new("Closed"), counting_handler(&counter))
            .unwrap_err();
        assert_eq!(err, Error::UnknownEvent(EventName::new("Closed")));
    }

    #[test]
    fn removed_handler_is_not_called() {
        let hub = EventHub::new(["Opened"]);
        let counter = Arc::new(AtomicUsize::new(0));
        let name = EventName::new("Opened");
        let id = hub.add_handler(&name, counting_handler(&counter)).unwrap();

        assert!(hub.remove_handler(&name, id));
        assert!(!hub.remove_handler(&name, id));
        assert_eq!(hub.handler_count("Opened"), 0);

        hub.raise("Opened", params![]);
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn handler_may_detach_itself_during_raise() {
        let hub = Arc::new(EventHub::new(["Opened"]));
        let name = EventName::new("Opened");
        let slot: Arc<parking_lot::Mutex<Option<HandlerId>>> = Arc::default();

        let handler: Handler = {
            let hub = hub.clone();
            let slot = slot.clone();
            let name = name.clone();
            Arc::new(move |_params: &Parameters| {
                if let Some(id) = slot.lock().take() {
                    hub.remove_handler(&name, id);
                }
            })
        };
        let id = hub.add_handler(&name, handler).unwrap();
        *slot.lock() = Some(id);

        hub.raise("Opened", params![]);
        assert_eq!(hub.handler_count("Opened"), 0);
    }

    #[test]
    fn raise_property_changed_passes_sender_and_args() {
        let hub = EventHub::new([PROPERTY_CHANGED]);
        let seen: Arc<parking_lot::Mutex<Option<String>>> = Arc::default();
        let handler: Handler = {
            let seen = seen.clone();
            Arc::new(move |params: &Parameters| {
                let sender = params.get(0).and_then(|a| a.downcast_ref::<&str>());
                let args = params.first_of::<PropertyChangedArgs>();
                if let (Some(sender), Some(args)) = (sender, args) {
                    *seen.lock() = Some(format!("{}.{:?}", sender, args.property_name()));
                }
            })
        };
        hub.add_handler(&EventName::new(PROPERTY_CHANGED), handler)
            .unwrap();

        assert!(hub.raise_property_changed("person", "Age"));
        assert_eq!(seen.lock().as_deref(), Some("person.Some(\"Age\")"));
    }
}
