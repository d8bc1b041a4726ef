use std::{
    fmt,
    sync::{
        Arc, Weak,
        atomic::{AtomicBool, Ordering},
    },
};

use parking_lot::Mutex;
use uuid::Uuid;

use crate::{
    Error, EventName, EventRecording, Handler, HandlerId, MonitorConfig, Observable,
    OccurredEvent, OccurrenceLog, Parameters, Result,
    property_changed::{PROPERTY_CHANGED, property_filter},
};

/// Unique identifier of a [`Monitor`], used in log fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonitorId(Uuid);

impl MonitorId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for MonitorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

struct Subscription {
    event: EventName,
    handler_id: HandlerId,
}

/// Records every event a subject raises.
///
/// Creating a monitor walks the events the subject declares through
/// [`Observable`] and attaches one handler to each. From then on every raise
/// is appended to the monitor's log with its arguments and a sequence number.
/// Query the log through [`recording_for`](Self::recording_for).
///
/// A monitor is either active or disposed. [`dispose`](Self::dispose) (also
/// run on drop) stops recording and detaches the handlers; there is no way
/// back, create a new monitor to watch the subject again. Occurrences recorded
/// before disposal stay queryable.
///
/// The subject is held weakly: the monitor does not keep it alive.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use kansoku::{EventHub, PropertyChangedArgs, impl_observable, params};
///
/// struct Person {
///     events: EventHub,
/// }
///
/// impl_observable!(Person, events);
///
/// let person = Arc::new(Person {
///     events: EventHub::new(["Changed", "PropertyChanged"]),
/// });
/// let monitor = kansoku::monitor(&person)?;
///
/// person.events.raise("Changed", params!["person"]);
/// person.events.raise_property_changed("person", "Age");
///
/// assert!(monitor.recording_for("Changed")?.any());
/// assert!(monitor.property_changes(Some("Age"))?.any());
/// assert!(!monitor.property_changes(Some("Name"))?.any());
/// # Ok::<(), kansoku::Error>(())
/// ```
pub struct Monitor {
    id: MonitorId,
    subject: Weak<dyn Observable>,
    log: Arc<OccurrenceLog>,
    active: Arc<AtomicBool>,
    subscriptions: Mutex<Vec<Subscription>>,
    monitored: Vec<EventName>,
    config: MonitorConfig,
}

/// Start monitoring `subject` with the default [`MonitorConfig`].
///
/// # Errors
///
/// Returns [`Error::NotObservable`] if the subject declares no events, or
/// [`Error::Subscription`] if attaching to one of them fails.
pub fn monitor<S: Observable + 'static>(subject: &Arc<S>) -> Result<Monitor> {
    Monitor::new(subject)
}

impl Monitor {
    /// Start monitoring `subject` with the default [`MonitorConfig`].
    pub fn new<S: Observable + 'static>(subject: &Arc<S>) -> Result<Self> {
        Self::with_config(subject, MonitorConfig::default())
    }

    /// Start monitoring `subject`.
    ///
    /// # Errors
    ///
    /// - [`Error::NotObservable`] if the subject declares no events, or if
    ///   every subscription failed while failures are ignored.
    /// - [`Error::Subscription`] if the subject refuses a handler and
    ///   [`MonitorConfig::ignore_subscription_failures`] is off. Handlers
    ///   attached before the failure are detached again.
    pub fn with_config<S: Observable + 'static>(
        subject: &Arc<S>,
        config: MonitorConfig,
    ) -> Result<Self> {
        let names = subject.event_names();
        if names.is_empty() {
            return Err(Error::NotObservable);
        }

        let id = MonitorId::new();
        let log = Arc::new(OccurrenceLog::with_capacity(config.initial_capacity()));
        let active = Arc::new(AtomicBool::new(true));
        let mut subscriptions = Vec::with_capacity(names.len());
        let mut monitored = Vec::with_capacity(names.len());

        for event in names {
            if monitored.contains(&event) {
                continue;
            }
            let handler = recorder(id, event.clone(), &log, &active);
            match subject.add_handler(&event, handler) {
                Ok(handler_id) => {
                    tracing::trace!(monitor_id = %id, event = %event, "handler attached");
                    monitored.push(event.clone());
                    subscriptions.push(Subscription { event, handler_id });
                }
                Err(e) if config.ignore_subscription_failures() => {
                    tracing::warn!(
                        monitor_id = %id,
                        event = %event,
                        error = %e,
                        "subscription failed, event left unmonitored"
                    );
                }
                Err(e) => {
                    active.store(false, Ordering::SeqCst);
                    detach(subject.as_ref(), subscriptions);
                    return Err(Error::subscription(event, e));
                }
            }
        }

        if monitored.is_empty() {
            return Err(Error::NotObservable);
        }

        tracing::debug!(monitor_id = %id, events = monitored.len(), "monitor attached");
        let subject: Weak<S> = Arc::downgrade(subject);
        let subject: Weak<dyn Observable> = subject;
        Ok(Self {
            id,
            subject,
            log,
            active,
            subscriptions: Mutex::new(subscriptions),
            monitored,
            config,
        })
    }

    /// Returns a live recording of the occurrences of `event`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnmonitoredEvent`] if `event` was not among the events
    /// discovered when the monitor was created.
    pub fn recording_for(&self, event: &str) -> Result<EventRecording> {
        let name = self
            .monitored
            .iter()
            .find(|n| *n == event)
            .ok_or_else(|| Error::UnmonitoredEvent(EventName::new(event)))?;
        let recording = EventRecording::new(self.log.clone(), name.clone());
        #[cfg(feature = "tokio")]
        let recording = recording.with_settle_timeout(self.config.settle_timeout());
        Ok(recording)
    }

    /// Returns a recording of `PropertyChanged` occurrences for `property`.
    ///
    /// `None` matches changes to any property.
    ///
    /// # Errors
    ///
    /// [`Error::UnmonitoredEvent`] if the subject does not declare
    /// `PropertyChanged`, [`Error::ArgumentShape`] if a recorded
    /// `PropertyChanged` occurrence carries no
    /// [`PropertyChangedArgs`](crate::PropertyChangedArgs).
    pub fn property_changes(&self, property: Option<&str>) -> Result<EventRecording> {
        self.recording_for(PROPERTY_CHANGED)?
            .with_args(property_filter(property))
    }

    /// Names of the monitored events, in the order the subject declared them.
    pub fn monitored_events(&self) -> &[EventName] {
        &self.monitored
    }

    /// Every recorded occurrence across all events, in sequence order.
    pub fn occurred_events(&self) -> Vec<Arc<OccurredEvent>> {
        self.log.snapshot()
    }

    /// Forget everything recorded so far. Subscriptions are not affected.
    pub fn reset(&self) {
        let cleared = self.log.len();
        self.log.clear();
        tracing::debug!(monitor_id = %self.id, cleared, "monitor reset");
    }

    /// Stop recording and detach every handler from the subject.
    ///
    /// No raise that starts after `dispose` returns is recorded; a raise
    /// already running on another thread may still append one occurrence.
    /// Calling it again does nothing. Detaching is best effort: a subject that
    /// is already gone, or a handler the subject already dropped, is ignored.
    pub fn dispose(&self) {
        if !self.active.swap(false, Ordering::SeqCst) {
            return;
        }
        let subscriptions = std::mem::take(&mut *self.subscriptions.lock());
        match self.subject.upgrade() {
            Some(subject) => {
                let detached = detach(subject.as_ref(), subscriptions);
                tracing::debug!(monitor_id = %self.id, detached, "monitor disposed");
            }
            None => {
                tracing::debug!(monitor_id = %self.id, "monitor disposed after subject was dropped");
            }
        }
    }

    /// Returns true once [`dispose`](Self::dispose) has run.
    pub fn is_disposed(&self) -> bool {
        !self.active.load(Ordering::SeqCst)
    }

    /// Returns the monitored subject, if it is still alive.
    pub fn subject(&self) -> Option<Arc<dyn Observable>> {
        self.subject.upgrade()
    }

    pub fn id(&self) -> MonitorId {
        self.id
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    /// Print all recorded occurrences to stdout for debugging.
    pub fn debug_print(&self) {
        let occurrences = self.log.snapshot();
        if occurrences.is_empty() {
            println!("(no events recorded)");
            return;
        }
        println!("Recorded events ({} occurrences):", occurrences.len());
        for occurrence in occurrences {
            println!("  {}", occurrence);
        }
    }
}

impl Drop for Monitor {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl fmt::Debug for Monitor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Monitor")
            .field("id", &self.id)
            .field("monitored", &self.monitored)
            .field("log", &self.log)
            .field("disposed", &self.is_disposed())
            .finish_non_exhaustive()
    }
}

fn recorder(
    id: MonitorId,
    event: EventName,
    log: &Arc<OccurrenceLog>,
    active: &Arc<AtomicBool>,
) -> Handler {
    let log = Arc::downgrade(log);
    let active = active.clone();
    Arc::new(move |parameters: &Parameters| {
        if !active.load(Ordering::SeqCst) {
            return;
        }
        let Some(log) = log.upgrade() else {
            return;
        };
        let sequence = log.append(event.clone(), parameters.clone());
        tracing::trace!(monitor_id = %id, event = %event, sequence, "event recorded");
    })
}

fn detach<S: Observable + ?Sized>(subject: &S, subscriptions: Vec<Subscription>) -> usize {
    subscriptions
        .into_iter()
        .filter(|s| subject.remove_handler(&s.event, s.handler_id))
        .count()
}

#[cfg(test)]
mod tests {
    use std::{sync::Barrier, thread};

    use super::*;
    use crate::{EventHub, PropertyChangedArgs, impl_observable, params};

    struct Person {
        events: EventHub,
        age: Mutex<u32>,
    }

    impl_observable!(Person, events);

    impl Person {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                events: EventHub::new(["Changed", PROPERTY_CHANGED]),
                age: Mutex::new(1),
            })
        }

        fn set_age(&self, age: u32) {
            *self.age.lock() = age;
            self.events.raise_property_changed("person", "Age");
        }

        fn set_name(&self) {
            self.events.raise_property_changed("person", "Name");
        }

        fn touch(&self) {
            self.events.raise("Changed", params!["person"]);
        }
    }

    /// Subject that refuses handlers for one of its events.
    struct Picky {
        events: EventHub,
        refuse: &'static str,
    }

    impl Observable for Picky {
        fn event_names(&self) -> Vec<EventName> {
            self.events.event_names()
        }

        fn add_handler(&self, event: &EventName, handler: Handler) -> Result<HandlerId> {
            if event == self.refuse {
                return Err(Error::UnknownEvent(event.clone()));
            }
            self.events.add_handler(event, handler)
        }

        fn remove_handler(&self, event: &EventName, id: HandlerId) -> bool {
            self.events.remove_handler(event, id)
        }
    }

    #[test]
    fn example_scenario() {
        let person = Person::new();
        let monitor = monitor(&person).unwrap();

        person.touch();
        person.set_age(2);

        assert!(monitor.recording_for("Changed").unwrap().any());
        assert!(
            monitor
                .recording_for(PROPERTY_CHANGED)
                .unwrap()
                .with_args(property_filter(Some("Age")))
                .unwrap()
                .any()
        );
        assert!(
            !monitor
                .recording_for(PROPERTY_CHANGED)
                .unwrap()
                .with_args(property_filter(Some("Name")))
                .unwrap()
                .any()
        );
        assert_eq!(*person.age.lock(), 2);
    }

    #[test]
    fn k_raises_give_k_ordered_occurrences() {
        let person = Person::new();
        let monitor = monitor(&person).unwrap();
        for _ in 0..4 {
            person.touch();
        }

        let changed = monitor.recording_for("Changed").unwrap();
        assert!(changed.any());
        assert_eq!(changed.count(), 4);
        let sequences: Vec<u64> = changed.iter().map(|e| e.sequence()).collect();
        assert!(sequences.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn events_raised_before_monitoring_are_not_recorded() {
        let person = Person::new();
        person.touch();
        let monitor = monitor(&person).unwrap();
        assert!(!monitor.recording_for("Changed").unwrap().any());
    }

    #[test]
    fn unknown_event_name_is_rejected() {
        let person = Person::new();
        let monitor = monitor(&person).unwrap();
        let err = monitor.recording_for("Chagned").unwrap_err();
        assert_eq!(err, Error::UnmonitoredEvent(EventName::new("Chagned")));
    }

    #[test]
    fn subject_without_events_is_not_observable() {
        let hub = Arc::new(EventHub::new(Vec::<&str>::new()));
        let err = monitor(&hub).unwrap_err();
        assert_eq!(err, Error::NotObservable);
    }

    #[test]
    fn order_is_preserved_across_events() {
        let person = Person::new();
        let monitor = monitor(&person).unwrap();
        person.touch();
        person.set_age(3);
        person.touch();

        let names: Vec<String> = monitor
            .occurred_events()
            .iter()
            .map(|e| e.event_name().to_string())
            .collect();
        assert_eq!(names, vec!["Changed", "PropertyChanged", "Changed"]);

        let changed = monitor.recording_for("Changed").unwrap().collect();
        let property = monitor.property_changes(None).unwrap().first().unwrap();
        assert!(changed[0].sequence() < property.sequence());
        assert!(property.sequence() < changed[1].sequence());
    }

    #[test]
    fn property_filter_none_matches_every_property() {
        let person = Person::new();
        let monitor = monitor(&person).unwrap();
        person.set_age(2);
        person.set_name();
        person.events.raise(
            PROPERTY_CHANGED,
            params!["person", PropertyChangedArgs::unnamed()],
        );

        assert_eq!(monitor.property_changes(None).unwrap().count(), 3);
        assert_eq!(monitor.property_changes(Some("Age")).unwrap().count(), 1);
        assert_eq!(monitor.property_changes(Some("Name")).unwrap().count(), 1);
    }

    #[test]
    fn property_changes_reject_wrong_payload() {
        let person = Person::new();
        let monitor = monitor(&person).unwrap();
        person.events.raise(PROPERTY_CHANGED, params!["person", "Age"]);

        let err = monitor.property_changes(Some("Age")).unwrap_err();
        assert!(matches!(err, Error::ArgumentShape { .. }));
    }

    #[test]
    fn reset_clears_matches_but_keeps_subscriptions() {
        let person = Person::new();
        let monitor = monitor(&person).unwrap();
        person.touch();
        monitor.reset();

        let changed = monitor.recording_for("Changed").unwrap();
        assert!(!changed.any());
        assert_eq!(monitor.monitored_events().len(), 2);

        person.touch();
        assert_eq!(changed.count(), 1);
    }

    #[test]
    fn dispose_detaches_handlers_and_stops_recording() {
        let person = Person::new();
        let monitor = monitor(&person).unwrap();
        assert_eq!(person.events.handler_count("Changed"), 1);

        person.touch();
        monitor.dispose();
        person.touch();

        assert!(monitor.is_disposed());
        assert_eq!(person.events.handler_count("Changed"), 0);
        assert_eq!(person.events.handler_count(PROPERTY_CHANGED), 0);
        assert_eq!(monitor.recording_for("Changed").unwrap().count(), 1);
    }

    #[test]
    fn dispose_twice_is_noop() {
        let person = Person::new();
        let monitor = monitor(&person).unwrap();
        monitor.dispose();
        monitor.dispose();
        assert!(monitor.is_disposed());
        assert_eq!(person.events.handler_count("Changed"), 0);
    }

    #[test]
    fn dispose_tolerates_dropped_subject() {
        let person = Person::new();
        let monitor = monitor(&person).unwrap();
        drop(person);

        assert!(monitor.subject().is_none());
        monitor.dispose();
        assert!(monitor.is_disposed());
    }

    #[test]
    fn drop_detaches_handlers() {
        let person = Person::new();
        {
            let _monitor = monitor(&person).unwrap();
            assert_eq!(person.events.handler_count("Changed"), 1);
        }
        assert_eq!(person.events.handler_count("Changed"), 0);
    }

    #[test]
    fn two_monitors_record_independently() {
        let person = Person::new();
        let first = monitor(&person).unwrap();
        person.touch();
        let second = monitor(&person).unwrap();
        person.touch();

        assert_eq!(first.recording_for("Changed").unwrap().count(), 2);
        assert_eq!(second.recording_for("Changed").unwrap().count(), 1);
        assert_ne!(first.id(), second.id());
    }

    #[test]
    fn concurrent_raises_are_all_recorded() {
        let person = Person::new();
        let monitor = monitor(&person).unwrap();

        let producers: Vec<_> = (0..2)
            .map(|_| {
                let person = person.clone();
                thread::spawn(move || {
                    for _ in 0..500 {
                        person.touch();
                    }
                })
            })
            .collect();
        for producer in producers {
            producer.join().unwrap();
        }

        let changed = monitor.recording_for("Changed").unwrap().collect();
        assert_eq!(changed.len(), 1000);
        let mut sequences: Vec<u64> = changed.iter().map(|e| e.sequence()).collect();
        assert!(sequences.windows(2).all(|w| w[0] < w[1]));
        sequences.dedup();
        assert_eq!(sequences.len(), 1000);
    }

    #[test]
    fn nothing_recorded_after_dispose_returns_under_concurrency() {
        let person = Person::new();
        let monitor = monitor(&person).unwrap();
        let changed = monitor.recording_for("Changed").unwrap();
        let start = Arc::new(Barrier::new(2));

        let producer = {
            let person = person.clone();
            let start = start.clone();
            thread::spawn(move || {
                start.wait();
                for _ in 0..20_000 {
                    person.touch();
                }
            })
        };
        start.wait();
        while changed.is_empty() {
            thread::yield_now();
        }
        monitor.dispose();
        let after_dispose = changed.count();
        producer.join().unwrap();

        assert!(after_dispose > 0);
        // At most one in-flight raise may land after dispose returned.
        assert!(changed.count() <= after_dispose + 1);
        assert_eq!(person.events.handler_count("Changed"), 0);
    }

    #[test]
    fn subscription_failure_rolls_back() {
        let picky = Arc::new(Picky {
            events: EventHub::new(["Opened", "Closed"]),
            refuse: "Closed",
        });
        let err = monitor(&picky).unwrap_err();
        assert!(matches!(err, Error::Subscription { ref event, .. } if event == "Closed"));
        assert_eq!(picky.events.handler_count("Opened"), 0);
    }

    #[test]
    fn subscription_failure_can_be_ignored() {
        let picky = Arc::new(Picky {
            events: EventHub::new(["Opened", "Closed"]),
            refuse: "Closed",
        });
        let config = MonitorConfig::default().with_ignore_subscription_failures(true);
        let monitor = Monitor::with_config(&picky, config).unwrap();

        assert_eq!(monitor.monitored_events(), &[EventName::new("Opened")]);
        assert!(matches!(
            monitor.recording_for("Closed"),
            Err(Error::UnmonitoredEvent(_))
        ));
    }

    #[test]
    fn all_subscriptions_failing_is_not_observable() {
        let picky = Arc::new(Picky {
            events: EventHub::new(["Closed"]),
            refuse: "Closed",
        });
        let config = MonitorConfig::default().with_ignore_subscription_failures(true);
        let err = Monitor::with_config(&picky, config).unwrap_err();
        assert_eq!(err, Error::NotObservable);
    }
}
