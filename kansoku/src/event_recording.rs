use std::{any::Any, fmt, sync::Arc};

use crate::{Error, EventName, OccurredEvent, OccurrenceLog, Result};

type Filter = Arc<dyn Fn(&OccurredEvent) -> bool + Send + Sync>;

/// A live, filtered view over the occurrences of one monitored event.
///
/// Obtained from [`Monitor::recording_for`](crate::Monitor::recording_for).
/// A recording holds no occurrences itself: every terminal operation
/// ([`any`](Self::any), [`count`](Self::count), [`iter`](Self::iter), ...)
/// evaluates the filter chain against the log as it is at call time, so
/// occurrences recorded after the view was created are visible through it.
///
/// Narrowing operations ([`with_args`](Self::with_args),
/// [`with_sender`](Self::with_sender), [`matching`](Self::matching)) consume
/// the recording and return a new one with one more filter. Clone first to
/// keep the wider view.
///
/// # Example
///
/// ```ignore
/// let changes = monitor.recording_for("PropertyChanged")?;
/// assert!(changes.any());
///
/// let ages = changes
///     .clone()
///     .with_args(property_filter(Some("Age")))?;
/// assert_eq!(ages.count(), 1);
/// ```
#[derive(Clone)]
pub struct EventRecording {
    log: Arc<OccurrenceLog>,
    event_name: EventName,
    filters: Vec<Filter>,
    #[cfg(feature = "tokio")]
    settle_timeout: std::time::Duration,
}

impl fmt::Debug for EventRecording {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventRecording")
            .field("event_name", &self.event_name)
            .field("filters", &self.filters.len())
            .finish_non_exhaustive()
    }
}

impl EventRecording {
    pub(crate) fn new(log: Arc<OccurrenceLog>, event_name: EventName) -> Self {
        Self {
            log,
            event_name,
            filters: Vec::new(),
            #[cfg(feature = "tokio")]
            settle_timeout: crate::MonitorConfig::DEFAULT_SETTLE_TIMEOUT,
        }
    }

    #[cfg(feature = "tokio")]
    pub(crate) fn with_settle_timeout(mut self, timeout: std::time::Duration) -> Self {
        self.settle_timeout = timeout;
        self
    }

    fn add_filter<F>(&mut self, filter: F)
    where
        F: Fn(&OccurredEvent) -> bool + Send + Sync + 'static,
    {
        self.filters.push(Arc::new(filter));
    }

    /// The event this recording is scoped to.
    pub fn event_name(&self) -> &EventName {
        &self.event_name
    }

    // ==================== Terminal Operations ====================

    /// Lazily yields matching occurrences in recorded order.
    ///
    /// The sequence covers the log as it was when `iter` was called; call it
    /// again to observe later occurrences.
    pub fn iter(&self) -> impl Iterator<Item = Arc<OccurredEvent>> + use<> {
        let event_name = self.event_name.clone();
        let filters = self.filters.clone();
        self.log.entries().filter(move |e| {
            *e.event_name() == event_name && filters.iter().all(|f| f(e.as_ref()))
        })
    }

    /// Returns true if at least one occurrence matches.
    pub fn any(&self) -> bool {
        self.iter().next().is_some()
    }

    /// Same as [`any`](Self::any).
    pub fn exists(&self) -> bool {
        self.any()
    }

    /// Returns true if no occurrence matches.
    pub fn is_empty(&self) -> bool {
        !self.any()
    }

    /// Returns the number of matching occurrences.
    pub fn count(&self) -> usize {
        self.iter().count()
    }

    /// Returns the first matching occurrence, if any.
    pub fn first(&self) -> Option<Arc<OccurredEvent>> {
        self.iter().next()
    }

    /// Returns the last matching occurrence, if any.
    pub fn last(&self) -> Option<Arc<OccurredEvent>> {
        self.iter().last()
    }

    /// Returns the nth matching occurrence (0-indexed), if any.
    pub fn nth(&self, index: usize) -> Option<Arc<OccurredEvent>> {
        self.iter().nth(index)
    }

    /// Collects every matching occurrence.
    pub fn collect(&self) -> Vec<Arc<OccurredEvent>> {
        self.iter().collect()
    }

    /// Returns true if every matching occurrence satisfies the predicate.
    pub fn all(&self, predicate: impl Fn(&OccurredEvent) -> bool) -> bool {
        self.iter().all(|e| predicate(e.as_ref()))
    }

    // ==================== Filter Operations ====================

    /// Keep occurrences with at least one parameter of type `T` satisfying
    /// `predicate`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ArgumentShape`] if an occurrence currently matched by
    /// this recording carries no parameter of type `T`. That means the event's
    /// signature differs from what the caller assumed, which is a test bug
    /// rather than a non-match.
    ///
    /// Occurrences recorded after this call that lack a `T` simply do not
    /// match; a warning is logged when that happens.
    pub fn with_args<T, F>(mut self, predicate: F) -> Result<Self>
    where
        T: Any,
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        let expected = std::any::type_name::<T>();
        if let Some(e) = self.iter().find(|e| e.arg::<T>().is_none()) {
            return Err(Error::ArgumentShape {
                event: self.event_name.clone(),
                sequence: e.sequence(),
                expected,
            });
        }
        self.add_filter(move |e| {
            let mut values = e.parameters().all_of::<T>().peekable();
            if values.peek().is_none() {
                tracing::warn!(
                    event = %e.event_name(),
                    sequence = e.sequence(),
                    expected,
                    "occurrence has no parameter of the filtered type"
                );
                return false;
            }
            values.any(|value| predicate(value))
        });
        Ok(self)
    }

    /// Keep occurrences whose first parameter is an `S` equal to `expected`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ArgumentShape`] if a currently matched occurrence's
    /// first parameter is missing or is not an `S`.
    pub fn with_sender<S>(mut self, expected: S) -> Result<Self>
    where
        S: Any + PartialEq + Send + Sync,
    {
        let type_name = std::any::type_name::<S>();
        if let Some(e) = self.iter().find(|e| e.sender::<S>().is_none()) {
            return Err(Error::ArgumentShape {
                event: self.event_name.clone(),
                sequence: e.sequence(),
                expected: type_name,
            });
        }
        self.add_filter(move |e| e.sender::<S>() == Some(&expected));
        Ok(self)
    }

    /// Keep occurrences satisfying a custom predicate.
    pub fn matching<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&OccurredEvent) -> bool + Send + Sync + 'static,
    {
        self.add_filter(predicate);
        self
    }

    /// Keep occurrences recorded after the given one (by sequence).
    pub fn after(mut self, occurrence: &OccurredEvent) -> Self {
        let sequence = occurrence.sequence();
        self.add_filter(move |e| e.sequence() > sequence);
        self
    }

    /// Keep occurrences recorded before the given one (by sequence).
    pub fn before(mut self, occurrence: &OccurredEvent) -> Self {
        let sequence = occurrence.sequence();
        self.add_filter(move |e| e.sequence() < sequence);
        self
    }

    /// Wait until `condition` holds for this recording.
    ///
    /// Returns an [`Expectation`](crate::Expectation); await it directly or
    /// set a custom timeout with [`within`](crate::Expectation::within) first.
    #[cfg(feature = "tokio")]
    #[cfg_attr(docsrs, doc(cfg(feature = "tokio")))]
    pub fn settle_on<F>(&self, condition: F) -> crate::Expectation<'_, F>
    where
        F: Fn(&EventRecording) -> bool,
    {
        crate::Expectation::new(self, &self.log, condition, self.settle_timeout)
    }
}
