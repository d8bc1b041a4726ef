use std::{
    fmt,
    sync::{
        Arc, OnceLock,
        atomic::{AtomicUsize, Ordering},
    },
};

use parking_lot::Mutex;

use crate::{EventName, OccurredEvent, Parameters};

const BUCKETS: usize = usize::BITS as usize;

type Slots = Box<[OnceLock<Arc<OccurredEvent>>]>;

/// Append-only, thread-safe sequence of recorded occurrences.
///
/// Appends are serialized by a single lock and receive strictly increasing
/// sequence numbers, so log order is sequence order. Readers hold the lock
/// only long enough to capture the current length; the occurrences
/// themselves are read without it, so a long query never stalls a raise.
pub struct OccurrenceLog {
    inner: Mutex<LogInner>,
    first_bucket: usize,
    #[cfg(feature = "tokio")]
    appended: tokio::sync::Notify,
}

struct LogInner {
    segments: Arc<Segments>,
    next_sequence: u64,
}

/// Storage whose slots never move once written.
///
/// Bucket `b` holds `first << b` slots and is allocated on first use. Only
/// the holder of the log's lock writes; readers look at slots below `len`.
struct Segments {
    first: usize,
    buckets: [OnceLock<Slots>; BUCKETS],
    len: AtomicUsize,
}

impl Segments {
    fn new(first: usize) -> Self {
        Self {
            first: first.max(1),
            buckets: [const { OnceLock::new() }; BUCKETS],
            len: AtomicUsize::new(0),
        }
    }

    fn locate(&self, index: usize) -> (usize, usize) {
        let k = index / self.first + 1;
        let bucket = (usize::BITS - 1 - k.leading_zeros()) as usize;
        let start = self.first * ((1 << bucket) - 1);
        (bucket, index - start)
    }

    fn push(&self, occurrence: Arc<OccurredEvent>) {
        let index = self.len.load(Ordering::Relaxed);
        let (bucket, offset) = self.locate(index);
        let slots = self.buckets[bucket]
            .get_or_init(|| (0..self.first << bucket).map(|_| OnceLock::new()).collect());
        // The slot at `len` has never been written.
        let _ = slots[offset].set(occurrence);
        self.len.store(index + 1, Ordering::Release);
    }

    fn get(&self, index: usize) -> Option<&Arc<OccurredEvent>> {
        let (bucket, offset) = self.locate(index);
        self.buckets[bucket].get()?.get(offset)?.get()
    }
}

/// Iterator over the occurrences present when it was created.
pub(crate) struct Entries {
    segments: Arc<Segments>,
    next: usize,
    end: usize,
}

impl Iterator for Entries {
    type Item = Arc<OccurredEvent>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.end {
            return None;
        }
        let occurrence = self.segments.get(self.next).cloned();
        self.next += 1;
        occurrence
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.end - self.next;
        (remaining, Some(remaining))
    }
}

impl OccurrenceLog {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(LogInner {
                segments: Arc::new(Segments::new(capacity)),
                next_sequence: 1,
            }),
            first_bucket: capacity,
            #[cfg(feature = "tokio")]
            appended: tokio::sync::Notify::new(),
        }
    }

    /// Record an occurrence and return the sequence number it was assigned.
    pub(crate) fn append(&self, event_name: EventName, parameters: Parameters) -> u64 {
        let sequence = {
            let mut inner = self.inner.lock();
            let sequence = inner.next_sequence;
            inner.next_sequence += 1;
            inner
                .segments
                .push(Arc::new(OccurredEvent::new(event_name, sequence, parameters)));
            sequence
        };
        #[cfg(feature = "tokio")]
        self.appended.notify_waiters();
        sequence
    }

    /// Remove every occurrence. Sequence numbers keep counting.
    ///
    /// Iterators taken before the call keep seeing the old occurrences.
    pub(crate) fn clear(&self) {
        self.inner.lock().segments = Arc::new(Segments::new(self.first_bucket));
    }

    /// Lazily walk the occurrences recorded so far, in sequence order.
    pub(crate) fn entries(&self) -> Entries {
        let segments = self.inner.lock().segments.clone();
        let end = segments.len.load(Ordering::Acquire);
        Entries {
            segments,
            next: 0,
            end,
        }
    }

    /// Returns the occurrences recorded so far, in sequence order.
    pub fn snapshot(&self) -> Vec<Arc<OccurredEvent>> {
        self.entries().collect()
    }

    /// Returns the number of recorded occurrences.
    pub fn len(&self) -> usize {
        self.inner.lock().segments.len.load(Ordering::Acquire)
    }

    /// Returns true if nothing has been recorded since creation or the last reset.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[cfg(feature = "tokio")]
    pub(crate) fn appended(&self) -> &tokio::sync::Notify {
        &self.appended
    }
}

impl fmt::Debug for OccurrenceLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("OccurrenceLog")
            .field("entries", &inner.segments.len.load(Ordering::Acquire))
            .field("next_sequence", &inner.next_sequence)
            .finish()
    }
}
