use std::{borrow::Borrow, fmt, hash::Hash, sync::Arc};

/// Name of an event a subject exposes.
///
/// `EventName` is cheap to clone and is shared between the subject's hub,
/// the monitor's subscriptions and every recorded occurrence. Equality uses
/// a pointer fast-path and falls back to string comparison, so names built
/// independently from the same text compare equal.
///
/// # Example
///
/// ```rust
/// use kansoku::EventName;
///
/// let name = EventName::new("Changed");
/// assert_eq!(name, "Changed");
/// assert_eq!(name.as_str(), "Changed");
/// ```
#[derive(Debug, Clone, Ord, PartialOrd)]
pub struct EventName(Arc<str>);

impl EventName {
    pub fn new(name: &str) -> Self {
        Self(Arc::from(name))
    }

    /// Returns the string representation of this event name.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl PartialEq for EventName {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0) || self.0 == other.0
    }
}

impl Eq for EventName {}

impl PartialEq<str> for EventName {
    fn eq(&self, other: &str) -> bool {
        &*self.0 == other
    }
}

impl PartialEq<&str> for EventName {
    fn eq(&self, other: &&str) -> bool {
        &*self.0 == *other
    }
}

impl Hash for EventName {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

impl Borrow<str> for EventName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EventName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for EventName {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for EventName {
    fn from(s: String) -> Self {
        Self(Arc::from(s))
    }
}

impl From<&EventName> for EventName {
    fn from(name: &EventName) -> Self {
        name.clone()
    }
}
