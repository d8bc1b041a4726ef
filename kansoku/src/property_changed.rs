//! Support for subjects with observable properties.
//!
//! Such a subject raises one event, [`PROPERTY_CHANGED`], for every property
//! change and passes a [`PropertyChangedArgs`] naming the changed property.
//! Filtering by property goes through the ordinary
//! [`EventRecording::with_args`](crate::EventRecording::with_args) path with a
//! predicate built by [`property_filter`].

/// Name of the event raised for every property change.
pub const PROPERTY_CHANGED: &str = "PropertyChanged";

/// Payload of the [`PROPERTY_CHANGED`] event.
///
/// `property_name` is `None` when the subject reports that it changed
/// without naming a property.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PropertyChangedArgs {
    property_name: Option<String>,
}

impl PropertyChangedArgs {
    pub fn new(property_name: impl Into<String>) -> Self {
        Self {
            property_name: Some(property_name.into()),
        }
    }

    /// Payload for a change that does not name a property.
    pub fn unnamed() -> Self {
        Self {
            property_name: None,
        }
    }

    pub fn property_name(&self) -> Option<&str> {
        self.property_name.as_deref()
    }

    /// Returns true if this payload satisfies `filter`.
    ///
    /// A `None` filter matches every payload, named or not. `Some(name)`
    /// matches only payloads naming exactly `name`.
    pub fn matches(&self, filter: Option<&str>) -> bool {
        match filter {
            None => true,
            Some(name) => self.property_name() == Some(name),
        }
    }
}

/// Build a predicate over [`PropertyChangedArgs`] for
/// [`EventRecording::with_args`](crate::EventRecording::with_args).
///
/// `None` means "any property" rather than "the property named null".
///
/// ```rust
/// use kansoku::{PropertyChangedArgs, property_filter};
///
/// let age = property_filter(Some("Age"));
/// assert!(age(&PropertyChangedArgs::new("Age")));
/// assert!(!age(&PropertyChangedArgs::new("Name")));
///
/// let any = property_filter(None);
/// assert!(any(&PropertyChangedArgs::new("Name")));
/// ```
pub fn property_filter(
    filter: Option<&str>,
) -> impl Fn(&PropertyChangedArgs) -> bool + Send + Sync + 'static {
    let filter = filter.map(str::to_owned);
    move |args| args.matches(filter.as_deref())
}
