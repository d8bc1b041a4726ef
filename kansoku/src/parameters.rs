use std::{any::Any, fmt, sync::Arc};

/// A single type-erased argument passed to an event when it was raised.
///
/// `Arg` keeps the value behind an `Arc` so recording an occurrence never
/// clones the payload, and remembers the Rust type name for diagnostics.
#[derive(Clone)]
pub struct Arg {
    value: Arc<dyn Any + Send + Sync>,
    type_name: &'static str,
}

impl Arg {
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self {
            value: Arc::new(value),
            type_name: std::any::type_name::<T>(),
        }
    }

    /// Returns the value if it is a `T`.
    #[inline]
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.value.downcast_ref::<T>()
    }

    /// Returns true if the value is a `T`.
    #[inline]
    pub fn is<T: Any>(&self) -> bool {
        self.value.is::<T>()
    }

    /// Rust type name of the stored value.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }
}

impl fmt::Debug for Arg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Arg<{}>", self.type_name)
    }
}

/// Ordered arguments supplied to an event at raise time.
///
/// By convention the first parameter identifies the sender and the second
/// carries the payload, but any number of values of any `Send + Sync` type
/// may be passed. Build with the [`params!`](crate::params) macro:
///
/// ```rust
/// use kansoku::{params, Parameters};
///
/// let params: Parameters = params!["sender", 42u32];
/// assert_eq!(params.len(), 2);
/// assert_eq!(params.first_of::<u32>(), Some(&42));
/// ```
#[derive(Debug, Clone, Default)]
pub struct Parameters(Vec<Arg>);

impl Parameters {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Append a value, builder style.
    pub fn with<T: Any + Send + Sync>(mut self, value: T) -> Self {
        self.0.push(Arg::new(value));
        self
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Arg> {
        self.0.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arg> {
        self.0.iter()
    }

    /// Returns the first parameter that is a `T`, if any.
    pub fn first_of<T: Any>(&self) -> Option<&T> {
        self.0.iter().find_map(|arg| arg.downcast_ref::<T>())
    }

    /// Returns every parameter that is a `T`, in raise order.
    pub fn all_of<T: Any>(&self) -> impl Iterator<Item = &T> {
        self.0.iter().filter_map(|arg| arg.downcast_ref::<T>())
    }

    /// Type names of all parameters, in raise order.
    pub fn type_names(&self) -> Vec<&'static str> {
        self.0.iter().map(Arg::type_name).collect()
    }
}

impl From<Vec<Arg>> for Parameters {
    fn from(args: Vec<Arg>) -> Self {
        Self(args)
    }
}

impl FromIterator<Arg> for Parameters {
    fn from_iter<I: IntoIterator<Item = Arg>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Build [`Parameters`] from a list of values.
///
/// ```rust
/// use kansoku::params;
///
/// let empty = params![];
/// assert!(empty.is_empty());
///
/// let two = params!["door", true];
/// assert_eq!(two.first_of::<bool>(), Some(&true));
/// ```
#[macro_export]
macro_rules! params {
    () => {
        $crate::Parameters::new()
    };
    ($($value:expr),+ $(,)?) => {
        $crate::Parameters::new()$(.with($value))+
    };
}
