use std::fmt;

/// The argument of a [`put`][put-method] that was rejected.
///
/// [put-method]: ./struct.PublishCache.html#method.put
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Argument {
    /// The key.
    Key,
    /// The value.
    Value,
}

impl fmt::Display for Argument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Key => f.write_str("key"),
            Self::Value => f.write_str("value"),
        }
    }
}

/// The error type for the operations of [`PublishCache`][cache-struct].
///
/// [cache-struct]: ./struct.PublishCache.html
#[derive(thiserror::Error, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Error {
    /// A put was called with a null or empty key or value, as defined by the
    /// [`Nullable`][nullable-trait] implementation of its type. This is a bug in
    /// the caller; the cache was not modified.
    ///
    /// [nullable-trait]: ./trait.Nullable.html
    #[error("invalid argument: the {0} is null or empty")]
    InvalidArgument(Argument),

    /// A get was called for a key that has not been published.
    #[error("no entry found for the key")]
    NotFound,
}
