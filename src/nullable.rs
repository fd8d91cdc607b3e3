use std::{
    num::{
        NonZeroI128, NonZeroI16, NonZeroI32, NonZeroI64, NonZeroI8, NonZeroIsize, NonZeroU128,
        NonZeroU16, NonZeroU32, NonZeroU64, NonZeroU8, NonZeroUsize,
    },
    sync::Arc,
};

/// A type with a null or empty value that must never be stored in a
/// [`PublishCache`][cache-struct].
///
/// Both the key and the value of a [`put`][put-method] are checked with
/// `is_null`, and the put fails with [`Error::InvalidArgument`][invalid-arg] if
/// either of them is null.
///
/// The provided implementations are:
///
/// - Integers: `0` is null. Numeric ids use `0` for "no id".
/// - `NonZero*` integers, `Arc<T>` and `Box<T>`: never null.
/// - `str`, `String`, `[T]` and `Vec<T>`: null when empty.
/// - `Option<T>`: null when `None`.
/// - `&T`: null when `T` is null.
///
/// # Examples
///
/// ```rust
/// use keyed_publish::{Argument, Error, Nullable, PublishCache};
///
/// #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
/// struct ActorId(u32);
///
/// impl Nullable for ActorId {
///     fn is_null(&self) -> bool {
///         self.0 == 0
///     }
/// }
///
/// let velocities = PublishCache::new();
/// velocities.put(ActorId(7), "12.5 m/s").unwrap();
///
/// assert_eq!(
///     velocities.put(ActorId(0), "0.0 m/s"),
///     Err(Error::InvalidArgument(Argument::Key))
/// );
/// ```
///
/// [cache-struct]: ./struct.PublishCache.html
/// [put-method]: ./struct.PublishCache.html#method.put
/// [invalid-arg]: ./enum.Error.html#variant.InvalidArgument
pub trait Nullable {
    /// Returns `true` if this is the null or empty value of the type.
    fn is_null(&self) -> bool;
}

macro_rules! zero_is_null {
    ($($t:ty),*) => {
        $(
            impl Nullable for $t {
                #[inline]
                fn is_null(&self) -> bool {
                    *self == 0
                }
            }
        )*
    };
}

macro_rules! never_null {
    ($($t:ty),*) => {
        $(
            impl Nullable for $t {
                #[inline]
                fn is_null(&self) -> bool {
                    false
                }
            }
        )*
    };
}

zero_is_null!(u8, u16, u32, u64, u128, usize, i8, i16, i32, i64, i128, isize);

never_null!(
    NonZeroU8,
    NonZeroU16,
    NonZeroU32,
    NonZeroU64,
    NonZeroU128,
    NonZeroUsize,
    NonZeroI8,
    NonZeroI16,
    NonZeroI32,
    NonZeroI64,
    NonZeroI128,
    NonZeroIsize
);

impl Nullable for str {
    #[inline]
    fn is_null(&self) -> bool {
        self.is_empty()
    }
}

impl Nullable for String {
    #[inline]
    fn is_null(&self) -> bool {
        self.is_empty()
    }
}

impl<T> Nullable for [T] {
    #[inline]
    fn is_null(&self) -> bool {
        self.is_empty()
    }
}

impl<T> Nullable for Vec<T> {
    #[inline]
    fn is_null(&self) -> bool {
        self.is_empty()
    }
}

impl<T> Nullable for Option<T> {
    #[inline]
    fn is_null(&self) -> bool {
        self.is_none()
    }
}

// A shared or boxed handle always points at something.
impl<T: ?Sized> Nullable for Arc<T> {
    #[inline]
    fn is_null(&self) -> bool {
        false
    }
}

impl<T: ?Sized> Nullable for Box<T> {
    #[inline]
    fn is_null(&self) -> bool {
        false
    }
}

impl<T: Nullable + ?Sized> Nullable for &T {
    #[inline]
    fn is_null(&self) -> bool {
        (**self).is_null()
    }
}

#[cfg(test)]
mod tests {
    use super::Nullable;
    use std::{num::NonZeroU32, sync::Arc};

    #[test]
    fn integers() {
        assert!(0u32.is_null());
        assert!(0i64.is_null());
        assert!(!1u8.is_null());
        assert!(!(-1isize).is_null());
        assert!(!NonZeroU32::new(5).unwrap().is_null());
    }

    #[test]
    fn strings_and_collections() {
        assert!("".is_null());
        assert!(!"actor".is_null());
        assert!(String::new().is_null());
        assert!(!String::from("actor").is_null());
        assert!(Vec::<u8>::new().is_null());
        assert!(!vec![0u8].is_null());
        assert!(<[u8]>::is_null(&[]));
    }

    #[test]
    fn options_and_handles() {
        assert!(None::<u32>.is_null());
        // `Option` only checks for `None`, not the wrapped value.
        assert!(!Some(0u32).is_null());
        assert!(!Arc::new(0u32).is_null());
        assert!(!Arc::<str>::from("").is_null());
        assert!(!Box::new(String::new()).is_null());
    }

    #[test]
    fn references_delegate() {
        let empty = String::new();
        let id = 42u64;
        assert!(<&String as Nullable>::is_null(&&empty));
        assert!(!<&&u64 as Nullable>::is_null(&&&id));
    }
}
