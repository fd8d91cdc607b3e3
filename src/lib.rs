#![warn(clippy::all)]
#![warn(rust_2018_idioms)]
#![deny(missing_docs)]

//! `keyed-publish` provides [`PublishCache`], a concurrent, write-once map for
//! handing values from producer threads to any number of readers.
//!
//! A producer publishes a value for a key at most once with
//! [`put`](PublishCache::put). Readers look it up with
//! [`get`](PublishCache::get) or test for it with
//! [`contains`](PublishCache::contains) without blocking each other or the
//! producer:
//!
//! - The first put for a key wins. Later puts for the same key succeed without
//!   changing anything.
//! - Entries are never updated or removed. Once a reader sees a key, it keeps
//!   seeing the same value.
//! - Null or empty keys and values (as defined by [`Nullable`]) are rejected
//!   with [`Error::InvalidArgument`].
//! - Looking up a key that was never published fails with [`Error::NotFound`]
//!   rather than returning a default value.
//!
//! # Example
//!
//! ```rust
//! use keyed_publish::{Error, PublishCache, PutOutcome};
//!
//! let cache = PublishCache::new();
//!
//! cache.put("vehicle-12", 3u32).unwrap();
//! assert_eq!(cache.get("vehicle-12"), Ok(3));
//!
//! // First writer wins.
//! assert_eq!(cache.put_with_outcome("vehicle-12", 5), Ok(PutOutcome::AlreadyPresent));
//! assert_eq!(cache.get("vehicle-12"), Ok(3));
//!
//! assert!(!cache.contains("vehicle-13"));
//! assert_eq!(cache.get("vehicle-13"), Err(Error::NotFound));
//! ```
//!
//! # Crate Features
//!
//! - `logging`: Emits log records through the [`log`] crate facade when a put is
//!   rejected and when a cache grows its internal table. Disabled by default.
//!
//! [`log`]: https://docs.rs/log

mod builder;
mod cache;
mod error;
mod nullable;
mod stats;
mod table;

pub use {
    builder::CacheBuilder,
    cache::{PublishCache, PutOutcome},
    error::{Argument, Error},
    nullable::Nullable,
    stats::CacheStats,
};
