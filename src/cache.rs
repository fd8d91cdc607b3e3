use crate::{
    stats::{CacheStats, StatsCounter},
    table::{AppendOnlyTable, InsertionResult},
    Argument, CacheBuilder, Error, Nullable,
};

use std::{
    borrow::Borrow,
    collections::hash_map::RandomState,
    fmt,
    hash::{BuildHasher, Hash},
    sync::Arc,
};

/// What a successful [`put_with_outcome`][put-with-outcome] did.
///
/// [put-with-outcome]: ./struct.PublishCache.html#method.put_with_outcome
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PutOutcome {
    /// The key was absent and this call published the entry.
    Inserted,
    /// The key was already present. The stored value was left untouched and the
    /// given key and value were dropped.
    AlreadyPresent,
}

/// A thread-safe, write-once map for handing values from producers to readers.
///
/// `PublishCache` stores at most one value per key. The first successful
/// [`put`](#method.put) for a key publishes its value; every later `put` for the
/// same key is a silent no-op. Entries are never updated or removed, so once a
/// reader has seen a key, [`get`](#method.get) and [`contains`](#method.contains)
/// keep returning the same answer for the lifetime of the cache.
///
/// Reads never take a lock. They probe a lock-free hash table under an epoch
/// guard and always observe a fully written key and value. Puts for a key that
/// is already present take no lock either; only a put that has to insert takes
/// the cache's single write lock, checks for the key again and inserts it.
///
/// Keys and values are checked with [`Nullable`][nullable-trait] and a put with
/// a null or empty key or value fails with
/// [`Error::InvalidArgument`][invalid-arg].
///
/// # Examples
///
/// A producer thread publishes one value per key while consumer threads poll
/// for it:
///
/// ```rust
/// use keyed_publish::PublishCache;
///
/// use std::{sync::Arc, thread};
///
/// const NUM_ACTORS: u32 = 64;
///
/// let cache: PublishCache<u32, Arc<String>> = PublishCache::new();
///
/// let consumers: Vec<_> = (1..=4)
///     .map(|_| {
///         // To share the same cache across the threads, clone it.
///         // This is a cheap operation.
///         let my_cache = cache.clone();
///         thread::spawn(move || {
///             for id in 1..=NUM_ACTORS {
///                 while !my_cache.contains(&id) {
///                     thread::yield_now();
///                 }
///                 // Once `contains` has returned true, `get` cannot fail.
///                 let route = my_cache.get(&id).unwrap();
///                 assert_eq!(*route, format!("route {id}"));
///             }
///         })
///     })
///     .collect();
///
/// let producer = {
///     let my_cache = cache.clone();
///     thread::spawn(move || {
///         for id in 1..=NUM_ACTORS {
///             my_cache.put(id, Arc::new(format!("route {id}"))).unwrap();
///         }
///     })
/// };
///
/// producer.join().expect("Failed");
/// consumers.into_iter().for_each(|t| t.join().expect("Failed"));
///
/// assert_eq!(cache.len(), NUM_ACTORS as usize);
/// ```
///
/// # Avoiding to clone the value at `get`
///
/// `get` returns a clone of the stored value `V`. If your values are expensive to
/// clone, wrap them by `std::sync::Arc` before storing them. Its `clone()` method
/// is cheap, and `Arc<T>` is never null.
///
/// # Hashing Algorithm
///
/// By default, `PublishCache` uses the hashing algorithm of
/// `std::collections::HashMap`, which is currently SipHash 1-3. Another
/// algorithm can be set with [`CacheBuilder::build_with_hasher`][build-with-hasher].
///
/// [nullable-trait]: ./trait.Nullable.html
/// [invalid-arg]: ./enum.Error.html#variant.InvalidArgument
/// [build-with-hasher]: ./struct.CacheBuilder.html#method.build_with_hasher
pub struct PublishCache<K, V, S = RandomState> {
    inner: Arc<Inner<K, V, S>>,
}

struct Inner<K, V, S> {
    name: Option<String>,
    table: AppendOnlyTable<K, V, S>,
    stats: Option<StatsCounter>,
}

impl<K, V, S> Clone for PublishCache<K, V, S> {
    /// Makes a clone of this shared cache.
    ///
    /// This operation is cheap as it only creates thread-safe reference counted
    /// pointers to the shared internal data structures.
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<K, V, S> fmt::Debug for PublishCache<K, V, S>
where
    K: fmt::Debug,
    V: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut d_map = f.debug_map();

        self.inner.table.for_each(|k, v| {
            d_map.entry(k, v);
        });

        d_map.finish()
    }
}

impl<K, V> PublishCache<K, V, RandomState>
where
    K: Hash + Eq + Nullable + Send + Sync + 'static,
    V: Clone + Nullable + Send + Sync + 'static,
{
    /// Constructs a new, empty `PublishCache<K, V>`.
    ///
    /// To adjust configuration knobs such as `initial_capacity` or the hasher, use
    /// the [`CacheBuilder`][builder-struct].
    ///
    /// [builder-struct]: ./struct.CacheBuilder.html
    pub fn new() -> Self {
        let build_hasher = RandomState::default();
        Self::with_everything(None, None, build_hasher, false)
    }

    /// Returns a [`CacheBuilder`][builder-struct], which can build a
    /// `PublishCache` with various configuration knobs.
    ///
    /// [builder-struct]: ./struct.CacheBuilder.html
    pub fn builder() -> CacheBuilder<K, V> {
        CacheBuilder::default()
    }
}

impl<K, V> Default for PublishCache<K, V, RandomState>
where
    K: Hash + Eq + Nullable + Send + Sync + 'static,
    V: Clone + Nullable + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, S> PublishCache<K, V, S>
where
    K: Hash + Eq + Nullable + Send + Sync + 'static,
    V: Clone + Nullable + Send + Sync + 'static,
    S: BuildHasher + Send + Sync + 'static,
{
    pub(crate) fn with_everything(
        name: Option<String>,
        initial_capacity: Option<usize>,
        build_hasher: S,
        record_stats: bool,
    ) -> Self {
        let table =
            AppendOnlyTable::with_capacity_and_hasher(initial_capacity.unwrap_or(0), build_hasher);

        Self {
            inner: Arc::new(Inner {
                name,
                table,
                stats: record_stats.then(StatsCounter::default),
            }),
        }
    }

    /// Publishes `value` for `key` unless the key is already present.
    ///
    /// The first successful put for a key wins. A put for a key that is already
    /// present is not an error: it returns `Ok(())`, leaves the stored value as it
    /// is and drops the given key and value. Use
    /// [`put_with_outcome`](#method.put_with_outcome) to find out which of the two
    /// happened.
    ///
    /// Once this method returns, the entry is visible to every thread that
    /// synchronizes with the caller afterwards.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`][invalid-arg] if the key or the value is
    /// null or empty (see [`Nullable`][nullable-trait]). The key is checked first.
    /// The cache is not modified.
    ///
    /// [invalid-arg]: ./enum.Error.html#variant.InvalidArgument
    /// [nullable-trait]: ./trait.Nullable.html
    pub fn put(&self, key: K, value: V) -> Result<(), Error> {
        self.put_with_outcome(key, value).map(|_| ())
    }

    /// Same as [`put`](#method.put), but reports whether this call published the
    /// entry.
    ///
    /// When many threads put the same key concurrently, exactly one of them gets
    /// `PutOutcome::Inserted`.
    pub fn put_with_outcome(&self, key: K, value: V) -> Result<PutOutcome, Error> {
        if let Err(e) = check_arguments(&key, &value) {
            self.record(StatsCounter::record_rejected_put);
            #[cfg(feature = "logging")]
            log::warn!("{}: rejected a put: {}", self.log_name(), e);
            return Err(e);
        }

        let hash = self.inner.table.hash(&key);

        match self.inner.table.insert_if_absent(key, hash, value) {
            InsertionResult::Inserted { grown_to } => {
                if let Some(length) = grown_to {
                    self.log_growth(length);
                }
                self.record(StatsCounter::record_insert);
                Ok(PutOutcome::Inserted)
            }
            InsertionResult::AlreadyPresent => {
                self.record(StatsCounter::record_duplicate_put);
                Ok(PutOutcome::AlreadyPresent)
            }
        }
    }

    /// Returns a _clone_ of the value corresponding to the key.
    ///
    /// The key may be any borrowed form of the cache's key type, but `Hash` and `Eq`
    /// on the borrowed form _must_ match those for the key type.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`][not-found] if no value has been published for
    /// the key.
    ///
    /// [not-found]: ./enum.Error.html#variant.NotFound
    pub fn get<Q>(&self, key: &Q) -> Result<V, Error>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let hash = self.inner.table.hash(key);
        let maybe_value = self
            .inner
            .table
            .get_key_value_and(key, hash, |_, v| v.clone());
        self.record_lookup(maybe_value.is_some());

        maybe_value.ok_or(Error::NotFound)
    }

    /// Returns `true` if a value has been published for the key.
    ///
    /// The key may be any borrowed form of the cache's key type, but `Hash` and `Eq`
    /// on the borrowed form _must_ match those for the key type.
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let hash = self.inner.table.hash(key);
        let found = self.inner.table.contains_key(key, hash);
        self.record_lookup(found);

        found
    }

    /// Returns a snapshot of the entries in the cache, in no particular order.
    ///
    /// Every entry published before this call started is included. Entries
    /// published concurrently may or may not be.
    pub fn entries(&self) -> Vec<(K, V)>
    where
        K: Clone,
    {
        let mut entries = Vec::with_capacity(self.len());
        self.inner
            .table
            .for_each(|k, v| entries.push((k.clone(), v.clone())));
        entries
    }

    /// Returns the number of entries in the cache.
    pub fn len(&self) -> usize {
        self.inner.table.len()
    }

    /// Returns `true` if nothing has been published yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns cache's name.
    pub fn name(&self) -> Option<&str> {
        self.inner.name.as_deref()
    }

    /// Returns a snapshot of the cache statistics.
    ///
    /// All counts are zero unless the cache was built with
    /// [`CacheBuilder::record_stats`][record-stats].
    ///
    /// [record-stats]: ./struct.CacheBuilder.html#method.record_stats
    pub fn stats(&self) -> CacheStats {
        self.inner
            .stats
            .as_ref()
            .map(StatsCounter::snapshot)
            .unwrap_or_default()
    }

    #[inline]
    fn record(&self, f: impl FnOnce(&StatsCounter)) {
        if let Some(counter) = &self.inner.stats {
            f(counter);
        }
    }

    #[inline]
    fn record_lookup(&self, hit: bool) {
        if hit {
            self.record(StatsCounter::record_hit);
        } else {
            self.record(StatsCounter::record_miss);
        }
    }

    #[allow(unused_variables)]
    fn log_growth(&self, bucket_array_length: usize) {
        #[cfg(feature = "logging")]
        log::trace!(
            "{}: grew the bucket array to {} buckets",
            self.log_name(),
            bucket_array_length
        );
    }

    #[cfg(feature = "logging")]
    fn log_name(&self) -> &str {
        self.name().unwrap_or("unnamed cache")
    }
}

fn check_arguments<K, V>(key: &K, value: &V) -> Result<(), Error>
where
    K: Nullable,
    V: Nullable,
{
    if key.is_null() {
        Err(Error::InvalidArgument(Argument::Key))
    } else if value.is_null() {
        Err(Error::InvalidArgument(Argument::Value))
    } else {
        Ok(())
    }
}
