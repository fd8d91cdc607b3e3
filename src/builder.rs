use crate::{Nullable, PublishCache};

use std::{
    collections::hash_map::RandomState,
    hash::{BuildHasher, Hash},
    marker::PhantomData,
};

/// Builds a [`PublishCache`][cache-struct] with various configuration knobs.
///
/// [cache-struct]: ./struct.PublishCache.html
///
/// # Examples
///
/// ```rust
/// use keyed_publish::CacheBuilder;
///
/// let cache = CacheBuilder::new()
///     .name("actor-locations")
///     // Room for 1,000 actors before the table has to grow.
///     .initial_capacity(1_000)
///     .record_stats()
///     .build();
///
/// cache.put(42u32, "junction 7").unwrap();
/// assert_eq!(cache.get(&42), Ok("junction 7"));
/// assert_eq!(cache.stats().insert_count(), 1);
/// ```
///
pub struct CacheBuilder<K, V> {
    name: Option<String>,
    initial_capacity: Option<usize>,
    record_stats: bool,
    cache_type: PhantomData<PublishCache<K, V>>,
}

impl<K, V> Default for CacheBuilder<K, V>
where
    K: Hash + Eq + Nullable + Send + Sync + 'static,
    V: Clone + Nullable + Send + Sync + 'static,
{
    fn default() -> Self {
        Self {
            name: None,
            initial_capacity: None,
            record_stats: false,
            cache_type: PhantomData,
        }
    }
}

impl<K, V> CacheBuilder<K, V>
where
    K: Hash + Eq + Nullable + Send + Sync + 'static,
    V: Clone + Nullable + Send + Sync + 'static,
{
    /// Construct a new `CacheBuilder` that will be used to build a `PublishCache`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a `PublishCache<K, V>`.
    pub fn build(self) -> PublishCache<K, V, RandomState> {
        let build_hasher = RandomState::default();
        PublishCache::with_everything(
            self.name,
            self.initial_capacity,
            build_hasher,
            self.record_stats,
        )
    }

    /// Builds a `PublishCache<K, V, S>`, with the given `hasher`.
    pub fn build_with_hasher<S>(self, hasher: S) -> PublishCache<K, V, S>
    where
        S: BuildHasher + Send + Sync + 'static,
    {
        PublishCache::with_everything(
            self.name,
            self.initial_capacity,
            hasher,
            self.record_stats,
        )
    }
}

impl<K, V> CacheBuilder<K, V> {
    /// Sets the name of the cache. The name appears in log messages when the
    /// `logging` feature is enabled.
    pub fn name(self, name: &str) -> Self {
        Self {
            name: Some(name.to_string()),
            ..self
        }
    }

    /// Sets the initial capacity (number of entries) of the cache.
    pub fn initial_capacity(self, number_of_entries: usize) -> Self {
        Self {
            initial_capacity: Some(number_of_entries),
            ..self
        }
    }

    /// Enables the hit, miss and put counters returned by
    /// [`PublishCache::stats`][stats-method].
    ///
    /// Counting is off by default so that readers do not contend on shared
    /// counters.
    ///
    /// [stats-method]: ./struct.PublishCache.html#method.stats
    pub fn record_stats(self) -> Self {
        Self {
            record_stats: true,
            ..self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::CacheBuilder;

    #[test]
    fn build_cache() {
        // PublishCache<&str, String>
        let cache = CacheBuilder::new().build();

        assert_eq!(cache.name(), None);
        assert!(cache.is_empty());

        cache.put("a", "Alice".to_string()).unwrap();
        assert_eq!(cache.get("a"), Ok("Alice".to_string()));
        // Stats are disabled by default.
        assert_eq!(cache.stats().insert_count(), 0);

        let cache = CacheBuilder::new()
            .name("tracked")
            .initial_capacity(100)
            .record_stats()
            .build();

        assert_eq!(cache.name(), Some("tracked"));

        cache.put("b", "Bob".to_string()).unwrap();
        assert_eq!(cache.get("b"), Ok("Bob".to_string()));
        assert_eq!(cache.stats().insert_count(), 1);
        assert_eq!(cache.stats().hit_count(), 1);
    }

    #[test]
    fn build_cache_with_hasher() {
        let cache = CacheBuilder::new()
            .initial_capacity(10)
            .build_with_hasher(ahash::RandomState::default());

        cache.put(1u64, vec![1u8, 2, 3]).unwrap();
        assert!(cache.contains(&1));
        assert_eq!(cache.get(&1), Ok(vec![1, 2, 3]));
    }
}
