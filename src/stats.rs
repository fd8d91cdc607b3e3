use crossbeam_utils::{atomic::AtomicCell, CachePadded};

/// A snapshot of the counters of a [`PublishCache`][cache-struct].
///
/// The counters are only updated when the cache was built with
/// [`CacheBuilder::record_stats`][record-stats]. Otherwise every count is zero.
///
/// [cache-struct]: crate::PublishCache
/// [record-stats]: crate::CacheBuilder::record_stats
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    hit_count: u64,
    miss_count: u64,
    insert_count: u64,
    duplicate_put_count: u64,
    rejected_put_count: u64,
}

impl CacheStats {
    /// The number of `get` calls that found their key, plus the number of
    /// `contains` calls that returned `true`.
    pub fn hit_count(&self) -> u64 {
        self.hit_count
    }

    /// The number of `get` calls that returned `NotFound`, plus the number of
    /// `contains` calls that returned `false`.
    pub fn miss_count(&self) -> u64 {
        self.miss_count
    }

    /// `hit_count + miss_count`, saturating at `u64::MAX`.
    pub fn request_count(&self) -> u64 {
        self.hit_count.saturating_add(self.miss_count)
    }

    /// The ratio of hits to requests, or `1.0` if there were no requests.
    pub fn hit_rate(&self) -> f64 {
        let req_count = self.request_count();
        if req_count == 0 {
            1.0
        } else {
            self.hit_count as f64 / req_count as f64
        }
    }

    /// The ratio of misses to requests, or `0.0` if there were no requests.
    pub fn miss_rate(&self) -> f64 {
        let req_count = self.request_count();
        if req_count == 0 {
            0.0
        } else {
            self.miss_count as f64 / req_count as f64
        }
    }

    /// The number of puts that inserted an entry.
    pub fn insert_count(&self) -> u64 {
        self.insert_count
    }

    /// The number of valid puts for a key that was already present.
    pub fn duplicate_put_count(&self) -> u64 {
        self.duplicate_put_count
    }

    /// The number of puts rejected for a null or empty key or value.
    pub fn rejected_put_count(&self) -> u64 {
        self.rejected_put_count
    }
}

fn saturating_add(counter: &AtomicCell<u64>, value: u64) {
    let mut v0 = counter.load();
    loop {
        let v1 = v0.saturating_add(value);
        match counter.compare_exchange(v0, v1) {
            Ok(_) => break,
            Err(v2) => v0 = v2,
        }
    }
}

#[derive(Default)]
pub(crate) struct StatsCounter {
    hit_count: CachePadded<AtomicCell<u64>>,
    miss_count: CachePadded<AtomicCell<u64>>,
    insert_count: AtomicCell<u64>,
    duplicate_put_count: AtomicCell<u64>,
    rejected_put_count: AtomicCell<u64>,
}

impl StatsCounter {
    pub(crate) fn record_hit(&self) {
        saturating_add(&self.hit_count, 1);
    }

    pub(crate) fn record_miss(&self) {
        saturating_add(&self.miss_count, 1);
    }

    pub(crate) fn record_insert(&self) {
        saturating_add(&self.insert_count, 1);
    }

    pub(crate) fn record_duplicate_put(&self) {
        saturating_add(&self.duplicate_put_count, 1);
    }

    pub(crate) fn record_rejected_put(&self) {
        saturating_add(&self.rejected_put_count, 1);
    }

    pub(crate) fn snapshot(&self) -> CacheStats {
        CacheStats {
            hit_count: self.hit_count.load(),
            miss_count: self.miss_count.load(),
            insert_count: self.insert_count.load(),
            duplicate_put_count: self.duplicate_put_count.load(),
            rejected_put_count: self.rejected_put_count.load(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{saturating_add, CacheStats, StatsCounter};
    use crossbeam_utils::atomic::AtomicCell;

    #[test]
    fn rates_without_requests() {
        let stats = CacheStats::default();
        assert_eq!(stats.request_count(), 0);
        assert_eq!(stats.hit_rate(), 1.0);
        assert_eq!(stats.miss_rate(), 0.0);
    }

    #[test]
    fn counter_snapshot() {
        let counter = StatsCounter::default();
        counter.record_hit();
        counter.record_hit();
        counter.record_hit();
        counter.record_miss();
        counter.record_insert();
        counter.record_duplicate_put();
        counter.record_duplicate_put();
        counter.record_rejected_put();

        let stats = counter.snapshot();
        assert_eq!(stats.hit_count(), 3);
        assert_eq!(stats.miss_count(), 1);
        assert_eq!(stats.request_count(), 4);
        assert_eq!(stats.hit_rate(), 0.75);
        assert_eq!(stats.miss_rate(), 0.25);
        assert_eq!(stats.insert_count(), 1);
        assert_eq!(stats.duplicate_put_count(), 2);
        assert_eq!(stats.rejected_put_count(), 1);
    }

    #[test]
    fn counters_saturate() {
        let counter = AtomicCell::new(u64::MAX - 1);
        saturating_add(&counter, 1);
        assert_eq!(counter.load(), u64::MAX);
        saturating_add(&counter, 1);
        assert_eq!(counter.load(), u64::MAX);
    }
}
