use std::{
    borrow::Borrow,
    hash::{BuildHasher, Hash, Hasher},
    sync::atomic::Ordering,
};

use crossbeam_epoch::{Atomic, Guard, Shared};

pub(crate) const BUCKET_ARRAY_DEFAULT_LENGTH: usize = 16;

pub(crate) struct BucketArray<K, V> {
    pub(crate) buckets: Box<[Atomic<Bucket<K, V>>]>,
}

impl<K, V> BucketArray<K, V> {
    pub(crate) fn with_length(length: usize) -> Self {
        assert!(length.is_power_of_two());

        let buckets = std::iter::repeat_with(Atomic::null).take(length).collect();

        Self { buckets }
    }

    /// Returns the length of the smallest bucket array that can hold `capacity`
    /// entries without growing.
    pub(crate) fn length_for_capacity(capacity: usize) -> usize {
        capacity
            .saturating_mul(2)
            .max(BUCKET_ARRAY_DEFAULT_LENGTH)
            .next_power_of_two()
    }

    /// The number of entries this array holds before the table must grow it.
    /// Keeps the load factor at or below one half.
    pub(crate) fn capacity(&self) -> usize {
        assert!(self.buckets.len().is_power_of_two());

        self.buckets.len() / 2
    }

    fn probe(&self, hash: u64) -> impl Iterator<Item = &Atomic<Bucket<K, V>>> + '_ {
        let mask = self.buckets.len() - 1;
        let offset = hash as usize & mask;

        (0..self.buckets.len()).map(move |i| &self.buckets[(offset + i) & mask])
    }
}

impl<'g, K: 'g, V: 'g> BucketArray<K, V> {
    pub(crate) fn get<Q>(&self, guard: &'g Guard, hash: u64, key: &Q) -> Option<&'g Bucket<K, V>>
    where
        K: Borrow<Q>,
        Q: Eq + ?Sized,
    {
        for this_bucket in self.probe(hash) {
            let this_bucket_ptr = this_bucket.load(Ordering::Acquire, guard);

            // SAFETY: A published bucket is never freed while its table is alive.
            let Some(this_bucket_ref) = (unsafe { this_bucket_ptr.as_ref() }) else {
                // Not found. Buckets are never removed, so a vacant slot ends the
                // probe sequence.
                return None;
            };

            if this_bucket_ref.hash == hash && this_bucket_ref.key.borrow() == key {
                return Some(this_bucket_ref);
            }
        }

        None
    }

    /// Stores `bucket_ptr` into the first vacant slot of its probe sequence.
    ///
    /// The bucket must be fully initialized; the `Release` store is what publishes
    /// it to readers. Only the holder of the table's write lock may call this.
    pub(crate) fn insert_vacant(&self, guard: &'g Guard, bucket_ptr: Shared<'g, Bucket<K, V>>) {
        assert!(!bucket_ptr.is_null());

        let hash = unsafe { bucket_ptr.deref() }.hash;

        for this_bucket in self.probe(hash) {
            if this_bucket.load(Ordering::Relaxed, guard).is_null() {
                this_bucket.store(bucket_ptr, Ordering::Release);
                return;
            }
        }

        unreachable!("a bucket array at or below half load always has a vacant slot");
    }

    /// Returns a new array twice as long holding the same bucket pointers.
    ///
    /// Buckets are shared, not copied. After the new array is published, the old
    /// one must be retired without dropping the buckets it points to.
    pub(crate) fn grow(&'g self, guard: &'g Guard) -> BucketArray<K, V> {
        let new_bucket_array = BucketArray::with_length(self.buckets.len() * 2);

        for bucket_ptr in self.iter(guard) {
            new_bucket_array.insert_vacant(guard, bucket_ptr);
        }

        new_bucket_array
    }

    pub(crate) fn iter(
        &'g self,
        guard: &'g Guard,
    ) -> impl Iterator<Item = Shared<'g, Bucket<K, V>>> + 'g {
        self.buckets
            .iter()
            .map(move |b| b.load(Ordering::Acquire, guard))
            .filter(|p| !p.is_null())
    }
}

#[derive(Debug)]
pub(crate) struct Bucket<K, V> {
    pub(crate) hash: u64,
    pub(crate) key: K,
    pub(crate) value: V,
}

impl<K, V> Bucket<K, V> {
    pub(crate) fn new(hash: u64, key: K, value: V) -> Self {
        Self { hash, key, value }
    }
}

pub(crate) fn hash<K, H>(build_hasher: &H, key: &K) -> u64
where
    K: ?Sized + Hash,
    H: BuildHasher,
{
    let mut hasher = build_hasher.build_hasher();
    key.hash(&mut hasher);

    hasher.finish()
}
