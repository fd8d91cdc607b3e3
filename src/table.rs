//! An append-only hash table with lock-free reads.
//!
//! The table is an open addressing hash table with linear probing. At its core
//! is a bucket array: a boxed slice of atomic pointers to buckets. Each bucket
//! holds a key, its hash and a value, and is never modified after it has been
//! published. In the context of this crate, an atomic pointer is a nullable
//! pointer that is accessed and manipulated using atomic memory operations.
//!
//! Readers pin a `crossbeam_epoch` guard, load the current bucket array with
//! `Acquire` ordering and probe it without taking any lock. A vacant slot ends
//! the probe sequence because entries are never removed.
//!
//! Writers serialize on a single mutex and use double-checked insertion: the
//! key is looked up without the lock first, and only a miss takes the lock,
//! looks the key up again and inserts it. A bucket is fully constructed before
//! its pointer is stored into a vacant slot with `Release` ordering, so a
//! reader that observes the pointer also observes the whole key and value.
//!
//! When the array would exceed a load factor of one half, the writer allocates
//! an array twice as long, copies the bucket pointers into it and swaps it in
//! with a single atomic store. The buckets themselves are shared by both arrays.
//! The superseded array is handed to the epoch collector, which frees its
//! pointer slice once no pinned reader can still be probing it. Buckets are
//! freed only when the table is dropped.

pub(crate) mod bucket;

use self::bucket::{Bucket, BucketArray};

use std::{
    borrow::Borrow,
    hash::{BuildHasher, Hash},
    sync::atomic::{self, AtomicUsize, Ordering},
};

use crossbeam_epoch::{Atomic, Guard, Owned};
use parking_lot::Mutex;

#[derive(Debug, PartialEq, Eq)]
pub(crate) enum InsertionResult {
    /// The entry was inserted by this call. `grown_to` holds the new bucket array
    /// length if the insertion had to grow the table.
    Inserted { grown_to: Option<usize> },
    AlreadyPresent,
}

pub(crate) struct AppendOnlyTable<K, V, S> {
    bucket_array: Atomic<BucketArray<K, V>>,
    build_hasher: S,
    len: AtomicUsize,
    write_lock: Mutex<()>,
}

impl<K, V, S> AppendOnlyTable<K, V, S> {
    pub(crate) fn with_capacity_and_hasher(capacity: usize, build_hasher: S) -> Self {
        let length = BucketArray::<K, V>::length_for_capacity(capacity);

        Self {
            bucket_array: Atomic::new(BucketArray::with_length(length)),
            build_hasher,
            len: AtomicUsize::default(),
            write_lock: Mutex::new(()),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.len.load(Ordering::Acquire)
    }

    #[cfg(test)]
    pub(crate) fn bucket_array_length(&self) -> usize {
        let guard = &crossbeam_epoch::pin();
        self.current(guard).buckets.len()
    }

    /// Calls `f` with every entry published before the call started. Entries
    /// published while it runs may or may not be visited.
    pub(crate) fn for_each(&self, mut f: impl FnMut(&K, &V)) {
        let guard = &crossbeam_epoch::pin();

        for bucket_ptr in self.current(guard).iter(guard) {
            let Bucket { key, value, .. } = unsafe { bucket_ptr.deref() };
            f(key, value);
        }
    }

    fn current<'g>(&self, guard: &'g Guard) -> &'g BucketArray<K, V> {
        let bucket_array_ptr = self.bucket_array.load(Ordering::Acquire, guard);

        // SAFETY: The pointer is set at construction and only ever swapped for
        // another non-null array. A swapped-out array stays alive until `guard`
        // is unpinned.
        unsafe { bucket_array_ptr.deref() }
    }
}

impl<K, V, S> AppendOnlyTable<K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher,
{
    #[inline]
    pub(crate) fn hash<Q>(&self, key: &Q) -> u64
    where
        Q: Hash + ?Sized,
    {
        bucket::hash(&self.build_hasher, key)
    }

    pub(crate) fn get_key_value_and<Q, F, T>(&self, key: &Q, hash: u64, with_entry: F) -> Option<T>
    where
        K: Borrow<Q>,
        Q: Eq + ?Sized,
        F: FnOnce(&K, &V) -> T,
    {
        let guard = &crossbeam_epoch::pin();

        self.current(guard)
            .get(guard, hash, key)
            .map(|Bucket { key, value, .. }| with_entry(key, value))
    }

    pub(crate) fn contains_key<Q>(&self, key: &Q, hash: u64) -> bool
    where
        K: Borrow<Q>,
        Q: Eq + ?Sized,
    {
        self.get_key_value_and(key, hash, |_, _| ()).is_some()
    }

    /// Inserts the entry unless the key is already present. The first insertion
    /// for a key wins; a later call drops its `key` and `value` and returns
    /// `AlreadyPresent`.
    pub(crate) fn insert_if_absent(&self, key: K, hash: u64, value: V) -> InsertionResult {
        // Fast path. Once a key is present it stays present, so a hit here needs
        // no lock.
        if self.contains_key(&key, hash) {
            return InsertionResult::AlreadyPresent;
        }

        let _write_lock = self.write_lock.lock();
        let guard = &crossbeam_epoch::pin();
        let mut bucket_array_ref = self.current(guard);

        // Another writer may have inserted the key between the check above and
        // acquiring the lock.
        if bucket_array_ref.get(guard, hash, &key).is_some() {
            return InsertionResult::AlreadyPresent;
        }

        let mut grown_to = None;

        if self.len.load(Ordering::Relaxed) >= bucket_array_ref.capacity() {
            let new_bucket_array_ptr = Owned::new(bucket_array_ref.grow(guard)).into_shared(guard);
            let old_bucket_array_ptr =
                self.bucket_array.swap(new_bucket_array_ptr, Ordering::AcqRel, guard);

            // SAFETY: The old array is unreachable for new readers. Its buckets
            // are owned by the new array, and dropping a `BucketArray` frees only
            // its pointer slice.
            unsafe { guard.defer_destroy(old_bucket_array_ptr) };

            bucket_array_ref = unsafe { new_bucket_array_ptr.deref() };
            grown_to = Some(bucket_array_ref.buckets.len());
        }

        let bucket_ptr = Owned::new(Bucket::new(hash, key, value)).into_shared(guard);
        bucket_array_ref.insert_vacant(guard, bucket_ptr);
        self.len.fetch_add(1, Ordering::Release);

        InsertionResult::Inserted { grown_to }
    }
}

impl<K, V, S> Drop for AppendOnlyTable<K, V, S> {
    fn drop(&mut self) {
        let guard = unsafe { crossbeam_epoch::unprotected() };
        atomic::fence(Ordering::Acquire);

        let bucket_array_ptr = self.bucket_array.load(Ordering::Relaxed, guard);

        // Every bucket is reachable from the current array. Superseded arrays were
        // already handed to the epoch collector and do not own their buckets.
        if let Some(bucket_array_ref) = unsafe { bucket_array_ptr.as_ref() } {
            for bucket_ptr in bucket_array_ref.iter(guard) {
                unsafe { drop(bucket_ptr.into_owned()) };
            }

            unsafe { drop(bucket_array_ptr.into_owned()) };
        }
    }
}
