use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Barrier,
    },
    thread,
};

use keyed_publish::{CacheBuilder, Error, PublishCache, PutOutcome};
use paste::paste;

const NUM_THREADS: usize = 16;
const NUM_KEYS_PER_THREAD: u64 = 1_000;

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

macro_rules! generate_concurrent_tests {
    ($name:ident, $cache_init:expr) => {
        paste! {
            #[test]
            fn [<test_ $name _same_key_race>]() -> anyhow::Result<()> {
                init_logger();
                let cache: PublishCache<u64, u64, _> = $cache_init;
                let barrier = Arc::new(Barrier::new(NUM_THREADS));
                let insert_counter = Arc::new(AtomicUsize::default());

                let threads: Vec<_> = (0..NUM_THREADS)
                    .map(|thread_id| {
                        let my_cache = cache.clone();
                        let my_barrier = Arc::clone(&barrier);
                        let my_insert_counter = Arc::clone(&insert_counter);
                        thread::spawn(move || -> Result<(), Error> {
                            my_barrier.wait();

                            let value = thread_id as u64 + 1;
                            if my_cache.put_with_outcome(42, value)? == PutOutcome::Inserted {
                                println!("Thread {} published the value.", thread_id);
                                my_insert_counter.fetch_add(1, Ordering::AcqRel);
                            }

                            // Every caller sees the entry once its put returned,
                            // whether or not it was the winner.
                            assert!(my_cache.contains(&42));
                            my_cache.get(&42).map(|_| ())
                        })
                    })
                    .collect();

                for t in threads {
                    t.join().expect("Thread failed")?;
                }

                assert_eq!(insert_counter.load(Ordering::Acquire), 1);
                assert_eq!(cache.len(), 1);
                let value = cache.get(&42)?;
                assert!((1..=NUM_THREADS as u64).contains(&value));

                Ok(())
            }

            #[test]
            fn [<test_ $name _distinct_keys>]() -> anyhow::Result<()> {
                init_logger();
                let cache: PublishCache<u64, u64, _> = $cache_init;
                let barrier = Arc::new(Barrier::new(NUM_THREADS));

                let threads: Vec<_> = (0..NUM_THREADS as u64)
                    .map(|thread_id| {
                        let my_cache = cache.clone();
                        let my_barrier = Arc::clone(&barrier);
                        let start = thread_id * NUM_KEYS_PER_THREAD + 1;
                        let end = start + NUM_KEYS_PER_THREAD;
                        thread::spawn(move || -> Result<(), Error> {
                            my_barrier.wait();

                            for key in start..end {
                                my_cache.put(key, key * 2)?;
                                // Read your own write, while other threads keep
                                // growing the table.
                                assert_eq!(my_cache.get(&key)?, key * 2);
                            }
                            Ok(())
                        })
                    })
                    .collect();

                for t in threads {
                    t.join().expect("Thread failed")?;
                }

                let num_keys = NUM_THREADS as u64 * NUM_KEYS_PER_THREAD;
                assert_eq!(cache.len() as u64, num_keys);
                for key in 1..=num_keys {
                    assert!(cache.contains(&key));
                    assert_eq!(cache.get(&key)?, key * 2);
                }
                assert_eq!(cache.get(&(num_keys + 1)), Err(Error::NotFound));

                Ok(())
            }

            #[test]
            fn [<test_ $name _contains_then_get>]() -> anyhow::Result<()> {
                init_logger();
                let cache: PublishCache<u64, u64, _> = $cache_init;
                let num_keys = NUM_KEYS_PER_THREAD * 4;

                let pollers: Vec<_> = (0..NUM_THREADS - 1)
                    .map(|_| {
                        let my_cache = cache.clone();
                        thread::spawn(move || -> Result<(), Error> {
                            for key in 1..=num_keys {
                                while !my_cache.contains(&key) {
                                    thread::yield_now();
                                }
                                // No gap between `contains` and `get`.
                                assert_eq!(my_cache.get(&key)?, key + 7);
                                // Earlier entries survive any growth in between.
                                assert_eq!(my_cache.get(&(key / 2 + 1))?, key / 2 + 8);
                            }
                            Ok(())
                        })
                    })
                    .collect();

                let producer = {
                    let my_cache = cache.clone();
                    thread::spawn(move || -> Result<(), Error> {
                        for key in 1..=num_keys {
                            my_cache.put(key, key + 7)?;
                        }
                        Ok(())
                    })
                };

                producer.join().expect("Producer failed")?;
                for t in pollers {
                    t.join().expect("Poller failed")?;
                }

                assert_eq!(cache.len() as u64, num_keys);

                Ok(())
            }
        }
    };
}

generate_concurrent_tests!(std_hasher, CacheBuilder::new().name("std").build());
generate_concurrent_tests!(
    ahash,
    CacheBuilder::new()
        .name("ahash")
        .build_with_hasher(ahash::RandomState::default())
);
generate_concurrent_tests!(
    presized,
    CacheBuilder::new()
        .initial_capacity(NUM_THREADS * NUM_KEYS_PER_THREAD as usize)
        .record_stats()
        .build()
);
