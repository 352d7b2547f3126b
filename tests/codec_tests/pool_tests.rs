//! Pool Tests
//!
//! Tests verify:
//! - Instances are reused across acquisitions
//! - The pool grows under contention instead of blocking
//! - Idle instances never exceed capacity
//! - Discarded and failed instances are not returned
//! - Concurrent codec use round-trips every value exactly

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;

use atlascache::codec::{ObjectCodec, Pool};
use atlascache::CodecConfig;
use serde::{Deserialize, Serialize};

// =============================================================================
// Basic Pool Tests
// =============================================================================

#[test]
fn test_pool_reuses_instances() {
    let pool: Pool<Vec<u8>> = Pool::new("buffers", 4);

    {
        let mut buf = pool.acquire(Vec::new);
        buf.extend_from_slice(b"hello");
    }
    assert_eq!(pool.idle(), 1);
    assert_eq!(pool.created(), 1);

    let buf = pool.acquire(Vec::new);
    assert_eq!(buf.as_slice(), b"hello");
    assert_eq!(pool.created(), 1);
}

#[test]
fn test_pool_grows_when_empty() {
    let pool: Pool<u32> = Pool::new("numbers", 2);

    let a = pool.acquire(|| 1);
    let b = pool.acquire(|| 2);
    let c = pool.acquire(|| 3);

    assert_eq!((*a, *b, *c), (1, 2, 3));
    assert_eq!(pool.created(), 3);
    assert_eq!(pool.idle(), 0);
}

#[test]
fn test_pool_drops_surplus_on_release() {
    let pool: Pool<u32> = Pool::new("numbers", 2);

    let guards: Vec<_> = (0..5).map(|i| pool.acquire(move || i)).collect();
    assert_eq!(pool.created(), 5);

    drop(guards);
    assert_eq!(pool.idle(), 2);
    assert_eq!(pool.capacity(), 2);
}

#[test]
fn test_pool_zero_capacity_raised_to_one() {
    let pool: Pool<u32> = Pool::new("tiny", 0);
    assert_eq!(pool.capacity(), 1);

    drop(pool.acquire(|| 9));
    assert_eq!(pool.idle(), 1);
}

#[test]
fn test_pool_prewarm() {
    let pool: Pool<u32> = Pool::new("warm", 3);
    let mut next = 0;
    pool.prewarm(10, || {
        next += 1;
        next
    });

    assert_eq!(pool.idle(), 3);
    assert_eq!(pool.created(), 3);

    // Prewarmed instances are used before building new ones
    let guard = pool.acquire(|| 100);
    assert_ne!(*guard, 100);
}

#[test]
fn test_pool_prewarm_full_pool_counts_nothing() {
    let pool: Pool<u32> = Pool::new("full", 2);
    drop(vec![pool.acquire(|| 1), pool.acquire(|| 2)]);
    assert_eq!(pool.idle(), 2);
    assert_eq!(pool.created(), 2);

    // Instances that could not be retained were dropped, not created
    pool.prewarm(2, || 99);
    assert_eq!(pool.idle(), 2);
    assert_eq!(pool.created(), 2);
}

#[test]
fn test_pool_discard() {
    let pool: Pool<u32> = Pool::new("conns", 4);

    let guard = pool.acquire(|| 1);
    guard.discard();

    assert_eq!(pool.idle(), 0);

    let guard = pool.acquire(|| 2);
    assert_eq!(*guard, 2);
}

#[test]
fn test_pool_try_acquire_error() {
    let pool: Pool<u32> = Pool::new("conns", 4);

    let result = pool.try_acquire(|| Err::<u32, _>("refused"));
    assert_eq!(result.err(), Some("refused"));
    assert_eq!(pool.created(), 0);
    assert_eq!(pool.idle(), 0);

    let guard = pool.try_acquire(|| Ok::<_, &str>(5)).unwrap();
    assert_eq!(*guard, 5);
    assert_eq!(pool.created(), 1);
}

#[test]
fn test_pool_returns_instance_after_panic() {
    let pool: Pool<u32> = Pool::new("panicky", 2);

    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        let _guard = pool.acquire(|| 7);
        panic!("caller failed while holding the instance");
    }));

    assert!(result.is_err());
    assert_eq!(pool.idle(), 1);
}

// =============================================================================
// Concurrency Tests
// =============================================================================

#[test]
fn test_pool_concurrent_acquire_release() {
    let pool: Arc<Pool<Vec<u8>>> = Arc::new(Pool::new("shared", 4));
    let in_use = Arc::new(AtomicUsize::new(0));
    let num_threads = 8;
    let iterations = 500;

    let handles: Vec<_> = (0..num_threads)
        .map(|_| {
            let pool = Arc::clone(&pool);
            let in_use = Arc::clone(&in_use);
            thread::spawn(move || {
                for i in 0..iterations {
                    let mut buf = pool.acquire(Vec::new);
                    in_use.fetch_add(1, Ordering::SeqCst);
                    buf.clear();
                    buf.push(i as u8);
                    assert_eq!(buf.len(), 1);
                    in_use.fetch_sub(1, Ordering::SeqCst);
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(in_use.load(Ordering::SeqCst), 0);
    assert!(pool.idle() <= pool.capacity());
    assert!(pool.created() >= 1);
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Event {
    thread: usize,
    seq: usize,
    payload: String,
    tags: Vec<String>,
}

#[test]
fn test_codec_concurrent_round_trips() {
    let codec = Arc::new(ObjectCodec::new(CodecConfig {
        engine_pool_capacity: 4,
        engine_prewarm: 2,
        ..CodecConfig::default()
    }));
    let num_threads = 16;
    let iterations = 200;
    let barrier = Arc::new(Barrier::new(num_threads));

    let handles: Vec<_> = (0..num_threads)
        .map(|t| {
            let codec = Arc::clone(&codec);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                for seq in 0..iterations {
                    let event = Event {
                        thread: t,
                        seq,
                        payload: "x".repeat((t * 31 + seq) % 300),
                        tags: vec![format!("t{}", t); seq % 5],
                    };
                    let bytes = codec.encode(&event).unwrap();
                    let decoded: Event = codec.decode(&bytes).unwrap();
                    assert_eq!(decoded, event);
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    assert!(codec.idle_engines() <= 4);
    assert!(codec.engines_created() >= 2);
}

#[test]
fn test_codec_concurrent_mixed_types() {
    let codec = Arc::new(ObjectCodec::default());

    let handles: Vec<_> = (0..8)
        .map(|t| {
            let codec = Arc::clone(&codec);
            thread::spawn(move || {
                for i in 0..100u64 {
                    if t % 2 == 0 {
                        let mut map = HashMap::new();
                        map.insert(format!("k{}", i), i * t);
                        let bytes = codec.encode(&map).unwrap();
                        let decoded: HashMap<String, u64> = codec.decode(&bytes).unwrap();
                        assert_eq!(decoded, map);
                    } else {
                        let text = format!("thread-{}-{}", t, i);
                        let bytes = codec.encode(&text).unwrap();
                        let decoded: String = codec.decode(&bytes).unwrap();
                        assert_eq!(decoded, text);
                    }
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }
}
