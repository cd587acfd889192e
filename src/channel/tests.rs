use super::*;
use static_assertions::assert_impl_all;
use std::collections::HashMap;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

assert_impl_all!(Handoff<i32>: Send, Sync);
assert_impl_all!(PutError<i32>: Send, Sync);
assert_impl_all!(TakeError: Send, Sync);

#[test]
fn test_zero_capacity_is_rejected() {
    assert_eq!(
        Handoff::<i32>::with_capacity(0).err(),
        Some(ConfigError::ZeroCapacity)
    );
}

#[test]
fn test_fifo_order_single_producer_consumer() {
    let chan = Arc::new(Handoff::with_capacity(4).unwrap());

    let producer = {
        let chan = Arc::clone(&chan);
        thread::spawn(move || {
            for i in 0..100 {
                chan.put(i).unwrap();
            }
        })
    };

    for expected in 0..100 {
        assert_eq!(chan.take().unwrap(), expected);
    }

    producer.join().unwrap();
    assert!(chan.is_empty());
}

#[test]
fn test_capacity_one_strict_alternation() {
    let chan = Handoff::new();
    assert_eq!(chan.capacity(), 1);

    chan.put(1).unwrap();
    // A second put cannot complete until the first item is taken.
    let rejected = chan.try_put(2).unwrap_err();
    assert!(rejected.is_full());
    assert_eq!(rejected.into_inner(), 2);
    assert_eq!(chan.len(), 1);

    assert_eq!(chan.take().unwrap(), 1);
    chan.put(2).unwrap();
    assert_eq!(chan.take().unwrap(), 2);
}

#[test]
fn test_mpmc_no_item_lost_or_duplicated() {
    const PRODUCERS: u64 = 4;
    const CONSUMERS: usize = 3;
    const PER_PRODUCER: u64 = 200;

    let chan = Arc::new(Handoff::with_capacity(2).unwrap());

    let producers = (0..PRODUCERS)
        .map(|p| {
            let chan = Arc::clone(&chan);
            thread::spawn(move || {
                for i in 0..PER_PRODUCER {
                    // Encode the producer in the value so per-producer FIFO
                    // order can be checked on the other side.
                    chan.put((p, i)).unwrap();
                }
            })
        })
        .collect::<Vec<_>>();

    let consumers = (0..CONSUMERS)
        .map(|_| {
            let chan = Arc::clone(&chan);
            thread::spawn(move || {
                let mut seen = Vec::new();
                while let Ok(item) = chan.take() {
                    seen.push(item);
                }
                seen
            })
        })
        .collect::<Vec<_>>();

    for p in producers {
        p.join().unwrap();
    }
    chan.close();

    let mut all = Vec::new();
    for c in consumers {
        let seen = c.join().unwrap();

        // Each consumer must observe any single producer's items in order.
        let mut last: HashMap<u64, u64> = HashMap::new();
        for &(p, i) in &seen {
            if let Some(prev) = last.insert(p, i) {
                assert!(i > prev, "producer {} items out of order", p);
            }
        }
        all.extend(seen);
    }

    assert_eq!(all.len(), (PRODUCERS * PER_PRODUCER) as usize);
    all.sort_unstable();
    all.dedup();
    assert_eq!(all.len(), (PRODUCERS * PER_PRODUCER) as usize);
}

#[test]
fn test_take_timeout_leaves_channel_usable() {
    let chan: Handoff<&str> = Handoff::new();

    let err = chan.take_timeout(Duration::from_millis(100)).unwrap_err();
    assert!(err.is_timeout());

    // Not corrupted: a normal handoff still works.
    chan.put("a").unwrap();
    assert_eq!(chan.take().unwrap(), "a");
}

#[test]
fn test_put_timeout_returns_item() {
    let chan = Handoff::new();
    chan.put(1).unwrap();

    let err = chan
        .put_timeout(2, Duration::from_millis(50))
        .unwrap_err();
    assert!(err.is_timeout());
    assert_eq!(err.into_inner(), 2);

    // The blocked put inserted nothing.
    assert_eq!(chan.len(), 1);
    assert_eq!(chan.take().unwrap(), 1);
}

#[test]
fn test_close_wakes_blocked_taker() {
    let chan: Arc<Handoff<i32>> = Arc::new(Handoff::new());

    let taker = {
        let chan = Arc::clone(&chan);
        thread::spawn(move || chan.take())
    };

    // Give the taker time to block on the empty buffer.
    thread::sleep(Duration::from_millis(50));
    chan.close();

    assert_eq!(taker.join().unwrap(), Err(TakeError::Closed));
    assert!(chan.is_closed());
}

#[test]
fn test_close_wakes_blocked_putter_and_keeps_buffer() {
    let chan = Arc::new(Handoff::new());
    chan.put(7).unwrap();

    let putter = {
        let chan = Arc::clone(&chan);
        thread::spawn(move || chan.put(8))
    };

    thread::sleep(Duration::from_millis(50));
    chan.close();

    let err = putter.join().unwrap().unwrap_err();
    assert!(err.is_closed());
    assert_eq!(err.into_inner(), 8);

    // Buffer state untouched by the cancelled put; drains normally.
    assert_eq!(chan.len(), 1);
    assert_eq!(chan.take().unwrap(), 7);
    assert_eq!(chan.take().unwrap_err(), TakeError::Closed);
}

#[test]
fn test_put_on_closed_channel_hands_item_back() {
    let chan = Handoff::new();
    chan.close();

    let err = chan.put("payload").unwrap_err();
    assert!(err.is_closed());
    assert_eq!(err.into_inner(), "payload");
}

#[test]
fn test_try_take_empty_vs_closed() {
    let chan: Handoff<i32> = Handoff::new();
    assert_eq!(chan.try_take().unwrap_err(), TakeError::Empty);

    chan.close();
    assert_eq!(chan.try_take().unwrap_err(), TakeError::Closed);
}

#[test]
fn test_done_sentinel_convention() {
    // The termination convention layered on top of the channel: `None` is
    // the DONE marker, the channel itself has no idea.
    let chan: Arc<Handoff<Option<u32>>> = Arc::new(Handoff::new());

    let consumer = {
        let chan = Arc::clone(&chan);
        thread::spawn(move || {
            let mut total = 0;
            while let Ok(Some(n)) = chan.take() {
                total += n;
            }
            total
        })
    };

    for n in 1..=10 {
        chan.put(Some(n)).unwrap();
    }
    chan.put(None).unwrap();

    assert_eq!(consumer.join().unwrap(), 55);
}
