//! Intake ring tests

use trip_terminal::config::INTAKE_CAPACITY;
use trip_terminal::intake::ByteQueue;

#[test]
fn test_holds_full_capacity() {
    let queue: ByteQueue = ByteQueue::new();
    assert_eq!(queue.capacity(), INTAKE_CAPACITY);

    for i in 0..INTAKE_CAPACITY {
        assert!(queue.push(i as u8), "push {} should fit", i);
    }
    assert!(queue.is_full());
    assert_eq!(queue.count(), INTAKE_CAPACITY);
}

#[test]
fn test_overflow_drops_incoming_byte() {
    let queue = ByteQueue::<4>::new();
    assert_eq!(queue.push_slice(b"abcd"), 4);

    assert!(!queue.push(b'e'));
    assert_eq!(queue.dropped(), 1);

    // Queued contents are untouched
    let drained: Vec<u8> = std::iter::from_fn(|| queue.pop()).collect();
    assert_eq!(drained, b"abcd");
}

#[test]
fn test_push_slice_counts_partial_fit() {
    let queue = ByteQueue::<4>::new();
    assert_eq!(queue.push_slice(b"0123456"), 4);
    assert_eq!(queue.take_dropped(), 3);
    assert_eq!(queue.dropped(), 0);
}

#[test]
fn test_fifo_across_wraparound() {
    let queue = ByteQueue::<5>::new();
    let mut expected = 0u8;
    let mut next = 0u8;

    for _ in 0..50 {
        while queue.push(next) {
            next = next.wrapping_add(1);
        }
        for _ in 0..3 {
            assert_eq!(queue.pop(), Some(expected));
            expected = expected.wrapping_add(1);
        }
    }
}

#[test]
fn test_spsc_threads_preserve_order() {
    const TOTAL: usize = 20_000;
    let queue = ByteQueue::<16>::new();

    std::thread::scope(|s| {
        s.spawn(|| {
            for i in 0..TOTAL {
                while !queue.push(i as u8) {
                    std::thread::yield_now();
                }
            }
        });

        let mut received = 0usize;
        while received < TOTAL {
            match queue.pop() {
                Some(byte) => {
                    assert_eq!(byte, received as u8, "byte {} out of order", received);
                    received += 1;
                }
                None => std::thread::yield_now(),
            }
        }
    });

    assert!(queue.is_empty());
}
