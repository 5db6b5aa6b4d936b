//! Lock-free byte intake ring.
//!
//! SPSC (single producer, single consumer). The transport receive path
//! (UART ISR, BLE callback, reader thread) is the only caller of
//! [`ByteQueue::push`]; the terminal polling loop is the only caller of
//! [`ByteQueue::pop`].
//!
//! # Index discipline
//!
//! - `tail` is written only by the producer, after the slot is stored
//! - `head` is written only by the consumer, after the slot is loaded
//! - Both run over `0..2N` so a full ring is distinguishable from an empty
//!   one for any capacity, not just powers of two
//!
//! Overflow policy: the incoming byte is dropped and counted, the producer
//! never blocks and queued bytes are never overwritten.

use core::sync::atomic::{AtomicU32, AtomicU8, AtomicUsize, Ordering};

use crate::config::INTAKE_CAPACITY;

/// Bounded FIFO of raw input bytes.
pub struct ByteQueue<const N: usize = INTAKE_CAPACITY> {
    slots: [AtomicU8; N],
    /// Next slot to read (consumer-owned).
    head: AtomicUsize,
    /// Next slot to write (producer-owned).
    tail: AtomicUsize,
    /// Bytes rejected because the ring was full.
    dropped: AtomicU32,
}

impl<const N: usize> ByteQueue<N> {
    const WRAP: usize = 2 * N;

    /// Create an empty queue.
    pub const fn new() -> Self {
        const { assert!(N > 0, "Intake capacity must be non-zero") };

        Self {
            slots: [const { AtomicU8::new(0) }; N],
            head: AtomicUsize::new(0),
            tail: AtomicUsize::new(0),
            dropped: AtomicU32::new(0),
        }
    }

    #[inline]
    fn distance(head: usize, tail: usize) -> usize {
        (tail + Self::WRAP - head) % Self::WRAP
    }

    #[inline]
    fn advance(idx: usize) -> usize {
        (idx + 1) % Self::WRAP
    }

    /// Append a byte (producer side).
    ///
    /// Returns `false` and counts a drop when the ring is full.
    #[inline]
    pub fn push(&self, byte: u8) -> bool {
        let tail = self.tail.load(Ordering::Relaxed);
        let head = self.head.load(Ordering::Acquire);

        if Self::distance(head, tail) >= N {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            return false;
        }

        self.slots[tail % N].store(byte, Ordering::Relaxed);
        self.tail.store(Self::advance(tail), Ordering::Release);
        true
    }

    /// Append as many bytes as fit; the rest are dropped and counted.
    ///
    /// Returns the number of bytes queued.
    pub fn push_slice(&self, bytes: &[u8]) -> usize {
        bytes.iter().filter(|&&b| self.push(b)).count()
    }

    /// Remove the oldest byte (consumer side).
    #[inline]
    pub fn pop(&self) -> Option<u8> {
        let head = self.head.load(Ordering::Relaxed);
        let tail = self.tail.load(Ordering::Acquire);

        if head == tail {
            return None;
        }

        let byte = self.slots[head % N].load(Ordering::Relaxed);
        self.head.store(Self::advance(head), Ordering::Release);
        Some(byte)
    }

    /// Number of queued bytes.
    #[inline]
    pub fn count(&self) -> usize {
        let head = self.head.load(Ordering::Acquire);
        let tail = self.tail.load(Ordering::Acquire);
        Self::distance(head, tail)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.count() >= N
    }

    /// Fixed capacity.
    #[inline]
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Bytes dropped since the last [`take_dropped`](Self::take_dropped).
    #[inline]
    pub fn dropped(&self) -> u32 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Read and reset the drop counter.
    #[inline]
    pub fn take_dropped(&self) -> u32 {
        self.dropped.swap(0, Ordering::Relaxed)
    }

    /// Discard everything queued (consumer side).
    pub fn clear(&self) {
        let tail = self.tail.load(Ordering::Acquire);
        self.head.store(tail, Ordering::Release);
    }
}

impl<const N: usize> Default for ByteQueue<N> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_capacity() {
        let q: ByteQueue = ByteQueue::new();
        assert_eq!(q.capacity(), 120);
        assert!(q.is_empty());
    }

    #[test]
    fn test_wraps_with_non_power_of_two_capacity() {
        let q = ByteQueue::<3>::new();

        for round in 0..10u8 {
            assert!(q.push(round));
            assert!(q.push(round + 100));
            assert_eq!(q.pop(), Some(round));
            assert_eq!(q.pop(), Some(round + 100));
        }
        assert!(q.is_empty());
        assert_eq!(q.dropped(), 0);
    }

    #[test]
    fn test_full_detection() {
        let q = ByteQueue::<3>::new();
        q.push(1);
        q.push(2);
        q.push(3);
        assert!(q.is_full());
        assert_eq!(q.count(), 3);

        q.pop();
        assert!(!q.is_full());
        assert!(q.push(4));
        assert!(q.is_full());
    }

    #[test]
    fn test_take_dropped_resets() {
        let q = ByteQueue::<1>::new();
        assert!(q.push(b'a'));
        assert!(!q.push(b'b'));
        assert!(!q.push(b'c'));
        assert_eq!(q.take_dropped(), 2);
        assert_eq!(q.dropped(), 0);
    }

    #[test]
    fn test_clear() {
        let q = ByteQueue::<4>::new();
        q.push_slice(b"abc");
        q.clear();
        assert!(q.is_empty());
        assert_eq!(q.pop(), None);
    }
}
