//! Fixed-capacity byte ring buffer
//!
//! Storage is a `[u8; N]` owned by the buffer; nothing is allocated and
//! the capacity never changes.
//!
//! Both cursors run over `0..2N` instead of `0..N`. The fill level is
//! `write - read` modulo `2N`, so a full buffer (`N`) and an empty one
//! (`0`) are distinguished without sacrificing a slot.
//!
//! # Concurrency
//!
//! [`RingBuffer::split`] hands out exactly one [`Producer`] and one
//! [`Consumer`]. The producer is the only writer of the write cursor and
//! the consumer the only writer of the read cursor, so each cursor update
//! is a plain release store and no lock is needed, even when one half
//! lives in an interrupt handler.

use core::cell::UnsafeCell;
use core::ptr;

use portable_atomic::{AtomicUsize, Ordering};

/// Fixed-capacity single-producer single-consumer byte FIFO
pub struct RingBuffer<const N: usize> {
    storage: UnsafeCell<[u8; N]>,
    /// Write cursor, in `0..2N`
    write: AtomicUsize,
    /// Read cursor, in `0..2N`
    read: AtomicUsize,
}

// SAFETY: shared access only goes through `Producer`/`Consumer`, and
// `split` guarantees at most one of each exists. The producer only touches
// slots outside `read..write`, the consumer only slots inside it, and the
// cursor stores publish those slots with release/acquire ordering.
#[allow(unsafe_code)]
unsafe impl<const N: usize> Sync for RingBuffer<N> {}

impl<const N: usize> Default for RingBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> RingBuffer<N> {
    /// Create an empty buffer
    ///
    /// Usable in `static` and `StaticCell` initialisers.
    pub const fn new() -> Self {
        assert!(N > 0 && N <= usize::MAX / 2, "ring capacity out of range");
        Self {
            storage: UnsafeCell::new([0; N]),
            write: AtomicUsize::new(0),
            read: AtomicUsize::new(0),
        }
    }

    /// Total capacity in bytes
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Bytes available to read
    pub fn len(&self) -> usize {
        fill(self.write.load(Ordering::Acquire), self.read.load(Ordering::Acquire), N)
    }

    /// Bytes that can be written before the buffer is full
    pub fn space_remaining(&self) -> usize {
        N - self.len()
    }

    /// Check if there is nothing to read
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Check if no more bytes can be written
    pub fn is_full(&self) -> bool {
        self.len() == N
    }

    /// Copy as many leading bytes of `data` as fit
    ///
    /// Returns the number of bytes written; `0` when full.
    pub fn put(&mut self, data: &[u8]) -> usize {
        self.produce(data)
    }

    /// Copy up to `out.len()` bytes out, oldest first
    ///
    /// Returns the number of bytes read; `0` when empty.
    pub fn get(&mut self, out: &mut [u8]) -> usize {
        let n = self.peek_front(out);
        self.consume_front(n)
    }

    /// Split into the two role handles
    ///
    /// The exclusive borrow keeps the buffer from being split twice while
    /// the handles are alive.
    pub fn split(&mut self) -> (Producer<'_, N>, Consumer<'_, N>) {
        let ring: &Self = self;
        (Producer { ring }, Consumer { ring })
    }

    fn slots(&self) -> *mut u8 {
        self.storage.get().cast::<u8>()
    }

    /// Producer-side write. Only called through `&mut self` or `Producer`.
    #[allow(unsafe_code)]
    fn produce(&self, data: &[u8]) -> usize {
        let write = self.write.load(Ordering::Relaxed);
        let read = self.read.load(Ordering::Acquire);
        let n = data.len().min(N - fill(write, read, N));
        if n == 0 {
            return 0;
        }

        let start = write % N;
        let first = n.min(N - start);
        // SAFETY: `start..start + first` and `0..n - first` lie inside the
        // storage and outside the readable region, which only this side
        // may touch until the cursor store below publishes them.
        unsafe {
            ptr::copy_nonoverlapping(data.as_ptr(), self.slots().add(start), first);
            ptr::copy_nonoverlapping(data.as_ptr().add(first), self.slots(), n - first);
        }

        self.write.store(advance(write, n, N), Ordering::Release);
        n
    }

    /// Consumer-side copy without moving the read cursor
    #[allow(unsafe_code)]
    fn peek_front(&self, out: &mut [u8]) -> usize {
        let read = self.read.load(Ordering::Relaxed);
        let write = self.write.load(Ordering::Acquire);
        let n = out.len().min(fill(write, read, N));
        if n == 0 {
            return 0;
        }

        let start = read % N;
        let first = n.min(N - start);
        // SAFETY: the slots were published by the producer's release store
        // and stay untouched until this side advances the read cursor.
        unsafe {
            ptr::copy_nonoverlapping(self.slots().add(start), out.as_mut_ptr(), first);
            ptr::copy_nonoverlapping(self.slots(), out.as_mut_ptr().add(first), n - first);
        }
        n
    }

    /// Consumer-side release of up to `count` bytes
    fn consume_front(&self, count: usize) -> usize {
        let read = self.read.load(Ordering::Relaxed);
        let write = self.write.load(Ordering::Acquire);
        let n = count.min(fill(write, read, N));
        self.read.store(advance(read, n, N), Ordering::Release);
        n
    }

    /// Consumer-side discard of everything currently readable
    fn discard_all(&self) -> usize {
        let read = self.read.load(Ordering::Relaxed);
        let write = self.write.load(Ordering::Acquire);
        self.read.store(write, Ordering::Release);
        fill(write, read, N)
    }
}

/// Fill level for cursors in `0..2n`
#[inline]
fn fill(write: usize, read: usize, n: usize) -> usize {
    if write >= read {
        write - read
    } else {
        write + 2 * n - read
    }
}

/// Move a cursor forward, wrapping at `2n`
#[inline]
fn advance(cursor: usize, by: usize, n: usize) -> usize {
    let next = cursor + by;
    if next >= 2 * n {
        next - 2 * n
    } else {
        next
    }
}

/// Write half of a split [`RingBuffer`]
pub struct Producer<'a, const N: usize> {
    ring: &'a RingBuffer<N>,
}

impl<const N: usize> Producer<'_, N> {
    /// Copy as many leading bytes of `data` as fit; see [`RingBuffer::put`]
    pub fn put(&mut self, data: &[u8]) -> usize {
        self.ring.produce(data)
    }

    /// Bytes queued and not yet consumed
    pub fn len(&self) -> usize {
        self.ring.len()
    }

    /// Check if the consumer has drained everything
    pub fn is_empty(&self) -> bool {
        self.ring.is_empty()
    }

    /// Bytes that can be written right now
    pub fn space_remaining(&self) -> usize {
        self.ring.space_remaining()
    }

    /// Total capacity in bytes
    pub fn capacity(&self) -> usize {
        N
    }
}

/// Read half of a split [`RingBuffer`]
pub struct Consumer<'a, const N: usize> {
    ring: &'a RingBuffer<N>,
}

impl<const N: usize> Consumer<'_, N> {
    /// Copy up to `out.len()` bytes out; see [`RingBuffer::get`]
    pub fn get(&mut self, out: &mut [u8]) -> usize {
        let n = self.ring.peek_front(out);
        self.ring.consume_front(n)
    }

    /// Copy up to `out.len()` bytes out without consuming them
    pub fn peek(&self, out: &mut [u8]) -> usize {
        self.ring.peek_front(out)
    }

    /// Drop up to `count` bytes from the front, returning how many were dropped
    pub fn consume(&mut self, count: usize) -> usize {
        self.ring.consume_front(count)
    }

    /// Drop everything currently readable, returning how many bytes went
    pub fn clear(&mut self) -> usize {
        self.ring.discard_all()
    }

    /// Bytes available to read
    pub fn len(&self) -> usize {
        self.ring.len()
    }

    /// Check if there is nothing to read
    pub fn is_empty(&self) -> bool {
        self.ring.is_empty()
    }

    /// Free space as seen from the read side
    pub fn space_remaining(&self) -> usize {
        self.ring.space_remaining()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::vec::Vec;

    #[test]
    fn test_put_get_scenario() {
        let mut ring = RingBuffer::<16>::new();
        assert_eq!(ring.put(b"ATI\r"), 4);
        assert_eq!(ring.len(), 4);
        assert_eq!(ring.space_remaining(), 12);

        let mut out = [0u8; 16];
        let n = ring.get(&mut out);
        assert_eq!(&out[..n], b"ATI\r");
        assert_eq!(ring.len(), 0);
        assert!(ring.is_empty());
    }

    #[test]
    fn test_full_uses_every_slot() {
        let mut ring = RingBuffer::<8>::new();
        assert_eq!(ring.put(b"12345678"), 8);
        assert!(ring.is_full());
        assert_eq!(ring.len(), 8);
        assert_eq!(ring.space_remaining(), 0);
    }

    #[test]
    fn test_full_rejects_until_get() {
        let mut ring = RingBuffer::<4>::new();
        assert_eq!(ring.put(b"abcdef"), 4);
        assert_eq!(ring.put(b"x"), 0);
        assert_eq!(ring.put(b"xyz"), 0);

        let mut out = [0u8; 1];
        assert_eq!(ring.get(&mut out), 1);
        assert_eq!(&out, b"a");
        assert_eq!(ring.put(b"xyz"), 1);

        let mut out = [0u8; 8];
        let n = ring.get(&mut out);
        assert_eq!(&out[..n], b"bcdx");
    }

    #[test]
    fn test_get_empty_returns_zero() {
        let mut ring = RingBuffer::<4>::new();
        let mut out = [0u8; 4];
        assert_eq!(ring.get(&mut out), 0);
    }

    #[test]
    fn test_wraparound() {
        let mut ring = RingBuffer::<5>::new();
        let mut out = [0u8; 5];

        // Walk the cursors around the 2N boundary a few times
        for round in 0..20u8 {
            let data = [round, round.wrapping_add(1), round.wrapping_add(2)];
            assert_eq!(ring.put(&data), 3);
            assert_eq!(ring.get(&mut out[..3]), 3);
            assert_eq!(&out[..3], &data);
            assert!(ring.is_empty());
        }
    }

    #[test]
    fn test_split_roles() {
        let mut ring = RingBuffer::<8>::new();
        let (mut tx, mut rx) = ring.split();

        assert_eq!(tx.put(b"OK\r\n"), 4);
        assert_eq!(rx.len(), 4);

        let mut out = [0u8; 2];
        assert_eq!(rx.peek(&mut out), 2);
        assert_eq!(&out, b"OK");
        assert_eq!(rx.len(), 4);

        assert_eq!(rx.consume(3), 3);
        assert_eq!(rx.len(), 1);
        assert_eq!(tx.space_remaining(), 7);

        assert_eq!(rx.clear(), 1);
        assert!(tx.is_empty());
    }

    #[test]
    fn test_consume_clamps_to_len() {
        let mut ring = RingBuffer::<8>::new();
        let (mut tx, mut rx) = ring.split();
        tx.put(b"ab");
        assert_eq!(rx.consume(10), 2);
        assert!(rx.is_empty());
    }

    #[test]
    fn test_spsc_threads() {
        const TOTAL: usize = 10_000;
        let mut ring = RingBuffer::<32>::new();
        let (mut tx, mut rx) = ring.split();

        let received = std::thread::scope(|s| {
            s.spawn(move || {
                let mut next = 0usize;
                while next < TOTAL {
                    let chunk = [(next % 251) as u8];
                    next += tx.put(&chunk);
                }
            });

            let mut received = Vec::with_capacity(TOTAL);
            let mut buf = [0u8; 7];
            while received.len() < TOTAL {
                let n = rx.get(&mut buf);
                received.extend_from_slice(&buf[..n]);
            }
            received
        });

        for (i, b) in received.iter().enumerate() {
            assert_eq!(*b, (i % 251) as u8);
        }
    }

    proptest! {
        #[test]
        fn prop_fifo_law(chunks in proptest::collection::vec(
            proptest::collection::vec(any::<u8>(), 0..8), 0..8)
        ) {
            let mut ring = RingBuffer::<64>::new();
            let mut expected = Vec::new();
            for chunk in &chunks {
                prop_assert_eq!(ring.put(chunk), chunk.len());
                expected.extend_from_slice(chunk);
            }

            let mut out = [0u8; 64];
            let n = ring.get(&mut out);
            prop_assert_eq!(&out[..n], expected.as_slice());
        }

        #[test]
        fn prop_round_trip_after_offset(
            offset in 0usize..32,
            data in proptest::collection::vec(any::<u8>(), 0..=32),
        ) {
            let mut ring = RingBuffer::<32>::new();
            // Shift the cursors so the copy may wrap
            let filler = [0u8; 32];
            ring.put(&filler[..offset]);
            let mut sink = [0u8; 32];
            ring.get(&mut sink[..offset]);

            prop_assert_eq!(ring.put(&data), data.len());
            let mut out = [0u8; 32];
            let n = ring.get(&mut out);
            prop_assert_eq!(&out[..n], data.as_slice());
        }

        #[test]
        fn prop_len_bounded(ops in proptest::collection::vec((any::<bool>(), 0usize..12), 0..64)) {
            let mut ring = RingBuffer::<10>::new();
            let data = [0xAAu8; 12];
            let mut out = [0u8; 12];
            let mut model = 0usize;
            for (is_put, size) in ops {
                if is_put {
                    let n = ring.put(&data[..size]);
                    prop_assert_eq!(n, size.min(10 - model));
                    model += n;
                } else {
                    let n = ring.get(&mut out[..size]);
                    prop_assert_eq!(n, size.min(model));
                    model -= n;
                }
                prop_assert!(ring.len() <= ring.capacity());
                prop_assert_eq!(ring.len(), model);
            }
        }
    }
}
