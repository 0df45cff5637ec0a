//! SPSC Queue - bounded lock-free ring buffer for one producer and one consumer.
//!
//! The ring holds `N` slots (a power of two) and two cursors wrapped with the
//! bitmask `N - 1`. One slot is always left empty to tell "full" from "empty",
//! so at most `N - 1` values are in flight.
//!
//! # Ordering
//!
//! ```text
//! Producer writes slot, then Release-stores tail  ->  consumer Acquire-loads tail, then reads slot
//! Consumer reads slot, then Release-stores head   ->  producer Acquire-loads head, then writes slot
//! ```
//!
//! Each cursor has exactly one writer, so no CAS is needed and each side may
//! read its own cursor with `Relaxed`.
//!
//! # Single producer, single consumer
//!
//! [`SpscQueue::split`] hands out one [`Producer`] and one [`Consumer`]. Pushing
//! and popping need `&mut` access to the respective handle, so the borrow
//! checker rules out a second concurrent producer or consumer.

use arrayvec::ArrayVec;
use crossbeam_utils::CachePadded;
use std::cell::UnsafeCell;
use std::fmt;
use std::mem::MaybeUninit;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::debug;

// ============================================================================
// Errors
// ============================================================================

/// Push rejected because the queue is full. Carries the value back.
#[derive(Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PushError<T> {
    #[error("queue is full")]
    Full(T),
}

impl<T> PushError<T> {
    /// Recover the value that could not be pushed
    #[inline]
    pub fn into_inner(self) -> T {
        match self {
            PushError::Full(value) => value,
        }
    }
}

impl<T> fmt::Debug for PushError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Full(..)")
    }
}

/// Pop found nothing to read
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum PopError {
    #[error("queue is empty")]
    Empty,
}

// ============================================================================
// Shared ring
// ============================================================================

/// Bounded ring buffer shared by one producer and one consumer.
///
/// Elements are `Copy`: they are copied in by `try_push` and copied out by
/// `try_pop`, and nothing left in the ring needs dropping.
pub struct SpscQueue<T: Copy, const N: usize> {
    /// Slot storage. Written by the producer only in `[tail, head)` and read
    /// by the consumer only in `[head, tail)`, so accesses never overlap.
    buffer: Box<[UnsafeCell<MaybeUninit<T>>]>,

    /// Next slot to consume. Written by the consumer only.
    head: CachePadded<AtomicUsize>,

    /// Next slot to produce. Written by the producer only.
    tail: CachePadded<AtomicUsize>,
}

// SAFETY: slot accesses are partitioned by the head/tail protocol and the
// push/pop paths are reachable only through the unique Producer/Consumer.
unsafe impl<T: Copy + Send, const N: usize> Sync for SpscQueue<T, N> {}

impl<T: Copy, const N: usize> SpscQueue<T, N> {
    /// Bitmask for power-of-two modulo: `i & MASK == i % N`.
    const MASK: usize = {
        assert!(N >= 2, "Capacity must be at least 2");
        assert!(N.is_power_of_two(), "Capacity must be a power of 2");
        N - 1
    };

    /// Create an empty queue with all `N` slots allocated up front.
    pub fn new() -> Self {
        let _ = Self::MASK;

        let buffer = (0..N)
            .map(|_| UnsafeCell::new(MaybeUninit::uninit()))
            .collect();

        debug!(
            capacity = N,
            slot_size = std::mem::size_of::<T>(),
            "spsc queue created"
        );

        Self {
            buffer,
            head: CachePadded::new(AtomicUsize::new(0)),
            tail: CachePadded::new(AtomicUsize::new(0)),
        }
    }

    /// Split into the producer and consumer ends.
    ///
    /// Both handles borrow the queue, so it cannot be split again until
    /// they are dropped.
    pub fn split(&mut self) -> (Producer<'_, T, N>, Consumer<'_, T, N>) {
        let queue: &Self = self;
        (Producer { queue }, Consumer { queue })
    }

    /// Declared capacity, including the reserved empty-marker slot
    #[inline]
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Maximum number of values in flight (`N - 1`)
    #[inline]
    pub const fn usable_capacity(&self) -> usize {
        N - 1
    }

    /// Number of queued values.
    ///
    /// A snapshot only: either side may move before the caller looks at it.
    #[inline]
    pub fn len(&self) -> usize {
        let head = self.head.load(Ordering::Acquire);
        let tail = self.tail.load(Ordering::Acquire);
        tail.wrapping_sub(head) & Self::MASK
    }

    /// Snapshot emptiness check
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot fullness check
    #[inline]
    pub fn is_full(&self) -> bool {
        self.len() == N - 1
    }

    /// Producer side. Only reachable through `Producer`.
    #[inline]
    fn push(&self, value: T) -> Result<(), PushError<T>> {
        let tail = self.tail.load(Ordering::Relaxed);
        let head = self.head.load(Ordering::Acquire);

        let next = (tail + 1) & Self::MASK;
        if next == head {
            return Err(PushError::Full(value));
        }

        // SAFETY: `tail` is outside `[head, tail)`, so the consumer is not
        // reading it, and it stays invisible until the Release store below.
        unsafe {
            self.buffer[tail].get().write(MaybeUninit::new(value));
        }

        self.tail.store(next, Ordering::Release);
        Ok(())
    }

    /// Consumer side. Only reachable through `Consumer`.
    #[inline]
    fn pop(&self) -> Result<T, PopError> {
        let tail = self.tail.load(Ordering::Acquire);
        let head = self.head.load(Ordering::Relaxed);

        if head == tail {
            return Err(PopError::Empty);
        }

        // SAFETY: `head` is inside `[head, tail)`; the Acquire load of `tail`
        // makes the producer's write to this slot visible.
        let value = unsafe { (*self.buffer[head].get()).assume_init_read() };

        self.head.store((head + 1) & Self::MASK, Ordering::Release);
        Ok(value)
    }

    /// Consumer side, batched: one Acquire of `tail`, one Release of `head`.
    #[inline]
    fn pop_into<const B: usize>(&self, out: &mut ArrayVec<T, B>) -> usize {
        let tail = self.tail.load(Ordering::Acquire);
        let start = self.head.load(Ordering::Relaxed);

        let mut head = start;
        while head != tail && !out.is_full() {
            // SAFETY: as in `pop`, every slot in `[start, tail)` is published.
            let value = unsafe { (*self.buffer[head].get()).assume_init_read() };
            out.push(value);
            head = (head + 1) & Self::MASK;
        }

        let taken = head.wrapping_sub(start) & Self::MASK;
        if taken > 0 {
            self.head.store(head, Ordering::Release);
        }
        taken
    }
}

impl<T: Copy, const N: usize> Default for SpscQueue<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Copy, const N: usize> fmt::Debug for SpscQueue<T, N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpscQueue")
            .field("capacity", &N)
            .field("head", &self.head.load(Ordering::Relaxed))
            .field("tail", &self.tail.load(Ordering::Relaxed))
            .finish()
    }
}

// ============================================================================
// Producer
// ============================================================================

/// The writing end of an [`SpscQueue`]
pub struct Producer<'a, T: Copy, const N: usize> {
    queue: &'a SpscQueue<T, N>,
}

impl<T: Copy, const N: usize> Producer<'_, T, N> {
    /// Attempt to enqueue `value`.
    ///
    /// Returns `PushError::Full` with the value when the ring is full. Never
    /// blocks; retry policy belongs to the caller.
    ///
    /// # Complexity
    /// O(1), wait-free
    #[inline]
    pub fn try_push(&mut self, value: T) -> Result<(), PushError<T>> {
        self.queue.push(value)
    }

    #[inline]
    pub const fn capacity(&self) -> usize {
        N
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.queue.is_full()
    }
}

impl<T: Copy, const N: usize> fmt::Debug for Producer<'_, T, N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Producer").field("queue", self.queue).finish()
    }
}

// ============================================================================
// Consumer
// ============================================================================

/// The reading end of an [`SpscQueue`]
pub struct Consumer<'a, T: Copy, const N: usize> {
    queue: &'a SpscQueue<T, N>,
}

impl<T: Copy, const N: usize> Consumer<'_, T, N> {
    /// Attempt to dequeue the oldest value.
    ///
    /// Returns `PopError::Empty` when nothing is queued. Never blocks.
    ///
    /// # Complexity
    /// O(1), wait-free
    #[inline]
    pub fn try_pop(&mut self) -> Result<T, PopError> {
        self.queue.pop()
    }

    /// Move as many queued values as fit into `out`, in FIFO order.
    ///
    /// Returns the number of values moved (zero if the queue is empty or
    /// `out` is already full).
    #[inline]
    pub fn pop_batch<const B: usize>(&mut self, out: &mut ArrayVec<T, B>) -> usize {
        self.queue.pop_into(out)
    }

    #[inline]
    pub const fn capacity(&self) -> usize {
        N
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

impl<T: Copy, const N: usize> fmt::Debug for Consumer<'_, T, N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Consumer").field("queue", self.queue).finish()
    }
}
