//! Fixed Pool - O(1) slot allocator over a pre-allocated arena.
//!
//! The pool reserves all `N` slots at construction, eliminating heap
//! allocation in the hot path. Free slots are tracked as a stack of
//! indices, so allocate and release are a single push or pop.
//!
//! The pool has no internal synchronization. Mutating operations take
//! `&mut self`; sharing one across threads needs an external lock.

use std::fmt;
use tracing::debug;

/// Index of a slot in the backing storage
pub type SlotIndex = u32;

/// Exclusive claim on one pool slot.
///
/// Handles are the safe replacement for raw slot pointers: they carry the
/// slot index and are neither `Clone` nor `Copy`, so releasing one consumes it.
/// A handle must only be used with the pool that produced it.
#[derive(Debug, PartialEq, Eq, Hash)]
#[must_use = "a dropped handle leaks its slot until the pool is dropped"]
pub struct SlotHandle {
    index: SlotIndex,
}

impl SlotHandle {
    /// Slot identity within the owning pool
    #[inline]
    pub fn index(&self) -> SlotIndex {
        self.index
    }
}

/// Pre-allocated pool of `N` values of type `T`.
///
/// # Slot contents
///
/// Slots are initialized once at construction. `allocate` does not reset
/// them, so a reused slot still holds whatever the previous owner wrote.
/// Callers must initialize a slot before its first logical use.
pub struct FixedPool<T, const N: usize> {
    /// Contiguous block of pre-allocated slots
    slots: Box<[T]>,

    /// Stack of free indices; `free_list[..top]` are free
    free_list: Box<[SlotIndex]>,

    /// Number of free slots (stack pointer)
    top: usize,
}

impl<T, const N: usize> FixedPool<T, N> {
    const CAPACITY: usize = {
        assert!(N > 0, "Pool size must be greater than zero");
        assert!(N <= SlotIndex::MAX as usize, "Pool size must fit in a SlotIndex");
        N
    };

    /// Create a pool whose slots are produced by `init`.
    ///
    /// Useful for element types without a meaningful `Default`.
    pub fn with_init(mut init: impl FnMut() -> T) -> Self {
        let capacity = Self::CAPACITY;

        let slots: Box<[T]> = (0..capacity).map(|_| init()).collect();

        // Lowest index on top of the stack, so a fresh pool hands out 0, 1, 2, ...
        let free_list: Box<[SlotIndex]> = (0..capacity as SlotIndex).rev().collect();

        debug!(
            capacity,
            slot_size = std::mem::size_of::<T>(),
            "fixed pool created"
        );

        Self {
            slots,
            free_list,
            top: capacity,
        }
    }

    /// Allocate a slot.
    ///
    /// Returns `None` when every slot is in use. Exhaustion is an expected
    /// outcome under load and must be handled by the caller.
    ///
    /// # Complexity
    /// O(1) - pops the top of the free stack
    #[inline]
    #[must_use = "exhaustion must be checked"]
    pub fn allocate(&mut self) -> Option<SlotHandle> {
        if self.top == 0 {
            return None;
        }

        self.top -= 1;
        Some(SlotHandle {
            index: self.free_list[self.top],
        })
    }

    /// Return a slot to the pool. `None` is a no-op.
    ///
    /// Runs no destructor; the slot keeps its value until overwritten.
    ///
    /// # Misuse
    /// Handles from another pool are not detected in release builds.
    /// Debug builds assert that the index is in range and that the
    /// free stack is not already full (double release).
    ///
    /// # Complexity
    /// O(1) - pushes onto the free stack
    #[inline]
    pub fn deallocate(&mut self, handle: Option<SlotHandle>) {
        if let Some(handle) = handle {
            self.release(handle);
        }
    }

    /// Return a slot to the pool.
    #[inline]
    pub fn release(&mut self, handle: SlotHandle) {
        debug_assert!((handle.index as usize) < N, "Index out of bounds");
        debug_assert!(self.top < N, "Double free detected");

        self.free_list[self.top] = handle.index;
        self.top += 1;
    }

    /// Shared access to an allocated slot.
    ///
    /// # Complexity
    /// O(1) - direct array access
    #[inline]
    pub fn get(&self, handle: &SlotHandle) -> &T {
        &self.slots[handle.index as usize]
    }

    /// Mutable access to an allocated slot.
    #[inline]
    pub fn get_mut(&mut self, handle: &SlotHandle) -> &mut T {
        &mut self.slots[handle.index as usize]
    }

    /// Number of free slots
    #[inline]
    pub fn available(&self) -> usize {
        self.top
    }

    /// Number of slots currently handed out
    #[inline]
    pub fn allocated(&self) -> usize {
        N - self.top
    }

    /// Total number of slots
    #[inline]
    pub const fn capacity(&self) -> usize {
        N
    }

    /// True if no slot is handed out
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.top == N
    }

    /// True if the next `allocate` will fail
    #[inline]
    pub fn is_full(&self) -> bool {
        self.top == 0
    }
}

impl<T: Default, const N: usize> FixedPool<T, N> {
    /// Create a pool with every slot set to `T::default()`.
    pub fn new() -> Self {
        Self::with_init(T::default)
    }
}

impl<T: Default, const N: usize> Default for FixedPool<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, const N: usize> fmt::Debug for FixedPool<T, N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FixedPool")
            .field("capacity", &N)
            .field("allocated", &self.allocated())
            .field("available", &self.top)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_pool_creation() {
        let pool: FixedPool<u64, 100> = FixedPool::new();
        assert_eq!(pool.capacity(), 100);
        assert_eq!(pool.allocated(), 0);
        assert_eq!(pool.available(), 100);
        assert!(!pool.is_full());
        assert!(pool.is_empty());
    }

    #[test]
    fn test_pool_alloc_free() {
        let mut pool: FixedPool<u64, 3> = FixedPool::new();

        // Allocate all slots
        let h0 = pool.allocate().expect("Should allocate");
        let h1 = pool.allocate().expect("Should allocate");
        let h2 = pool.allocate().expect("Should allocate");

        assert_eq!(pool.allocated(), 3);
        assert!(pool.is_full());
        assert!(pool.allocate().is_none(), "Should be exhausted");

        // Free one
        let freed = h1.index();
        pool.release(h1);
        assert_eq!(pool.allocated(), 2);
        assert!(!pool.is_full());

        // Allocate again (should reuse h1's slot)
        let h3 = pool.allocate().expect("Should allocate");
        assert_eq!(h3.index(), freed, "Should reuse freed slot");

        pool.release(h0);
        pool.release(h2);
        pool.release(h3);
        assert!(pool.is_empty());
    }

    #[test]
    fn test_fresh_pool_hands_out_ascending_indices() {
        let mut pool: FixedPool<u8, 4> = FixedPool::new();
        let indices: Vec<_> = (0..4).map(|_| pool.allocate().unwrap().index()).collect();
        assert_eq!(indices, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_deallocate_none_is_noop() {
        let mut pool: FixedPool<u64, 2> = FixedPool::new();
        let h = pool.allocate().unwrap();
        pool.deallocate(None);
        assert_eq!(pool.allocated(), 1);
        pool.deallocate(Some(h));
        assert_eq!(pool.allocated(), 0);
    }

    #[test]
    fn test_pool_get_set() {
        let mut pool: FixedPool<(u64, i64), 10> = FixedPool::new();
        let h = pool.allocate().unwrap();

        *pool.get_mut(&h) = (12345, -7);
        assert_eq!(*pool.get(&h), (12345, -7));
    }

    #[test]
    fn test_reused_slot_is_not_reset() {
        let mut pool: FixedPool<u64, 1> = FixedPool::new();
        let h = pool.allocate().unwrap();
        *pool.get_mut(&h) = 42;
        pool.release(h);

        let h = pool.allocate().unwrap();
        assert_eq!(*pool.get(&h), 42);
    }

    #[test]
    fn test_handles_are_distinct() {
        const N: usize = 64;
        let mut pool: FixedPool<u32, N> = FixedPool::new();
        let handles: Vec<_> = std::iter::from_fn(|| pool.allocate()).collect();
        assert_eq!(handles.len(), N);

        let unique: HashSet<_> = handles.iter().map(SlotHandle::index).collect();
        assert_eq!(unique.len(), N);
        assert!(unique.iter().all(|&i| (i as usize) < N));
    }

    #[test]
    fn test_with_init() {
        struct NoDefault(u32);

        let mut next = 0;
        let mut pool: FixedPool<NoDefault, 3> = FixedPool::with_init(|| {
            next += 10;
            NoDefault(next)
        });
        let h = pool.allocate().unwrap();
        assert_eq!(pool.get(&h).0, 10);
    }

    #[test]
    fn test_large_pool_on_heap() {
        let mut pool: FixedPool<[u8; 64], 100_000> = FixedPool::with_init(|| [0u8; 64]);
        assert_eq!(pool.available(), 100_000);
        let h = pool.allocate().unwrap();
        pool.get_mut(&h)[63] = 1;
        pool.release(h);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "Double free detected")]
    fn test_double_free_asserts_in_debug() {
        let mut pool: FixedPool<u64, 2> = FixedPool::new();
        let h = pool.allocate().unwrap();
        let forged = SlotHandle { index: h.index() };
        pool.release(h);
        pool.release(forged);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "Index out of bounds")]
    fn test_foreign_index_asserts_in_debug() {
        let mut pool: FixedPool<u64, 2> = FixedPool::new();
        let _h = pool.allocate().unwrap();
        pool.release(SlotHandle { index: 7 });
    }

    #[test]
    fn test_debug_format() {
        let mut pool: FixedPool<u64, 4> = FixedPool::new();
        let _h = pool.allocate();
        let s = format!("{:?}", pool);
        assert!(s.contains("capacity: 4"));
        assert!(s.contains("allocated: 1"));
    }
}
