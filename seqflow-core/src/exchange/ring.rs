use std::{
    cell::UnsafeCell,
    mem::MaybeUninit,
    sync::atomic::{AtomicBool, AtomicUsize, Ordering},
};

use crossbeam_utils::CachePadded;

/// Fixed-capacity slot array shared by one [`Producer`](super::Producer) and one
/// [`Consumer`](super::Consumer).
///
/// # Safety
///
/// `head` is only ever stored by the producer and `tail` only by the consumer. A slot in
/// `tail..head` is initialized and owned by the consumer side; every other slot is free and
/// owned by the producer side. The handles are not `Clone` and their methods take `&mut self`,
/// so at most one thread writes each index.
pub(super) struct Ring<T> {
    slots: Box<[UnsafeCell<MaybeUninit<T>>]>,
    mask: usize,
    /// Next slot the producer writes. Written by the producer only.
    head: CachePadded<AtomicUsize>,
    /// Next slot the consumer reads. Written by the consumer only.
    tail: CachePadded<AtomicUsize>,
    /// Set once the producer handle is dropped.
    closed: AtomicBool,
}

unsafe impl<T: Send> Send for Ring<T> {}
unsafe impl<T: Send> Sync for Ring<T> {}

impl<T> Ring<T> {
    /// Allocates all slots up front. `capacity` must already be validated as a power of two.
    pub(super) fn new(capacity: usize) -> Self {
        debug_assert!(capacity.is_power_of_two());

        let slots = (0..capacity).map(|_| UnsafeCell::new(MaybeUninit::uninit())).collect();

        Self {
            slots,
            mask: capacity - 1,
            head: CachePadded::new(AtomicUsize::new(0)),
            tail: CachePadded::new(AtomicUsize::new(0)),
            closed: AtomicBool::new(false),
        }
    }

    #[inline]
    pub(super) fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Producer side only.
    pub(super) fn push(&self, item: T) -> Result<(), T> {
        let head = self.head.load(Ordering::Relaxed);
        let next = (head + 1) & self.mask;

        // One slot stays free so that `head == tail` always means empty.
        if next == self.tail.load(Ordering::Acquire) {
            return Err(item);
        }

        // SAFETY: `head` is outside `tail..head`, so the consumer does not touch this slot until
        // the release store below publishes it.
        unsafe {
            (*self.slots[head].get()).write(item);
        }

        self.head.store(next, Ordering::Release);
        Ok(())
    }

    /// Consumer side only.
    pub(super) fn pop(&self) -> Option<T> {
        let tail = self.tail.load(Ordering::Relaxed);

        if tail == self.head.load(Ordering::Acquire) {
            return None;
        }

        // SAFETY: the acquire load above observed a head past `tail`, so the producer's write to
        // this slot happened-before this read. The slot is handed back by the store below.
        let item = unsafe { (*self.slots[tail].get()).assume_init_read() };

        self.tail.store((tail + 1) & self.mask, Ordering::Release);
        Some(item)
    }

    pub(super) fn len(&self) -> usize {
        let head = self.head.load(Ordering::Acquire);
        let tail = self.tail.load(Ordering::Acquire);
        head.wrapping_sub(tail) & self.mask
    }

    pub(super) fn is_empty(&self) -> bool {
        self.head.load(Ordering::Acquire) == self.tail.load(Ordering::Acquire)
    }

    pub(super) fn close(&self) {
        self.closed.store(true, Ordering::Release);
    }

    pub(super) fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

impl<T> Drop for Ring<T> {
    fn drop(&mut self) {
        // Both handles are gone, drop whatever was never consumed.
        while self.pop().is_some() {}
    }
}
