//! Fast-path exchange: a bounded, wait-free hand-off between exactly one producer thread and
//! one consumer thread.
//!
//! [`channel`] returns the two halves. Neither half can be cloned and both operate through
//! `&mut self`, so the single-writer / single-reader discipline the ring depends on is upheld by
//! the type system instead of by convention.
//!
//! ```
//! use seqflow_core::exchange;
//!
//! let (mut tx, mut rx) = exchange::channel::<u32>(8).unwrap();
//!
//! std::thread::spawn(move || {
//!     for i in 0..100 {
//!         let mut item = i;
//!         while let Err(back) = tx.push(item) {
//!             item = back;
//!             std::thread::yield_now();
//!         }
//!     }
//! });
//!
//! let mut received = 0;
//! while received < 100 {
//!     if rx.pop().is_some() {
//!         received += 1;
//!     }
//! }
//! ```

use std::{fmt, sync::Arc};

use thiserror::Error;

mod ring;
use ring::Ring;

/// Errors returned when creating an exchange.
#[derive(Debug, Error)]
pub enum ExchangeError {
    /// The capacity is not a power of two, or is below 2.
    #[error("Exchange capacity must be a power of two and at least 2, got {0}")]
    InvalidCapacity(usize),
}

/// Creates a new exchange with room for `capacity - 1` items.
///
/// `capacity` must be a power of two, so that index wraparound is a bitmask, and at least 2. One
/// slot is always kept free to tell a full ring from an empty one.
pub fn channel<T: Send>(capacity: usize) -> Result<(Producer<T>, Consumer<T>), ExchangeError> {
    if capacity < 2 || !capacity.is_power_of_two() {
        return Err(ExchangeError::InvalidCapacity(capacity));
    }

    let ring = Arc::new(Ring::new(capacity));

    Ok((Producer { ring: Arc::clone(&ring) }, Consumer { ring }))
}

/// The writing half of an exchange.
pub struct Producer<T> {
    ring: Arc<Ring<T>>,
}

impl<T> Producer<T> {
    /// Attempts to hand `item` to the consumer. Never blocks.
    ///
    /// Returns the item back if the ring is full. Retrying, backing off or dropping is up to
    /// the caller.
    #[inline]
    pub fn push(&mut self, item: T) -> Result<(), T> {
        self.ring.push(item)
    }

    /// Approximate number of items waiting in the ring.
    #[inline]
    pub fn len(&self) -> usize {
        self.ring.len()
    }

    /// Approximate emptiness snapshot.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ring.is_empty()
    }

    /// Number of slots, including the one that is always kept free.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.ring.capacity()
    }
}

impl<T> Drop for Producer<T> {
    fn drop(&mut self) {
        self.ring.close();
    }
}

impl<T> fmt::Debug for Producer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Producer")
            .field("len", &self.len())
            .field("capacity", &self.capacity())
            .finish()
    }
}

/// The reading half of an exchange.
pub struct Consumer<T> {
    ring: Arc<Ring<T>>,
}

impl<T> Consumer<T> {
    /// Takes the oldest item out of the ring. Never blocks; returns `None` when empty.
    #[inline]
    pub fn pop(&mut self) -> Option<T> {
        self.ring.pop()
    }

    /// Approximate number of items waiting in the ring.
    #[inline]
    pub fn len(&self) -> usize {
        self.ring.len()
    }

    /// Approximate emptiness snapshot.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ring.is_empty()
    }

    /// Number of slots, including the one that is always kept free.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.ring.capacity()
    }

    /// Returns `true` once the [`Producer`] has been dropped. Items pushed before that are
    /// still available through [`Consumer::pop`].
    #[inline]
    pub fn is_closed(&self) -> bool {
        self.ring.is_closed()
    }
}

impl<T> fmt::Debug for Consumer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Consumer")
            .field("len", &self.len())
            .field("capacity", &self.capacity())
            .field("closed", &self.is_closed())
            .finish()
    }
}
