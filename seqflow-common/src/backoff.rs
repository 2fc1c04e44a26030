use std::{thread, time::Duration};

/// Helper trait alias for backoff policies.
/// We define any iterator that yields `Duration`s as a backoff.
pub trait Backoff: Iterator<Item = Duration> {}

// Blanket implementation of `Backoff` for any iterator that yields `Duration`s.
impl<T> Backoff for T where T: Iterator<Item = Duration> {}

/// An iterator that yields exponentially increasing backoff durations, for callers of the
/// non-blocking pipeline primitives that want to retry on a full or empty buffer.
///
/// Each call to [`Iterator::next`] returns the current duration and doubles it, capped at
/// `max`. The iterator ends after `max_retries` steps, if set.
#[derive(Debug, Clone)]
pub struct ExponentialBackoff {
    /// The first duration yielded, used again after [`ExponentialBackoff::reset`].
    initial: Duration,
    /// Upper bound for a single step.
    max: Duration,
    /// Current number of retries.
    retry_count: usize,
    /// Maximum number of retries before the iterator ends.
    /// If `None`, the iterator never ends.
    max_retries: Option<usize>,
    /// The current backoff duration.
    backoff: Duration,
}

impl ExponentialBackoff {
    /// Creates a new exponential backoff with the given initial duration, cap and max retries.
    pub const fn new(initial: Duration, max: Duration, max_retries: Option<usize>) -> Self {
        Self { initial, max, retry_count: 0, max_retries, backoff: initial }
    }

    /// Starts over from the initial duration. Call this after a successful attempt.
    pub fn reset(&mut self) {
        self.retry_count = 0;
        self.backoff = self.initial;
    }

    /// Number of steps taken since creation or the last reset.
    pub const fn retries(&self) -> usize {
        self.retry_count
    }

    /// Sleeps the current thread for the next step. Returns `false` once retries are exhausted.
    pub fn snooze(&mut self) -> bool {
        match self.next() {
            Some(duration) if duration.is_zero() => {
                thread::yield_now();
                true
            }
            Some(duration) => {
                thread::sleep(duration);
                true
            }
            None => {
                tracing::trace!(retries = self.retry_count, "Backoff exhausted");
                false
            }
        }
    }
}

impl Default for ExponentialBackoff {
    fn default() -> Self {
        Self::new(Duration::from_micros(1), Duration::from_millis(1), None)
    }
}

impl Iterator for ExponentialBackoff {
    type Item = Duration;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(max_retries) = self.max_retries {
            if self.retry_count >= max_retries {
                return None;
            }
        }

        let current = self.backoff;
        self.retry_count += 1;
        self.backoff = (self.backoff * 2).min(self.max);

        Some(current)
    }
}
