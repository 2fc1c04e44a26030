use std::{
    collections::{btree_map::Entry, BTreeMap},
    time::{Duration, Instant},
};

use parking_lot::{Condvar, Mutex};
use tracing::{debug, trace, warn};

use seqflow_packet::Packet;

use super::{
    DuplicatePolicy, Insert, LatePolicy, Release, ReorderOptions, ReorderSnapshot, ReorderStats,
};

/// State guarded by the buffer lock.
#[derive(Debug)]
struct State {
    /// The next sequence number promised to the consumer. Never decreases.
    next_expected: u64,
    /// Packets waiting for their turn, plus orphans below `next_expected`.
    pending: BTreeMap<u64, Packet>,
    shutdown: bool,
    /// Latched once [`Release::Closed`] has been returned, or once the sequence space is used
    /// up. Never cleared.
    closed: bool,
}

impl State {
    /// Returns `true` if some pending packet can still be released.
    fn has_releasable(&self) -> bool {
        self.first_releasable().is_some()
    }

    fn first_releasable(&self) -> Option<u64> {
        self.pending.range(self.next_expected..).next().map(|(&seq, _)| seq)
    }

    /// Moves past `next_expected`. At `u64::MAX` there is nothing left to expect, so the
    /// buffer closes instead of wrapping.
    fn advance(&mut self) {
        match self.next_expected.checked_add(1) {
            Some(next) => self.next_expected = next,
            None => self.closed = true,
        }
    }

    fn orphaned(&self) -> usize {
        self.pending.range(..self.next_expected).count()
    }
}

/// Thread-safe buffer that accepts out-of-order packets and releases them in sequence order.
///
/// Any number of threads may [`insert`](Self::insert). Consumers call
/// [`next_release`](Self::next_release), which waits at most the configured timeout for the
/// expected sequence number. If it does not show up, that sequence number is recorded as a gap
/// and skipped, so one lost packet can never stall the stream.
///
/// ```
/// use bytes::Bytes;
/// use seqflow_core::reorder::{ReorderBuffer, ReorderOptions};
/// use seqflow_packet::{Packet, Priority};
///
/// let buffer = ReorderBuffer::new(ReorderOptions::default());
///
/// for seq in [2, 0, 1] {
///     let payload = Bytes::from(vec![0u8; 64]);
///     let _ = buffer.insert(Packet::new(seq, Priority::Bulk, 1, 0, payload).unwrap());
/// }
///
/// for seq in 0..3 {
///     assert_eq!(buffer.get_next().unwrap().seq(), seq);
/// }
/// ```
#[derive(Debug)]
pub struct ReorderBuffer {
    state: Mutex<State>,
    /// Notified when the expected packet lands, and on shutdown.
    available: Condvar,
    options: ReorderOptions,
    stats: ReorderStats,
}

impl ReorderBuffer {
    /// Creates a new buffer expecting `options.start_seq` first.
    pub fn new(options: ReorderOptions) -> Self {
        Self {
            state: Mutex::new(State {
                next_expected: options.start_seq,
                pending: BTreeMap::new(),
                shutdown: false,
                closed: false,
            }),
            available: Condvar::new(),
            options,
            stats: ReorderStats::default(),
        }
    }

    /// Stores a packet keyed by its sequence number and wakes a consumer waiting for it.
    ///
    /// Never fails; the returned [`Insert`] says what happened to it according to the
    /// configured [`DuplicatePolicy`] and [`LatePolicy`]. Once the buffer is shut down every
    /// packet is dropped with [`Insert::Closed`], so nothing new becomes releasable after
    /// [`Release::Closed`].
    pub fn insert(&self, packet: Packet) -> Insert {
        let seq = packet.seq();
        let mut state = self.state.lock();
        self.stats.increment_received();

        if state.shutdown || state.closed {
            self.stats.increment_rejected();
            debug!(seq, "Buffer is shut down, dropping packet");
            return Insert::Closed;
        }

        let late = seq < state.next_expected;
        if late {
            self.stats.increment_late();

            if self.options.late_policy == LatePolicy::Discard {
                debug!(seq, next_expected = state.next_expected, "Discarding late packet");
                return Insert::Late;
            }

            debug!(seq, next_expected = state.next_expected, "Retaining late packet as orphan");
        }

        let outcome = match state.pending.entry(seq) {
            Entry::Vacant(slot) => {
                slot.insert(packet);
                if late {
                    Insert::Orphaned
                } else {
                    Insert::Buffered
                }
            }
            Entry::Occupied(mut slot) => {
                self.stats.increment_duplicates();

                match self.options.duplicate_policy {
                    DuplicatePolicy::Replace => {
                        warn!(seq, "Duplicate sequence number, replacing pending packet");
                        slot.insert(packet);
                        Insert::Replaced
                    }
                    DuplicatePolicy::KeepFirst => {
                        warn!(seq, "Duplicate sequence number, keeping pending packet");
                        Insert::Duplicate
                    }
                }
            }
        };

        if seq == state.next_expected {
            self.available.notify_all();
        }

        outcome
    }

    /// Waits up to the configured timeout for the next packet in sequence order.
    pub fn next_release(&self) -> Release {
        self.next_release_timeout(self.options.timeout)
    }

    /// Waits up to `timeout` for the next packet in sequence order.
    ///
    /// Every call does exactly one of the following:
    /// - releases the expected packet;
    /// - skips the expected sequence number as a gap, then releases its successor if that one
    ///   is already pending, or returns [`Release::Gap`] otherwise;
    /// - returns [`Release::Closed`] once the buffer is shut down and nothing releasable is
    ///   left. From then on every call returns [`Release::Closed`].
    ///
    /// After shutdown the call no longer waits: each call releases the next pending packet,
    /// skipping every missing sequence number before it in one step (all counted as gaps).
    pub fn next_release_timeout(&self, timeout: Duration) -> Release {
        let deadline = Instant::now().checked_add(timeout);
        let mut state = self.state.lock();
        let mut timed_out = false;

        loop {
            if state.closed {
                return Release::Closed;
            }

            if let Some(packet) = self.release(&mut state) {
                return Release::Packet(packet);
            }

            if state.shutdown {
                return self.skip_to_releasable(&mut state);
            }

            if timed_out {
                break;
            }

            match deadline {
                Some(deadline) => {
                    timed_out = self.available.wait_until(&mut state, deadline).timed_out();
                }
                None => self.available.wait(&mut state),
            }
        }

        let skipped = state.next_expected;
        state.advance();
        self.stats.add_gaps(1);
        debug!(seq = skipped, pending = state.pending.len(), "Expected packet timed out, skipping");

        match self.release(&mut state) {
            Some(packet) => Release::Packet(packet),
            None => Release::Gap { seq: skipped },
        }
    }

    /// Drain step of a shut-down buffer: jumps straight to the first pending packet at or
    /// above `next_expected` and releases it, or closes the buffer for good if there is none.
    fn skip_to_releasable(&self, state: &mut State) -> Release {
        let Some(seq) = state.first_releasable() else {
            state.closed = true;
            debug!(next_expected = state.next_expected, "Reordering buffer closed");
            return Release::Closed;
        };

        let skipped = seq - state.next_expected;
        if skipped > 0 {
            debug!(from = state.next_expected, to = seq, skipped, "Skipping gaps after shutdown");
            state.next_expected = seq;
            self.stats.add_gaps(skipped);
        }

        match self.release(state) {
            Some(packet) => Release::Packet(packet),
            None => Release::Closed,
        }
    }

    /// Waits up to the configured timeout for the next packet in sequence order.
    ///
    /// Returns `None` on a gap and once closed; use [`next_release`](Self::next_release) to
    /// tell the two apart.
    pub fn get_next(&self) -> Option<Packet> {
        self.next_release().into_packet()
    }

    /// Removes the expected packet if it is pending and advances the expected sequence number.
    fn release(&self, state: &mut State) -> Option<Packet> {
        let packet = state.pending.remove(&state.next_expected)?;
        state.advance();
        self.stats.increment_released();
        trace!(seq = packet.seq(), "Released packet");

        if state.closed {
            self.available.notify_all();
        } else if state.pending.contains_key(&state.next_expected) {
            // Another consumer may be waiting for the successor, which is already here.
            self.available.notify_one();
        }

        Some(packet)
    }

    /// Shuts the buffer down and wakes every blocked consumer.
    ///
    /// Later inserts are dropped with [`Insert::Closed`]. Consumers drain what can be released
    /// and then observe [`Release::Closed`].
    pub fn shutdown(&self) {
        let mut state = self.state.lock();
        if !state.shutdown {
            state.shutdown = true;
            debug!(
                pending = state.pending.len(),
                next_expected = state.next_expected,
                "Reordering buffer shutting down"
            );
        }
        self.available.notify_all();
    }

    /// Drops every orphan, i.e. every pending packet whose sequence number was already skipped.
    /// Returns how many were removed.
    pub fn purge_orphans(&self) -> usize {
        let orphans = {
            let mut state = self.state.lock();
            let next_expected = state.next_expected;
            let keep = state.pending.split_off(&next_expected);
            std::mem::replace(&mut state.pending, keep)
        };

        let count = orphans.len();
        if count > 0 {
            self.stats.add_purged(count as u64);
            debug!(count, "Purged orphaned packets");
        }

        count
    }

    /// Returns `true` once [`shutdown`](Self::shutdown) has been called.
    pub fn is_shutdown(&self) -> bool {
        self.state.lock().shutdown
    }

    /// Returns `true` once shut down with nothing left to release.
    pub fn is_closed(&self) -> bool {
        let state = self.state.lock();
        state.closed || (state.shutdown && !state.has_releasable())
    }

    /// The next sequence number the consumer will receive.
    pub fn next_expected_seq(&self) -> u64 {
        self.state.lock().next_expected
    }

    /// Number of packets held, orphans included.
    pub fn pending_len(&self) -> usize {
        self.state.lock().pending.len()
    }

    /// Number of held packets whose sequence number was already skipped.
    pub fn orphaned_len(&self) -> usize {
        self.state.lock().orphaned()
    }

    /// The options the buffer was created with.
    #[inline]
    pub const fn options(&self) -> &ReorderOptions {
        &self.options
    }

    /// Live counters.
    #[inline]
    pub const fn stats(&self) -> &ReorderStats {
        &self.stats
    }

    /// A consistent view of the counters and the pending set.
    pub fn snapshot(&self) -> ReorderSnapshot {
        let state = self.state.lock();

        ReorderSnapshot {
            received: self.stats.received(),
            released: self.stats.released(),
            gaps: self.stats.gaps(),
            duplicates: self.stats.duplicates(),
            late: self.stats.late(),
            purged: self.stats.purged(),
            rejected: self.stats.rejected(),
            buffered: state.pending.len(),
            orphaned: state.orphaned(),
            next_expected_seq: state.next_expected,
        }
    }
}
