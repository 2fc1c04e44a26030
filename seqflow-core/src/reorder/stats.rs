use std::{
    fmt,
    sync::atomic::{AtomicU64, Ordering},
};

/// Counters for a reordering buffer. Owned by the buffer instance, written under its lock and
/// readable from any thread without taking it.
#[derive(Debug, Default)]
pub struct ReorderStats {
    /// Total packets handed to `insert`
    received: AtomicU64,
    /// Total packets released in order
    released: AtomicU64,
    /// Total sequence numbers skipped after a timeout
    gaps: AtomicU64,
    /// Total inserts whose sequence number was already pending
    duplicates: AtomicU64,
    /// Total inserts whose sequence number had already been skipped
    late: AtomicU64,
    /// Total orphaned entries removed by a purge
    purged: AtomicU64,
    /// Total inserts dropped because the buffer was shut down
    rejected: AtomicU64,
}

impl ReorderStats {
    #[inline]
    pub(crate) fn increment_received(&self) {
        self.received.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn increment_released(&self) {
        self.released.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn add_gaps(&self, count: u64) {
        self.gaps.fetch_add(count, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn increment_duplicates(&self) {
        self.duplicates.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn increment_late(&self) {
        self.late.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn increment_rejected(&self) {
        self.rejected.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn add_purged(&self, count: u64) {
        self.purged.fetch_add(count, Ordering::Relaxed);
    }

    /// Packets handed to `insert`.
    #[inline]
    pub fn received(&self) -> u64 {
        self.received.load(Ordering::Relaxed)
    }

    /// Packets released in order.
    #[inline]
    pub fn released(&self) -> u64 {
        self.released.load(Ordering::Relaxed)
    }

    /// Sequence numbers skipped without a packet.
    #[inline]
    pub fn gaps(&self) -> u64 {
        self.gaps.load(Ordering::Relaxed)
    }

    /// Inserts whose sequence number was already pending.
    #[inline]
    pub fn duplicates(&self) -> u64 {
        self.duplicates.load(Ordering::Relaxed)
    }

    /// Inserts whose sequence number had already been skipped.
    #[inline]
    pub fn late(&self) -> u64 {
        self.late.load(Ordering::Relaxed)
    }

    /// Orphans removed by [`purge_orphans`](super::ReorderBuffer::purge_orphans).
    #[inline]
    pub fn purged(&self) -> u64 {
        self.purged.load(Ordering::Relaxed)
    }

    /// Inserts dropped because the buffer was shut down.
    #[inline]
    pub fn rejected(&self) -> u64 {
        self.rejected.load(Ordering::Relaxed)
    }
}

/// Point-in-time view of a reordering buffer, for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReorderSnapshot {
    /// See [`ReorderStats::received`].
    pub received: u64,
    /// See [`ReorderStats::released`].
    pub released: u64,
    /// See [`ReorderStats::gaps`].
    pub gaps: u64,
    /// See [`ReorderStats::duplicates`].
    pub duplicates: u64,
    /// See [`ReorderStats::late`].
    pub late: u64,
    /// See [`ReorderStats::purged`].
    pub purged: u64,
    /// See [`ReorderStats::rejected`].
    pub rejected: u64,
    /// Packets currently held, orphans included.
    pub buffered: usize,
    /// Held packets whose sequence number was already skipped.
    pub orphaned: usize,
    /// The next sequence number the consumer will receive.
    pub next_expected_seq: u64,
}

impl fmt::Display for ReorderSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Reordering Buffer Stats:")?;
        writeln!(f, "  Received:   {}", self.received)?;
        writeln!(f, "  Released:   {}", self.released)?;
        writeln!(f, "  Gaps:       {}", self.gaps)?;
        writeln!(f, "  Duplicates: {}", self.duplicates)?;
        writeln!(f, "  Late:       {}", self.late)?;
        writeln!(f, "  Purged:     {}", self.purged)?;
        writeln!(f, "  Rejected:   {}", self.rejected)?;
        writeln!(f, "  Buffered:   {} ({} orphaned)", self.buffered, self.orphaned)?;
        write!(f, "  Next seq:   {}", self.next_expected_seq)
    }
}
