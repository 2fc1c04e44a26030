//! Reordering buffer: accepts packets in any arrival order and releases them to the consumer
//! strictly by sequence number, skipping a sequence number once its wait times out.

use std::time::Duration;

use seqflow_packet::Packet;

mod buffer;
pub use buffer::ReorderBuffer;

mod stats;
pub use stats::{ReorderSnapshot, ReorderStats};

/// How long a consumer waits for the expected packet before declaring it lost.
const DEFAULT_TIMEOUT: Duration = Duration::from_millis(50);

/// What to do when a packet arrives with a sequence number that is already pending.
///
/// Either way the event is counted in [`ReorderStats::duplicates`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DuplicatePolicy {
    /// Last write wins: the new packet replaces the pending one.
    #[default]
    Replace,
    /// The pending packet stays and the new one is dropped.
    KeepFirst,
}

/// What to do with a packet whose sequence number was already skipped past.
///
/// Such a packet can never be released. Either way the event is counted in
/// [`ReorderStats::late`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LatePolicy {
    /// Keep it in the pending set as an orphan. Orphans are never released and stay until
    /// [`ReorderBuffer::purge_orphans`] is called.
    #[default]
    Retain,
    /// Drop it on arrival. Nothing is ever orphaned.
    Discard,
}

/// Options for a [`ReorderBuffer`].
#[derive(Debug, Clone)]
pub struct ReorderOptions {
    /// The first sequence number the consumer expects.
    pub start_seq: u64,
    /// Per-call wait bound of [`ReorderBuffer::next_release`].
    pub timeout: Duration,
    /// What to do with a second packet for a pending sequence number.
    pub duplicate_policy: DuplicatePolicy,
    /// What to do with a packet whose sequence number was already skipped.
    pub late_policy: LatePolicy,
}

impl Default for ReorderOptions {
    fn default() -> Self {
        Self {
            start_seq: 0,
            timeout: DEFAULT_TIMEOUT,
            duplicate_policy: DuplicatePolicy::default(),
            late_policy: LatePolicy::default(),
        }
    }
}

impl ReorderOptions {
    /// Sets the first sequence number the consumer expects.
    pub const fn start_seq(mut self, start_seq: u64) -> Self {
        self.start_seq = start_seq;
        self
    }

    /// Sets how long a single call waits for the expected packet before skipping it.
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the policy for packets whose sequence number is already pending.
    pub const fn duplicate_policy(mut self, policy: DuplicatePolicy) -> Self {
        self.duplicate_policy = policy;
        self
    }

    /// Sets the policy for packets that arrive after their sequence number was skipped.
    pub const fn late_policy(mut self, policy: LatePolicy) -> Self {
        self.late_policy = policy;
        self
    }
}

/// Outcome of [`ReorderBuffer::insert`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Insert {
    /// Stored, waiting for its turn.
    Buffered,
    /// Stored, but its sequence number was already skipped so it will never be released.
    Orphaned,
    /// Stored in place of a pending packet with the same sequence number.
    Replaced,
    /// Dropped: a packet with the same sequence number is already pending.
    Duplicate,
    /// Dropped: its sequence number was already skipped.
    Late,
    /// Dropped: the buffer is shut down and accepts nothing new.
    Closed,
}

impl Insert {
    /// Returns `true` if the packet was stored.
    pub const fn is_stored(self) -> bool {
        matches!(self, Self::Buffered | Self::Orphaned | Self::Replaced)
    }
}

/// Outcome of one [`ReorderBuffer::next_release`] call.
#[derive(Debug)]
pub enum Release {
    /// The next packet in sequence order.
    Packet(Packet),
    /// The expected sequence number timed out and was skipped, and its successor is not
    /// pending yet.
    Gap {
        /// The skipped sequence number.
        seq: u64,
    },
    /// The buffer is shut down and holds nothing that can still be released. Terminal: every
    /// later call returns `Closed` as well.
    Closed,
}

impl Release {
    /// Returns the released packet, if any.
    pub fn into_packet(self) -> Option<Packet> {
        match self {
            Self::Packet(packet) => Some(packet),
            Self::Gap { .. } | Self::Closed => None,
        }
    }

    /// Returns `true` for [`Release::Closed`].
    pub const fn is_closed(&self) -> bool {
        matches!(self, Self::Closed)
    }
}
