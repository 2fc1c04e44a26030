use std::{cmp::Ordering, collections::BinaryHeap};

use derive_more::Deref;

use seqflow_packet::Packet;

/// A packet ordered for dispatch: higher [`Priority`](seqflow_packet::Priority) first, then
/// lower sequence number first.
///
/// [`BinaryHeap`] pops its maximum, so the sequence number comparison is reversed.
#[derive(Debug, Deref)]
pub(super) struct Queued(Packet);

impl Ord for Queued {
    fn cmp(&self, other: &Self) -> Ordering {
        self.priority().cmp(&other.priority()).then_with(|| other.seq().cmp(&self.seq()))
    }
}

impl PartialOrd for Queued {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Queued {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Queued {}

/// One destination's output queue. Guarded by its own lock in the router.
#[derive(Debug, Default)]
pub(super) struct DispatchQueue {
    heap: BinaryHeap<Queued>,
}

impl DispatchQueue {
    pub(super) fn push(&mut self, packet: Packet) {
        self.heap.push(Queued(packet));
    }

    pub(super) fn pop(&mut self) -> Option<Packet> {
        self.heap.pop().map(|Queued(packet)| packet)
    }

    pub(super) fn len(&self) -> usize {
        self.heap.len()
    }
}
