//! Priority router: fans the ordered release stream out into per-destination queues, each
//! dequeued by traffic class and then by sequence number.

use parking_lot::Mutex;
use thiserror::Error;
use tracing::trace;

use seqflow_packet::Packet;

mod queue;
use queue::DispatchQueue;

mod stats;
pub use stats::{RouterSnapshot, RouterStats};

/// Number of output queues when not configured otherwise.
const DEFAULT_NUM_QUEUES: usize = 8;

/// Errors returned by a [`PriorityRouter`].
#[derive(Debug, Error)]
pub enum RouterError {
    /// The router was configured with zero queues.
    #[error("A router needs at least one queue")]
    NoQueues,
    /// A queue index past the last queue.
    #[error("Queue {queue} does not exist, router has {num_queues} queues")]
    InvalidQueue {
        /// The requested index.
        queue: usize,
        /// Number of queues the router has.
        num_queues: usize,
    },
}

/// Options for a [`PriorityRouter`].
#[derive(Debug, Clone)]
pub struct RouterOptions {
    /// Number of output queues. Destinations map onto them modulo this number.
    pub num_queues: usize,
}

impl Default for RouterOptions {
    fn default() -> Self {
        Self { num_queues: DEFAULT_NUM_QUEUES }
    }
}

impl RouterOptions {
    /// Sets the number of output queues.
    pub const fn num_queues(mut self, num_queues: usize) -> Self {
        self.num_queues = num_queues;
        self
    }
}

/// Routes packets into `N` independent output queues selected by destination.
///
/// Every queue has its own lock, so traffic on one destination never blocks another. Inside a
/// queue, [`dequeue`](Self::dequeue) returns the highest [`Priority`](seqflow_packet::Priority)
/// first and breaks ties by ascending sequence number. No order is kept across queues.
#[derive(Debug)]
pub struct PriorityRouter {
    queues: Box<[Mutex<DispatchQueue>]>,
    stats: RouterStats,
}

impl PriorityRouter {
    /// Creates a new router with `options.num_queues` empty queues.
    pub fn new(options: RouterOptions) -> Result<Self, RouterError> {
        if options.num_queues == 0 {
            return Err(RouterError::NoQueues);
        }

        Ok(Self {
            queues: (0..options.num_queues).map(|_| Mutex::default()).collect(),
            stats: RouterStats::new(options.num_queues),
        })
    }

    /// Index of the queue serving `destination`.
    #[inline]
    pub fn queue_for(&self, destination: u32) -> usize {
        destination as usize % self.queues.len()
    }

    /// Places the packet in its destination's queue. Returns the queue index.
    pub fn route(&self, packet: Packet) -> usize {
        let queue = self.queue_for(packet.destination());
        trace!(seq = packet.seq(), priority = %packet.priority(), queue, "Routing packet");

        let mut guard = self.queues[queue].lock();
        guard.push(packet);
        self.stats.record_routed(queue);

        queue
    }

    /// Removes the most urgent packet from `queue`, or returns `None` if it is empty.
    pub fn dequeue(&self, queue: usize) -> Result<Option<Packet>, RouterError> {
        let mut guard = self.queue(queue)?.lock();
        let packet = guard.pop();

        // Depth counters move under the queue lock so they never run below zero.
        if packet.is_some() {
            self.stats.record_dequeued(queue);
        }

        Ok(packet)
    }

    /// Dequeues every packet currently in `queue`, in dispatch order.
    pub fn drain(&self, queue: usize) -> Result<Vec<Packet>, RouterError> {
        let mut drained = Vec::new();
        while let Some(packet) = self.dequeue(queue)? {
            drained.push(packet);
        }

        Ok(drained)
    }

    /// Current depth of `queue`.
    pub fn queue_depth(&self, queue: usize) -> Result<usize, RouterError> {
        Ok(self.queue(queue)?.lock().len())
    }

    /// Number of output queues.
    #[inline]
    pub fn num_queues(&self) -> usize {
        self.queues.len()
    }

    /// Total packets routed since creation.
    #[inline]
    pub fn total_routed(&self) -> u64 {
        self.stats.routed()
    }

    /// Total packets dequeued since creation.
    #[inline]
    pub fn total_dequeued(&self) -> u64 {
        self.stats.dequeued()
    }

    /// Live counters.
    #[inline]
    pub const fn stats(&self) -> &RouterStats {
        &self.stats
    }

    /// Point-in-time copy of the counters and queue depths.
    pub fn snapshot(&self) -> RouterSnapshot {
        RouterSnapshot {
            routed: self.stats.routed(),
            dequeued: self.stats.dequeued(),
            depths: self.stats.depths(),
        }
    }

    fn queue(&self, queue: usize) -> Result<&Mutex<DispatchQueue>, RouterError> {
        self.queues
            .get(queue)
            .ok_or(RouterError::InvalidQueue { queue, num_queues: self.queues.len() })
    }
}
