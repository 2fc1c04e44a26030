use std::{
    fmt,
    sync::atomic::{AtomicU64, AtomicUsize, Ordering},
};

/// Counters for a priority router. Readable from any thread without taking a queue lock.
#[derive(Debug)]
pub struct RouterStats {
    /// Total packets routed, across all queues
    routed: AtomicU64,
    /// Total packets dequeued, across all queues
    dequeued: AtomicU64,
    /// Current depth of each queue
    depths: Box<[AtomicUsize]>,
}

impl RouterStats {
    pub(crate) fn new(num_queues: usize) -> Self {
        Self {
            routed: AtomicU64::new(0),
            dequeued: AtomicU64::new(0),
            depths: (0..num_queues).map(|_| AtomicUsize::new(0)).collect(),
        }
    }

    #[inline]
    pub(crate) fn record_routed(&self, queue: usize) {
        self.depths[queue].fetch_add(1, Ordering::Relaxed);
        self.routed.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_dequeued(&self, queue: usize) {
        self.depths[queue].fetch_sub(1, Ordering::Relaxed);
        self.dequeued.fetch_add(1, Ordering::Relaxed);
    }

    /// Packets routed, across all queues.
    #[inline]
    pub fn routed(&self) -> u64 {
        self.routed.load(Ordering::Relaxed)
    }

    /// Packets dequeued, across all queues.
    #[inline]
    pub fn dequeued(&self) -> u64 {
        self.dequeued.load(Ordering::Relaxed)
    }

    /// Depth of `queue`, or `None` if there is no such queue.
    #[inline]
    pub fn depth(&self, queue: usize) -> Option<usize> {
        self.depths.get(queue).map(|depth| depth.load(Ordering::Relaxed))
    }

    /// Depth of every queue, by index.
    pub fn depths(&self) -> Vec<usize> {
        self.depths.iter().map(|depth| depth.load(Ordering::Relaxed)).collect()
    }
}

/// Point-in-time view of a router, for reporting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouterSnapshot {
    /// Packets routed, across all queues.
    pub routed: u64,
    /// Packets dequeued, across all queues.
    pub dequeued: u64,
    /// Depth of each queue, by index.
    pub depths: Vec<usize>,
}

impl fmt::Display for RouterSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Router Stats:")?;
        writeln!(f, "  Total routed:   {}", self.routed)?;
        writeln!(f, "  Total dequeued: {}", self.dequeued)?;
        write!(f, "  Queue depths:  ")?;
        for (queue, depth) in self.depths.iter().enumerate() {
            write!(f, " [{queue}]={depth}")?;
        }
        Ok(())
    }
}
