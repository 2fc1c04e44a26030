//! The threads that wire the stages together:
//!
//! ```text
//! Producer ──exchange──▶ Ingest ──insert──▶ ReorderBuffer ──next_release──▶ Dispatcher ──route──▶ PriorityRouter
//! ```
//!
//! [`Pipeline`] builds all of it at once. [`Ingest`] and [`Dispatcher`] can also be spawned on
//! their own around buffers and routers owned elsewhere.

use std::{fmt, io, sync::Arc, time::Duration};

use thiserror::Error;
use tracing::{debug, info};

use seqflow_common::ExponentialBackoff;
use seqflow_packet::Packet;

use crate::{
    exchange::{self, ExchangeError, Producer},
    reorder::{ReorderBuffer, ReorderOptions, ReorderSnapshot},
    router::{PriorityRouter, RouterError, RouterOptions, RouterSnapshot},
};

mod dispatch;
pub use dispatch::{DispatchSummary, Dispatcher};

mod ingest;
pub use ingest::Ingest;

/// Default number of slots in the fast-path exchange.
const DEFAULT_EXCHANGE_CAPACITY: usize = 1024;

/// Errors returned while building or stopping a [`Pipeline`].
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The exchange options were rejected.
    #[error("Exchange error: {0}")]
    Exchange(#[from] ExchangeError),
    /// The router options were rejected.
    #[error("Router error: {0}")]
    Router(#[from] RouterError),
    /// The OS refused to start a thread.
    #[error("Failed to spawn pipeline thread: {0}")]
    Spawn(#[from] io::Error),
    /// A worker thread panicked. Holds its name.
    #[error("Pipeline thread {0} panicked")]
    ThreadPanicked(&'static str),
}

/// Options for a [`Pipeline`].
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Options for the reordering stage.
    pub reorder: ReorderOptions,
    /// Options for the output stage.
    pub router: RouterOptions,
    /// Slots in the fast-path exchange. Must be a power of two.
    pub exchange_capacity: usize,
    /// How the ingest thread waits while the exchange is empty.
    pub idle_backoff: ExponentialBackoff,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            reorder: ReorderOptions::default(),
            router: RouterOptions::default(),
            exchange_capacity: DEFAULT_EXCHANGE_CAPACITY,
            idle_backoff: ExponentialBackoff::new(
                Duration::from_micros(1),
                Duration::from_millis(1),
                None,
            ),
        }
    }
}

impl PipelineOptions {
    /// Sets the reordering buffer options.
    pub fn reorder(mut self, reorder: ReorderOptions) -> Self {
        self.reorder = reorder;
        self
    }

    /// Sets the router options.
    pub fn router(mut self, router: RouterOptions) -> Self {
        self.router = router;
        self
    }

    /// Sets the number of slots in the fast-path exchange.
    pub fn exchange_capacity(mut self, capacity: usize) -> Self {
        self.exchange_capacity = capacity;
        self
    }

    /// Sets the backoff the ingest thread uses while the exchange is empty.
    pub fn idle_backoff(mut self, backoff: ExponentialBackoff) -> Self {
        self.idle_backoff = backoff;
        self
    }
}

/// Final numbers of a pipeline, returned by [`Pipeline::shutdown`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineReport {
    /// Packets moved from the exchange into the reordering buffer.
    pub ingested: u64,
    /// What the dispatcher thread did.
    pub dispatch: DispatchSummary,
    /// Final state of the reordering buffer.
    pub reorder: ReorderSnapshot,
    /// Final state of the router.
    pub router: RouterSnapshot,
}

impl fmt::Display for PipelineReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Ingested: {}", self.ingested)?;
        writeln!(f, "{}", self.reorder)?;
        write!(f, "{}", self.router)
    }
}

#[derive(Debug)]
struct Workers {
    ingest: Ingest,
    dispatcher: Dispatcher,
}

/// A running exchange → reorder → router pipeline.
///
/// Packets go in through the [`Producer`] returned by [`Pipeline::new`] and come out of
/// [`Pipeline::router`], one queue per destination.
#[derive(Debug)]
pub struct Pipeline {
    reorder: Arc<ReorderBuffer>,
    router: Arc<PriorityRouter>,
    workers: Option<Workers>,
}

impl Pipeline {
    /// Builds the stages and spawns the ingest and dispatcher threads.
    pub fn new(options: PipelineOptions) -> Result<(Producer<Packet>, Self), PipelineError> {
        let (producer, consumer) = exchange::channel(options.exchange_capacity)?;
        let reorder = Arc::new(ReorderBuffer::new(options.reorder));
        let router = Arc::new(PriorityRouter::new(options.router)?);

        let ingest = Ingest::spawn(consumer, Arc::clone(&reorder), options.idle_backoff)?;
        let dispatcher = match Dispatcher::spawn(Arc::clone(&reorder), Arc::clone(&router)) {
            Ok(dispatcher) => dispatcher,
            Err(e) => {
                ingest.stop();
                return Err(e.into());
            }
        };

        info!(
            exchange_capacity = options.exchange_capacity,
            num_queues = router.num_queues(),
            timeout = ?reorder.options().timeout,
            "Pipeline started"
        );

        Ok((producer, Self { reorder, router, workers: Some(Workers { ingest, dispatcher }) }))
    }

    /// The reordering stage. Packets can also be inserted here directly, bypassing the exchange.
    #[inline]
    pub fn reorder(&self) -> &Arc<ReorderBuffer> {
        &self.reorder
    }

    /// The output stage. Consumers drain it per queue.
    #[inline]
    pub fn router(&self) -> &Arc<PriorityRouter> {
        &self.router
    }

    /// Stops ingesting once the exchange is empty, lets the dispatcher drain every packet that
    /// can still be released, and joins both threads.
    ///
    /// Routed packets stay in the router and can be dequeued afterwards.
    pub fn shutdown(mut self) -> Result<PipelineReport, PipelineError> {
        let (ingested, dispatch) = match self.workers.take() {
            Some(Workers { ingest, dispatcher }) => {
                ingest.stop();
                let ingested = ingest.join();

                // Shut down even if ingest panicked, so the dispatcher is not left waiting.
                self.reorder.shutdown();
                (ingested?, dispatcher.join()?)
            }
            None => (0, DispatchSummary::default()),
        };

        let report = PipelineReport {
            ingested,
            dispatch,
            reorder: self.reorder.snapshot(),
            router: self.router.snapshot(),
        };

        debug!(ingested = report.ingested, routed = report.dispatch.routed, "Pipeline shut down");
        Ok(report)
    }
}

impl Drop for Pipeline {
    fn drop(&mut self) {
        // Dropped without `shutdown`: signal the threads so they exit on their own.
        if let Some(workers) = &self.workers {
            workers.ingest.stop();
            self.reorder.shutdown();
        }
    }
}
