//! Packet ingestion, sequencing and priority dispatch.
//!
//! - [`exchange`]: wait-free single-producer / single-consumer hand-off, ahead of sequencing.
//! - [`reorder`]: turns arbitrary arrival order back into sequence order, skipping packets
//!   that do not show up in time.
//! - [`router`]: fans the ordered stream out into per-destination queues ordered by traffic
//!   class.
//! - [`pipeline`]: the threads connecting the three.

pub mod exchange;
pub mod pipeline;
pub mod reorder;
pub mod router;

pub use exchange::{Consumer, ExchangeError, Producer};
pub use pipeline::{Pipeline, PipelineError, PipelineOptions, PipelineReport};
pub use reorder::{
    DuplicatePolicy, Insert, LatePolicy, Release, ReorderBuffer, ReorderOptions, ReorderSnapshot,
};
pub use router::{PriorityRouter, RouterError, RouterOptions, RouterSnapshot};
