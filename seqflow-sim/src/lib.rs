//! Synthetic traffic for exercising the seqflow pipeline: a seeded packet generator and a
//! model of the loss, reordering and duplication a satellite link introduces.

use std::ops::RangeInclusive;

use thiserror::Error;

use seqflow_packet::PacketError;

pub mod generator;
pub use generator::{TrafficGenerator, TrafficProfile};

pub mod impairment;
pub use impairment::{Impaired, LinkImpairment};

/// Errors returned by the traffic generator and the link model.
#[derive(Debug, Error)]
pub enum SimError {
    /// A generated packet was invalid.
    #[error("Packet error: {0}")]
    Packet(#[from] PacketError),
    /// An impairment percentage outside 0..=100.
    #[error("{name} must be a percentage between 0 and 100, got {value}")]
    InvalidPercentage {
        /// The offending field.
        name: &'static str,
        /// The offending value.
        value: f64,
    },
    /// Reordering was enabled with a zero window.
    #[error("Reordering needs a window of at least 1")]
    InvalidWindow,
    /// A traffic profile range with nothing in it.
    #[error("Traffic profile has an empty range")]
    EmptyRange,
    /// A payload range that does not fit the packet bounds.
    #[error("Payload range {0:?} does not fit a packet")]
    PayloadRange(RangeInclusive<usize>),
}
