//! Packet and traffic-class types shared by the seqflow crates.

use thiserror::Error;

mod packet;
pub use packet::Packet;

mod priority;
pub use priority::Priority;

/// Smallest payload a packet may carry, in bytes.
pub const PAYLOAD_MIN: usize = 64;

/// Largest payload a packet may carry, in bytes. One Ethernet MTU.
pub const PAYLOAD_MAX: usize = 1500;

/// Errors returned when building a [`Packet`] or decoding a [`Priority`].
#[derive(Debug, Error)]
pub enum PacketError {
    /// The payload length is outside `PAYLOAD_MIN..=PAYLOAD_MAX`.
    #[error("Payload of {len} bytes is outside 64..=1500")]
    PayloadSize {
        /// The rejected length.
        len: usize,
    },
    /// A priority code with no traffic class.
    #[error("Unknown priority code: {0}")]
    UnknownPriority(u8),
}
