use std::time::{Duration, Instant};

use bytes::Bytes;

use crate::{PacketError, Priority, PAYLOAD_MAX, PAYLOAD_MIN};

/// A link-layer frame travelling through the pipeline.
///
/// A packet is immutable once built. Stages hand it on by value, so exactly one stage owns it
/// at any time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    /// Position of the packet in its origin stream.
    seq: u64,
    /// Traffic class.
    priority: Priority,
    /// Origin identifier (e.g. the satellite the frame came down from).
    source: u32,
    /// Destination identifier. Selects the router queue.
    destination: u32,
    /// Monotonic clock reading taken when the packet was built.
    arrival: Instant,
    /// The opaque frame body.
    payload: Bytes,
}

impl Packet {
    /// Creates a new packet stamped with the current instant.
    ///
    /// Fails if the payload is outside of `PAYLOAD_MIN..=PAYLOAD_MAX`.
    pub fn new(
        seq: u64,
        priority: Priority,
        source: u32,
        destination: u32,
        payload: Bytes,
    ) -> Result<Self, PacketError> {
        Self::with_arrival(seq, priority, source, destination, payload, Instant::now())
    }

    /// Creates a new packet with an explicit arrival stamp.
    pub fn with_arrival(
        seq: u64,
        priority: Priority,
        source: u32,
        destination: u32,
        payload: Bytes,
        arrival: Instant,
    ) -> Result<Self, PacketError> {
        if !(PAYLOAD_MIN..=PAYLOAD_MAX).contains(&payload.len()) {
            return Err(PacketError::PayloadSize { len: payload.len() });
        }

        Ok(Self { seq, priority, source, destination, arrival, payload })
    }

    /// Position in the origin stream.
    #[inline]
    pub const fn seq(&self) -> u64 {
        self.seq
    }

    /// Traffic class.
    #[inline]
    pub const fn priority(&self) -> Priority {
        self.priority
    }

    /// Origin identifier.
    #[inline]
    pub const fn source(&self) -> u32 {
        self.source
    }

    /// Destination identifier.
    #[inline]
    pub const fn destination(&self) -> u32 {
        self.destination
    }

    /// When the packet was stamped.
    #[inline]
    pub const fn arrival(&self) -> Instant {
        self.arrival
    }

    /// Time elapsed since the packet was stamped.
    #[inline]
    pub fn age(&self) -> Duration {
        self.arrival.elapsed()
    }

    /// The frame body.
    #[inline]
    pub const fn payload(&self) -> &Bytes {
        &self.payload
    }

    /// Payload length in bytes.
    #[inline]
    pub fn len(&self) -> usize {
        self.payload.len()
    }

    /// Always `false`: payloads are at least [`PAYLOAD_MIN`] bytes.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }

    /// Consumes the packet, returning its payload.
    #[inline]
    pub fn into_payload(self) -> Bytes {
        self.payload
    }
}
