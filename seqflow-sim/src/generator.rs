//! Seeded synthetic traffic.

use std::ops::RangeInclusive;

use bytes::Bytes;
use rand::{rngs::StdRng, Rng, SeedableRng};

use seqflow_packet::{Packet, Priority, PAYLOAD_MAX, PAYLOAD_MIN};

use crate::SimError;

/// The shape of generated traffic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrafficProfile {
    /// Destinations are drawn from `0..destinations`.
    pub destinations: u32,
    /// Source identifiers are drawn from this range.
    pub sources: RangeInclusive<u32>,
    /// Payload lengths are drawn from this range. Must fit the packet payload bounds.
    pub payload_len: RangeInclusive<usize>,
    /// Byte every payload is filled with.
    pub fill: u8,
}

impl Default for TrafficProfile {
    fn default() -> Self {
        Self {
            destinations: 8,
            sources: 1..=100,
            payload_len: PAYLOAD_MIN..=PAYLOAD_MAX,
            fill: 0xAB,
        }
    }
}

impl TrafficProfile {
    /// Checks the ranges are non-empty and payloads fit a packet.
    pub fn validate(&self) -> Result<(), SimError> {
        if self.destinations == 0 || self.sources.is_empty() || self.payload_len.is_empty() {
            return Err(SimError::EmptyRange);
        }

        if *self.payload_len.start() < PAYLOAD_MIN || *self.payload_len.end() > PAYLOAD_MAX {
            return Err(SimError::PayloadRange(self.payload_len.clone()));
        }

        Ok(())
    }
}

/// Generates packets with random traffic class, source, destination and size.
///
/// The same seed always produces the same traffic.
#[derive(Debug)]
pub struct TrafficGenerator {
    rng: StdRng,
    profile: TrafficProfile,
}

impl TrafficGenerator {
    /// Creates a new generator. Fails if the profile is invalid.
    pub fn new(seed: u64, profile: TrafficProfile) -> Result<Self, SimError> {
        profile.validate()?;

        Ok(Self { rng: StdRng::seed_from_u64(seed), profile })
    }

    /// Generates the packet with sequence number `seq`.
    pub fn packet(&mut self, seq: u64) -> Result<Packet, SimError> {
        let priority = Priority::try_from(self.rng.gen_range(0..=3u8))?;
        let source = self.rng.gen_range(self.profile.sources.clone());
        let destination = self.rng.gen_range(0..self.profile.destinations);
        let len = self.rng.gen_range(self.profile.payload_len.clone());

        let payload = Bytes::from(vec![self.profile.fill; len]);

        Ok(Packet::new(seq, priority, source, destination, payload)?)
    }

    /// Generates `count` packets with consecutive sequence numbers starting at `start_seq`.
    pub fn batch(&mut self, start_seq: u64, count: usize) -> Result<Vec<Packet>, SimError> {
        (start_seq..).take(count).map(|seq| self.packet(seq)).collect()
    }

    /// The generator's random source, for feeding a [`LinkImpairment`](crate::LinkImpairment)
    /// from the same seed.
    pub fn rng(&mut self) -> &mut StdRng {
        &mut self.rng
    }

    /// The traffic profile in use.
    pub const fn profile(&self) -> &TrafficProfile {
        &self.profile
    }
}
