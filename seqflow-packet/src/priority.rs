use std::{cmp::Ordering, fmt};

use crate::PacketError;

/// Traffic class of a packet. Governs dispatch order inside a router queue.
///
/// The order is total and fixed: `Control > RealTime > Streaming > Bulk`. All comparisons go
/// through [`Priority::rank`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Priority {
    /// Link control plane. Always dispatched first.
    Control,
    /// Latency-sensitive traffic such as voice or gaming.
    RealTime,
    /// Audio and video streams.
    Streaming,
    /// Best effort: downloads, updates.
    Bulk,
}

impl Priority {
    /// All traffic classes, highest first.
    pub const ALL: [Self; 4] = [Self::Control, Self::RealTime, Self::Streaming, Self::Bulk];

    /// Dispatch rank. Higher ranks are dequeued first.
    #[inline]
    pub const fn rank(self) -> u8 {
        match self {
            Self::Control => 3,
            Self::RealTime => 2,
            Self::Streaming => 1,
            Self::Bulk => 0,
        }
    }

    /// The on-link code of the class. This is an identifier, not an ordering.
    #[inline]
    pub const fn code(self) -> u8 {
        match self {
            Self::RealTime => 0,
            Self::Streaming => 1,
            Self::Bulk => 2,
            Self::Control => 3,
        }
    }

    /// Short lowercase name, used in logs and stats output.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Control => "control",
            Self::RealTime => "real-time",
            Self::Streaming => "streaming",
            Self::Bulk => "bulk",
        }
    }
}

impl Ord for Priority {
    fn cmp(&self, other: &Self) -> Ordering {
        self.rank().cmp(&other.rank())
    }
}

impl PartialOrd for Priority {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl TryFrom<u8> for Priority {
    type Error = PacketError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Self::RealTime),
            1 => Ok(Self::Streaming),
            2 => Ok(Self::Bulk),
            3 => Ok(Self::Control),
            other => Err(PacketError::UnknownPriority(other)),
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
