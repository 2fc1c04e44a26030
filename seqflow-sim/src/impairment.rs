//! Link impairment: how a lossy, multipath link mangles an ordered packet stream.

use rand::Rng;
use tracing::debug;

use seqflow_packet::Packet;

use crate::SimError;

/// Configuration for the damage a simulated link does to the packets crossing it.
///
/// # Example
///
/// ```
/// use seqflow_sim::LinkImpairment;
///
/// // A satellite downlink: some loss, heavy reordering across paths.
/// let downlink =
///     LinkImpairment { loss: 2.0, reorder: 15.0, reorder_window: 10, ..Default::default() };
/// assert!(downlink.validate().is_ok());
///
/// // A link that occasionally delivers twice.
/// let flaky = LinkImpairment { duplicate: 0.5, ..LinkImpairment::none() };
/// assert!(flaky.validate().is_ok());
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinkImpairment {
    /// Packet loss percentage (0.0 to 100.0).
    ///
    /// Packets are randomly dropped with this probability. A value of 2.0 means approximately
    /// 2% of packets never arrive.
    pub loss: f64,

    /// Reordering percentage (0.0 to 100.0).
    ///
    /// With this probability a packet trades places with one of the next `reorder_window`
    /// packets, as happens when consecutive frames take paths of different length.
    pub reorder: f64,

    /// How far ahead a reordered packet may be swapped, in packets. At least 1 when
    /// `reorder` is non-zero.
    pub reorder_window: usize,

    /// Packet duplication percentage (0.0 to 100.0).
    ///
    /// Packets are randomly delivered twice with this probability.
    pub duplicate: f64,
}

impl Default for LinkImpairment {
    fn default() -> Self {
        Self { loss: 2.0, reorder: 15.0, reorder_window: 10, duplicate: 0.0 }
    }
}

/// The outcome of pushing a batch through an impaired link.
#[derive(Debug, Default)]
pub struct Impaired {
    /// Packets in the order they come out of the link.
    pub arrivals: Vec<Packet>,
    /// Sequence numbers that never came out.
    pub dropped: Vec<u64>,
    /// Number of extra copies in `arrivals`.
    pub duplicated: usize,
}

impl LinkImpairment {
    /// A perfect link.
    pub const fn none() -> Self {
        Self { loss: 0.0, reorder: 0.0, reorder_window: 0, duplicate: 0.0 }
    }

    /// Checks every percentage is within 0..=100 and the window fits the reorder setting.
    pub fn validate(&self) -> Result<(), SimError> {
        for (name, value) in
            [("loss", self.loss), ("reorder", self.reorder), ("duplicate", self.duplicate)]
        {
            if !(0.0..=100.0).contains(&value) {
                return Err(SimError::InvalidPercentage { name, value });
            }
        }

        if self.reorder > 0.0 && self.reorder_window == 0 {
            return Err(SimError::InvalidWindow);
        }

        Ok(())
    }

    /// Sends `batch` across the link.
    ///
    /// Walks the batch in order: each packet is dropped with probability `loss`; otherwise,
    /// with probability `reorder`, it first trades places with a packet up to `reorder_window`
    /// positions ahead, and whatever then sits in its slot is delivered (twice with probability
    /// `duplicate`).
    pub fn apply<R: Rng + ?Sized>(
        &self,
        batch: Vec<Packet>,
        rng: &mut R,
    ) -> Result<Impaired, SimError> {
        self.validate()?;

        let mut slots: Vec<Option<Packet>> = batch.into_iter().map(Some).collect();
        let len = slots.len();
        let mut out = Impaired { arrivals: Vec::with_capacity(len), ..Default::default() };

        for i in 0..len {
            if chance(rng, self.loss) {
                if let Some(packet) = slots[i].take() {
                    out.dropped.push(packet.seq());
                }
                continue;
            }

            if i + 1 < len && chance(rng, self.reorder) {
                let offset = rng.gen_range(1..=self.reorder_window).min(len - i - 1);
                slots.swap(i, i + offset);
            }

            let Some(packet) = slots[i].take() else { continue };

            if chance(rng, self.duplicate) {
                out.arrivals.push(packet.clone());
                out.duplicated += 1;
            }
            out.arrivals.push(packet);
        }

        debug!(
            sent = len,
            delivered = out.arrivals.len(),
            dropped = out.dropped.len(),
            duplicated = out.duplicated,
            "Applied link impairment"
        );

        Ok(out)
    }
}

/// Returns `true` with probability `percent` / 100.
fn chance<R: Rng + ?Sized>(rng: &mut R, percent: f64) -> bool {
    percent > 0.0 && rng.gen_bool((percent / 100.0).min(1.0))
}
