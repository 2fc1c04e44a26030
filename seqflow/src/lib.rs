//! Out-of-order packet ingestion, sequencing and priority dispatch.

#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

pub use seqflow_common::{thread_names, Backoff, ExponentialBackoff};
pub use seqflow_core::*;
pub use seqflow_packet::*;

/// Synthetic traffic and link impairment.
pub use seqflow_sim as sim;
