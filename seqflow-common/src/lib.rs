//! Common functions and types for the seqflow crates.

mod backoff;
pub use backoff::{Backoff, ExponentialBackoff};

/// Names given to the threads seqflow spawns. Shown by debuggers and `tracing` output.
pub mod thread_names {
    /// Drains the fast-path exchange into the reordering buffer.
    pub const INGEST: &str = "seqflow-ingest";
    /// Moves released packets from the reordering buffer into the router.
    pub const DISPATCH: &str = "seqflow-dispatch";
}
