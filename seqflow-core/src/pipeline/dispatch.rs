use std::{
    io,
    sync::Arc,
    thread::{self, JoinHandle},
};

use tracing::{debug, trace};

use seqflow_common::thread_names;

use super::PipelineError;
use crate::{
    reorder::{Release, ReorderBuffer},
    router::PriorityRouter,
};

/// What a dispatcher did over its lifetime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchSummary {
    /// Packets moved into the router.
    pub routed: u64,
    /// Calls that ended on a skipped sequence number without a packet.
    pub empty_gaps: u64,
}

/// The consumer thread of a reordering buffer. It forwards every in-order release to the
/// router until the buffer reports [`Release::Closed`].
#[derive(Debug)]
pub struct Dispatcher {
    handle: JoinHandle<DispatchSummary>,
}

impl Dispatcher {
    /// Spawns the dispatcher thread.
    pub fn spawn(
        reorder: Arc<ReorderBuffer>,
        router: Arc<PriorityRouter>,
    ) -> Result<Self, io::Error> {
        let handle = thread::Builder::new()
            .name(thread_names::DISPATCH.to_string())
            .spawn(move || dispatch(&reorder, &router))?;

        Ok(Self { handle })
    }

    /// Returns `true` once the thread has exited.
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Waits for the thread to exit. It only does so after the buffer is shut down.
    pub fn join(self) -> Result<DispatchSummary, PipelineError> {
        self.handle.join().map_err(|_| PipelineError::ThreadPanicked(thread_names::DISPATCH))
    }
}

fn dispatch(reorder: &ReorderBuffer, router: &PriorityRouter) -> DispatchSummary {
    let mut summary = DispatchSummary::default();

    loop {
        match reorder.next_release() {
            Release::Packet(packet) => {
                router.route(packet);
                summary.routed += 1;
            }
            Release::Gap { seq } => {
                trace!(seq, "No packet after gap");
                summary.empty_gaps += 1;
            }
            Release::Closed => break,
        }
    }

    debug!(routed = summary.routed, empty_gaps = summary.empty_gaps, "Dispatcher finished");
    summary
}
