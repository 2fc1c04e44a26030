use std::{
    io,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread::{self, JoinHandle},
};

use tracing::{debug, trace};

use seqflow_common::{thread_names, ExponentialBackoff};
use seqflow_packet::Packet;

use super::PipelineError;
use crate::{exchange::Consumer, reorder::ReorderBuffer};

/// Drains the consumer side of a fast-path exchange into a reordering buffer.
///
/// Backs off while the exchange is empty. Exits once the producer is dropped or
/// [`Ingest::stop`] is called, after moving everything still in the ring. Returns the number of
/// packets moved.
#[derive(Debug)]
pub struct Ingest {
    handle: JoinHandle<u64>,
    stop: Arc<AtomicBool>,
}

impl Ingest {
    /// Spawns the ingest thread.
    pub fn spawn(
        consumer: Consumer<Packet>,
        reorder: Arc<ReorderBuffer>,
        backoff: ExponentialBackoff,
    ) -> Result<Self, io::Error> {
        let stop = Arc::new(AtomicBool::new(false));
        let handle = {
            let stop = Arc::clone(&stop);
            thread::Builder::new()
                .name(thread_names::INGEST.to_string())
                .spawn(move || ingest(consumer, &reorder, &stop, backoff))?
        };

        Ok(Self { handle, stop })
    }

    /// Asks the thread to exit once the ring is empty, even if the producer is still alive.
    pub fn stop(&self) {
        self.stop.store(true, Ordering::Release);
    }

    /// Returns `true` once the thread has exited.
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Waits for the thread to exit. It only does so after the producer is dropped or
    /// [`Ingest::stop`] is called.
    pub fn join(self) -> Result<u64, PipelineError> {
        self.handle.join().map_err(|_| PipelineError::ThreadPanicked(thread_names::INGEST))
    }
}

fn ingest(
    mut consumer: Consumer<Packet>,
    reorder: &ReorderBuffer,
    stop: &AtomicBool,
    mut backoff: ExponentialBackoff,
) -> u64 {
    let mut moved = 0;
    let mut not_stored = 0u64;

    loop {
        if let Some(packet) = consumer.pop() {
            not_stored += u64::from(!forward(reorder, packet));
            moved += 1;
            backoff.reset();
            continue;
        }

        // Checked after an empty pop, and the ring re-checked once more, so nothing pushed right
        // before the producer went away is left behind.
        if consumer.is_closed() || stop.load(Ordering::Acquire) {
            while let Some(packet) = consumer.pop() {
                not_stored += u64::from(!forward(reorder, packet));
                moved += 1;
            }
            break;
        }

        if !backoff.snooze() {
            backoff.reset();
        }
    }

    debug!(moved, not_stored, closed = consumer.is_closed(), "Ingest finished");
    moved
}

/// Inserts one packet into the reordering buffer. Returns `false` if the buffer dropped it.
fn forward(reorder: &ReorderBuffer, packet: Packet) -> bool {
    let seq = packet.seq();
    let outcome = reorder.insert(packet);
    if !outcome.is_stored() {
        trace!(seq, ?outcome, "Packet not stored");
    }

    outcome.is_stored()
}
