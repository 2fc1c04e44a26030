use std::{thread, time::Duration};

use rand::{rngs::StdRng, SeedableRng};
use tracing::info;

use seqflow::{
    sim::{LinkImpairment, TrafficGenerator, TrafficProfile},
    ExponentialBackoff, Pipeline, PipelineOptions, ReorderOptions, RouterOptions,
};

const NUM_PACKETS: usize = 100_000;
const NUM_OUTPUT_QUEUES: usize = 8;
const SEED: u64 = 42;

fn main() {
    let _ = tracing_subscriber::fmt::try_init();

    // Packets come down from a satellite link: some are lost, some overtake each other.
    let link = LinkImpairment { loss: 2.0, reorder: 15.0, reorder_window: 10, duplicate: 0.0 };

    let options = PipelineOptions::default()
        .reorder(ReorderOptions::default().timeout(Duration::from_millis(10)))
        .router(RouterOptions::default().num_queues(NUM_OUTPUT_QUEUES));
    let (mut producer, pipeline) = Pipeline::new(options).unwrap();

    let mut generator = TrafficGenerator::new(SEED, TrafficProfile::default()).unwrap();
    let batch = generator.batch(0, NUM_PACKETS).unwrap();
    let mut rng = StdRng::seed_from_u64(SEED);
    let impaired = link.apply(batch, &mut rng).unwrap();

    info!(
        sent = NUM_PACKETS,
        arriving = impaired.arrivals.len(),
        lost = impaired.dropped.len(),
        "Link simulated"
    );

    let mut backoff = ExponentialBackoff::default();
    for (i, mut packet) in impaired.arrivals.into_iter().enumerate() {
        while let Err(back) = producer.push(packet) {
            packet = back;
            backoff.snooze();
        }
        backoff.reset();

        // Arrival jitter
        if i % 1000 == 0 {
            thread::sleep(Duration::from_micros(100));
        }
    }
    drop(producer);

    let router = pipeline.router().clone();
    let report = pipeline.shutdown().unwrap();

    println!("\n=== Final Results ===");
    println!("{report}");
    println!("\nPackets processed: {}", router.total_routed());

    println!("\n=== Output Queues ===");
    for queue in 0..NUM_OUTPUT_QUEUES {
        let packets = router.drain(queue).unwrap();
        println!("Queue {queue}: {} packets", packets.len());
    }
}
