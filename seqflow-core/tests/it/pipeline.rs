use std::{
    collections::HashSet,
    sync::{mpsc, Arc},
    thread,
    time::{Duration, Instant},
};

use rand::{rngs::StdRng, SeedableRng};

use seqflow_common::ExponentialBackoff;
use seqflow_core::{
    exchange,
    pipeline::{Dispatcher, Ingest},
    Pipeline, PipelineOptions, PriorityRouter, Producer, ReorderBuffer, ReorderOptions,
    RouterOptions,
};
use seqflow_packet::Packet;
use seqflow_sim::{LinkImpairment, TrafficGenerator, TrafficProfile};

use crate::common::bulk;

fn push_all(producer: &mut Producer<Packet>, packets: Vec<Packet>) {
    let mut backoff = ExponentialBackoff::default();
    for mut packet in packets {
        while let Err(back) = producer.push(packet) {
            packet = back;
            backoff.snooze();
        }
        backoff.reset();
    }
}

#[test]
fn perfect_link_routes_everything() {
    let _ = tracing_subscriber::fmt::try_init();
    const N: usize = 5_000;

    let options = PipelineOptions::default()
        .reorder(ReorderOptions::default().timeout(Duration::from_secs(5)))
        .router(RouterOptions::default().num_queues(4))
        .exchange_capacity(64);
    let (mut producer, pipeline) = Pipeline::new(options).unwrap();

    let mut generator = TrafficGenerator::new(11, TrafficProfile::default()).unwrap();
    push_all(&mut producer, generator.batch(0, N).unwrap());
    drop(producer);

    let router = pipeline.router().clone();
    let report = pipeline.shutdown().unwrap();

    assert_eq!(report.ingested, N as u64);
    assert_eq!(report.dispatch.routed, N as u64);
    assert_eq!(report.dispatch.empty_gaps, 0);
    assert_eq!(report.reorder.gaps, 0);
    assert_eq!(report.reorder.next_expected_seq, N as u64);
    assert_eq!(report.router.depths.iter().sum::<usize>(), N);

    let mut seen = HashSet::new();
    for queue in 0..router.num_queues() {
        let drained = router.drain(queue).unwrap();
        for pair in drained.windows(2) {
            let (a, b) = (&pair[0], &pair[1]);
            assert!(
                a.priority() > b.priority() ||
                    (a.priority() == b.priority() && a.seq() < b.seq())
            );
        }
        for packet in drained {
            assert_eq!(router.queue_for(packet.destination()), queue);
            assert!(seen.insert(packet.seq()));
        }
    }
    assert_eq!(seen.len(), N);
}

#[test]
fn impaired_link_accounts_for_every_arrival() {
    let _ = tracing_subscriber::fmt::try_init();
    const N: usize = 2_000;

    let options = PipelineOptions::default()
        .reorder(ReorderOptions::default().timeout(Duration::from_millis(20)));
    let (mut producer, pipeline) = Pipeline::new(options).unwrap();

    let mut generator = TrafficGenerator::new(7, TrafficProfile::default()).unwrap();
    let batch = generator.batch(0, N).unwrap();
    let mut rng = StdRng::seed_from_u64(7);
    let impaired = LinkImpairment::default().apply(batch, &mut rng).unwrap();
    let arrivals = impaired.arrivals.len() as u64;

    push_all(&mut producer, impaired.arrivals);
    drop(producer);

    let router = pipeline.router().clone();
    let report = pipeline.shutdown().unwrap();

    assert_eq!(report.ingested, arrivals);
    assert_eq!(report.reorder.received, arrivals);
    assert_eq!(report.reorder.duplicates, 0);
    assert_eq!(report.dispatch.routed, report.reorder.released);
    assert_eq!(report.router.routed, report.reorder.released);

    // Every arrival is either released in order or left behind as an orphan.
    assert_eq!(report.reorder.released + report.reorder.orphaned as u64, arrivals);
    let skipped = impaired
        .dropped
        .iter()
        .filter(|&&seq| seq < report.reorder.next_expected_seq)
        .count();
    assert!(report.reorder.gaps >= skipped as u64);

    let mut routed = 0;
    for queue in 0..router.num_queues() {
        let drained = router.drain(queue).unwrap();
        assert!(drained.iter().all(|p| !impaired.dropped.contains(&p.seq())));
        routed += drained.len() as u64;
    }
    assert_eq!(routed, report.dispatch.routed);
    assert_eq!(router.total_dequeued(), routed);
}

/// Polls `done` until it holds or `within` elapses.
fn eventually(within: Duration, mut done: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + within;
    while Instant::now() < deadline {
        if done() {
            return true;
        }
        thread::sleep(Duration::from_millis(5));
    }
    done()
}

#[test]
fn dropping_without_shutdown_stops_the_threads() {
    let _ = tracing_subscriber::fmt::try_init();

    let (mut producer, pipeline) = Pipeline::new(PipelineOptions::default()).unwrap();
    let mut generator = TrafficGenerator::new(3, TrafficProfile::default()).unwrap();
    push_all(&mut producer, generator.batch(0, 10).unwrap());

    let reorder = Arc::clone(pipeline.reorder());
    let router = Arc::clone(pipeline.router());

    // The producer stays alive; the pipeline must still wind down on drop.
    drop(pipeline);
    assert!(reorder.is_shutdown());

    // Each worker thread holds a clone of these; they are released when the threads exit.
    assert!(eventually(Duration::from_secs(5), || {
        Arc::strong_count(&reorder) == 1 && Arc::strong_count(&router) == 1
    }));
    assert!(reorder.is_closed());
    drop(producer);
}

#[test]
fn stopped_workers_exit_while_the_producer_lives() {
    let _ = tracing_subscriber::fmt::try_init();

    let (mut producer, consumer) = exchange::channel(64).unwrap();
    let reorder = Arc::new(ReorderBuffer::new(ReorderOptions::default()));
    let router = Arc::new(PriorityRouter::new(RouterOptions::default()).unwrap());

    let ingest =
        Ingest::spawn(consumer, Arc::clone(&reorder), ExponentialBackoff::default()).unwrap();
    let dispatcher = Dispatcher::spawn(Arc::clone(&reorder), Arc::clone(&router)).unwrap();

    push_all(&mut producer, (0..10).map(bulk).collect());
    assert!(!ingest.is_finished());

    ingest.stop();
    assert!(eventually(Duration::from_secs(5), || ingest.is_finished()));
    assert_eq!(ingest.join().unwrap(), 10);

    assert!(!dispatcher.is_finished());
    reorder.shutdown();
    assert!(eventually(Duration::from_secs(5), || dispatcher.is_finished()));

    let summary = dispatcher.join().unwrap();
    assert_eq!(summary.routed, 10);
    assert_eq!(router.total_routed(), 10);
    drop(producer);
}

#[test]
fn shutdown_returns_despite_a_far_ahead_sequence_number() {
    let _ = tracing_subscriber::fmt::try_init();
    const FAR: u64 = 1 << 40;

    let (mut producer, pipeline) = Pipeline::new(PipelineOptions::default()).unwrap();
    push_all(&mut producer, vec![bulk(0), bulk(FAR)]);
    drop(producer);

    let (done_tx, done_rx) = mpsc::channel();
    thread::spawn(move || {
        let _ = done_tx.send(pipeline.shutdown());
    });

    let report = done_rx
        .recv_timeout(Duration::from_secs(10))
        .expect("shutdown did not return")
        .unwrap();

    assert_eq!(report.dispatch.routed, 2);
    assert_eq!(report.reorder.released, 2);
    assert_eq!(report.reorder.gaps, FAR - 1);
    assert_eq!(report.reorder.next_expected_seq, FAR + 1);
}

#[test]
fn invalid_options_are_rejected() {
    let bad_exchange = PipelineOptions::default().exchange_capacity(100);
    assert!(Pipeline::new(bad_exchange).is_err());

    let no_queues = PipelineOptions::default().router(RouterOptions::default().num_queues(0));
    assert!(Pipeline::new(no_queues).is_err());
}
