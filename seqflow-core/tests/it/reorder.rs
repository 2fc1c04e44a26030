use std::{
    collections::HashSet,
    sync::Arc,
    thread,
    time::{Duration, Instant},
};

use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

use seqflow_core::{Release, ReorderBuffer, ReorderOptions};

use crate::common::bulk;

#[test]
fn arrival_order_two_zero_one() {
    let _ = tracing_subscriber::fmt::try_init();

    let buffer = ReorderBuffer::new(ReorderOptions::default().timeout(Duration::from_secs(5)));
    for seq in [2, 0, 1] {
        let _ = buffer.insert(bulk(seq));
    }

    let released: Vec<_> = (0..3).map(|_| buffer.get_next().unwrap().seq()).collect();
    assert_eq!(released, vec![0, 1, 2]);
}

#[test]
fn lost_packet_times_out_into_a_gap() {
    let _ = tracing_subscriber::fmt::try_init();

    let buffer = ReorderBuffer::new(ReorderOptions::default().timeout(Duration::from_millis(10)));
    let _ = buffer.insert(bulk(0));
    assert_eq!(buffer.get_next().unwrap().seq(), 0);

    assert!(buffer.get_next().is_none());
    assert_eq!(buffer.stats().gaps(), 1);
    assert_eq!(buffer.next_expected_seq(), 2);
}

#[test]
fn shuffled_inserts_release_in_order_exactly_once() {
    let _ = tracing_subscriber::fmt::try_init();
    let mut rng = StdRng::seed_from_u64(0xC0FFEE);

    for round in 0..20 {
        let mut seqs: Vec<u64> = (0..500).collect();
        seqs.shuffle(&mut rng);

        let buffer =
            ReorderBuffer::new(ReorderOptions::default().timeout(Duration::from_secs(5)));
        for &seq in &seqs {
            let _ = buffer.insert(bulk(seq));
        }

        for expected in 0..500 {
            let packet = buffer.get_next().unwrap_or_else(|| panic!("round {round}: missing"));
            assert_eq!(packet.seq(), expected);
        }
        assert_eq!(buffer.pending_len(), 0);
        assert_eq!(buffer.stats().gaps(), 0);
    }
}

#[test]
fn concurrent_producers_single_consumer() {
    let _ = tracing_subscriber::fmt::try_init();
    const PRODUCERS: u64 = 4;
    const PER_PRODUCER: u64 = 2_500;
    const TOTAL: u64 = PRODUCERS * PER_PRODUCER;

    let buffer = Arc::new(ReorderBuffer::new(
        ReorderOptions::default().timeout(Duration::from_secs(5)),
    ));

    // Each producer owns an interleaved slice of the sequence space and sends it in reverse
    // blocks, so arrivals are heavily out of order.
    let producers: Vec<_> = (0..PRODUCERS)
        .map(|p| {
            let buffer = Arc::clone(&buffer);
            thread::spawn(move || {
                let mut seqs: Vec<u64> = (0..TOTAL).filter(|seq| seq % PRODUCERS == p).collect();
                for block in seqs.chunks_mut(16) {
                    block.reverse();
                }
                for seq in seqs {
                    let _ = buffer.insert(bulk(seq));
                }
            })
        })
        .collect();

    let mut seen = HashSet::new();
    let mut last = None;
    while (seen.len() as u64) < TOTAL {
        match buffer.next_release() {
            Release::Packet(packet) => {
                assert!(seen.insert(packet.seq()), "released twice: {}", packet.seq());
                if let Some(last) = last {
                    assert!(packet.seq() > last);
                }
                last = Some(packet.seq());
            }
            other => panic!("unexpected release: {other:?}"),
        }
    }

    for producer in producers {
        producer.join().unwrap();
    }

    assert_eq!(buffer.stats().received(), TOTAL);
    assert_eq!(buffer.stats().released(), TOTAL);
    assert_eq!(buffer.stats().gaps(), 0);
}

#[test]
fn lossy_stream_drains_after_shutdown() {
    let _ = tracing_subscriber::fmt::try_init();

    let buffer = ReorderBuffer::new(ReorderOptions::default().timeout(Duration::from_secs(30)));

    // Every seventh packet is lost.
    for seq in (0..700).filter(|seq| seq % 7 != 3) {
        let _ = buffer.insert(bulk(seq));
    }
    buffer.shutdown();

    let started = Instant::now();
    let mut released = Vec::new();
    loop {
        match buffer.next_release() {
            Release::Packet(packet) => released.push(packet.seq()),
            Release::Gap { .. } => {}
            Release::Closed => break,
        }
    }

    // Gaps are skipped without waiting once shut down.
    assert!(started.elapsed() < Duration::from_secs(30));
    assert!(released.windows(2).all(|w| w[0] < w[1]));
    assert_eq!(released.len(), 600);
    assert_eq!(buffer.stats().gaps(), 100);
    assert_eq!(buffer.next_expected_seq(), 700);
}

#[test]
fn shutdown_releases_every_blocked_consumer() {
    let _ = tracing_subscriber::fmt::try_init();

    let buffer = Arc::new(ReorderBuffer::new(
        ReorderOptions::default().timeout(Duration::from_secs(30)),
    ));

    let consumers: Vec<_> = (0..4)
        .map(|_| {
            let buffer = Arc::clone(&buffer);
            thread::spawn(move || buffer.next_release().is_closed())
        })
        .collect();

    thread::sleep(Duration::from_millis(50));
    buffer.shutdown();

    for consumer in consumers {
        assert!(consumer.join().unwrap());
    }
}
