use std::{
    thread,
    time::{Duration, Instant},
};

use bytes::Bytes;

use seqflow::{exchange, ExponentialBackoff, Packet, Priority};

const NUM_PACKETS: u64 = 1_000_000;
const CAPACITY: usize = 4096;

fn main() {
    let _ = tracing_subscriber::fmt::try_init();

    let (mut tx, mut rx) = exchange::channel::<Packet>(CAPACITY).unwrap();
    let payload = Bytes::from(vec![0xAB; 64]);

    let start = Instant::now();

    // Producer side: the NIC-facing thread.
    let producer = thread::spawn(move || {
        let mut backoff = ExponentialBackoff::new(Duration::ZERO, Duration::from_micros(50), None);
        let mut full = 0u64;

        for seq in 0..NUM_PACKETS {
            let mut packet = Packet::new(seq, Priority::RealTime, 1, 0, payload.clone()).unwrap();
            while let Err(back) = tx.push(packet) {
                packet = back;
                full += 1;
                backoff.snooze();
            }
            backoff.reset();
        }

        full
    });

    // Consumer side: checks ordering and measures end-to-end latency.
    let mut next = 0;
    let mut total_age = Duration::ZERO;
    let mut backoff = ExponentialBackoff::new(Duration::ZERO, Duration::from_micros(50), None);
    loop {
        match rx.pop() {
            Some(packet) => {
                assert_eq!(packet.seq(), next, "exchange reordered packets");
                total_age += packet.age();
                next += 1;
                backoff.reset();
            }
            None if rx.is_closed() && rx.is_empty() => break,
            None => {
                backoff.snooze();
            }
        }
    }

    let full = producer.join().unwrap();
    let elapsed = start.elapsed();

    println!("Moved {next} packets through a {CAPACITY}-slot exchange in {elapsed:?}");
    println!("Throughput: {:.2} Mpps", next as f64 / elapsed.as_secs_f64() / 1e6);
    println!("Mean time in exchange: {:?}", total_age / next as u32);
    println!("Producer found the exchange full {full} times");
}
