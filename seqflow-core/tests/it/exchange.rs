use std::thread;

use seqflow_common::ExponentialBackoff;
use seqflow_core::exchange;

use crate::common::bulk;

#[test]
fn capacity_eight_accepts_seven() {
    let (mut tx, mut rx) = exchange::channel(8).unwrap();

    let accepted = (0..10).filter(|&seq| tx.push(bulk(seq)).is_ok()).count();
    assert_eq!(accepted, 7);

    assert_eq!(rx.pop().unwrap().seq(), 0);
    assert!(tx.push(bulk(100)).is_ok());
    assert_eq!(tx.push(bulk(101)).unwrap_err().seq(), 101);
}

#[test]
fn full_push_hands_the_packet_back() {
    let (mut tx, _rx) = exchange::channel(2).unwrap();
    tx.push(bulk(0)).unwrap();

    let rejected = tx.push(bulk(1)).unwrap_err();
    assert_eq!(rejected.seq(), 1);
}

#[test]
fn packets_cross_threads_in_order_with_backoff() {
    let _ = tracing_subscriber::fmt::try_init();
    const N: u64 = 20_000;

    let (mut tx, mut rx) = exchange::channel(16).unwrap();

    let producer = thread::spawn(move || {
        let mut backoff = ExponentialBackoff::default();
        for seq in 0..N {
            let mut packet = bulk(seq);
            while let Err(back) = tx.push(packet) {
                packet = back;
                backoff.snooze();
            }
            backoff.reset();
        }
    });

    let mut next = 0;
    let mut backoff = ExponentialBackoff::default();
    while next < N {
        match rx.pop() {
            Some(packet) => {
                assert_eq!(packet.seq(), next);
                next += 1;
                backoff.reset();
            }
            None => {
                backoff.snooze();
            }
        }
    }

    producer.join().unwrap();
    assert!(rx.is_closed());
    assert!(rx.pop().is_none());
}
