use std::{sync::Arc, thread};

use seqflow_core::{PriorityRouter, RouterOptions};
use seqflow_packet::Priority;

use crate::common::packet;

#[test]
fn mixed_classes_on_one_queue() {
    let router = PriorityRouter::new(RouterOptions::default()).unwrap();

    let arrivals = [
        (10, Priority::Bulk),
        (11, Priority::Control),
        (12, Priority::RealTime),
        (13, Priority::Control),
        (14, Priority::Streaming),
    ];
    for (seq, priority) in arrivals {
        router.route(packet(seq, priority, 5));
    }

    let queue = router.queue_for(5);
    let order: Vec<_> = router
        .drain(queue)
        .unwrap()
        .into_iter()
        .map(|p| (p.seq(), p.priority()))
        .collect();

    assert_eq!(
        order,
        vec![
            (11, Priority::Control),
            (13, Priority::Control),
            (12, Priority::RealTime),
            (14, Priority::Streaming),
            (10, Priority::Bulk),
        ]
    );
}

#[test]
fn drains_on_different_queues_run_concurrently() {
    let _ = tracing_subscriber::fmt::try_init();
    const PER_QUEUE: u64 = 5_000;

    let router = Arc::new(PriorityRouter::new(RouterOptions::default().num_queues(4)).unwrap());

    for seq in 0..4 * PER_QUEUE {
        let priority = Priority::ALL[(seq % 4) as usize];
        router.route(packet(seq, priority, (seq % 4) as u32));
    }

    // One drainer per queue, each on its own thread.
    let drainers: Vec<_> = (0..4)
        .map(|queue| {
            let router = Arc::clone(&router);
            thread::spawn(move || {
                let mut count = 0;
                let mut last: Option<(Priority, u64)> = None;
                while let Some(packet) = router.dequeue(queue).unwrap() {
                    if let Some((priority, seq)) = last {
                        assert!(
                            priority > packet.priority() ||
                                (priority == packet.priority() && seq < packet.seq())
                        );
                    }
                    last = Some((packet.priority(), packet.seq()));
                    count += 1;
                }
                count
            })
        })
        .collect();

    for drainer in drainers {
        assert_eq!(drainer.join().unwrap(), PER_QUEUE);
    }

    assert_eq!(router.total_routed(), 4 * PER_QUEUE);
    assert_eq!(router.total_dequeued(), 4 * PER_QUEUE);
}
