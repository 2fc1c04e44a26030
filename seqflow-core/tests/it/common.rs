use bytes::Bytes;
use seqflow_packet::{Packet, Priority};

pub(crate) fn packet(seq: u64, priority: Priority, destination: u32) -> Packet {
    Packet::new(seq, priority, 1, destination, Bytes::from(vec![0xAB; 64])).unwrap()
}

pub(crate) fn bulk(seq: u64) -> Packet {
    packet(seq, Priority::Bulk, 0)
}
