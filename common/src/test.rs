use embassy_sync::blocking_mutex::raw::{CriticalSectionRawMutex, NoopRawMutex};
use pretty_assertions::assert_eq;

use crate::buffer::ChannelBuffer;
use crate::coding::{LineCoding, LineCodingPair};
use crate::sampling::sample_rate_hz;
use crate::status::InterfaceFlags;

type SmallBuffer = ChannelBuffer<NoopRawMutex, 8>;

#[test]
fn fill_accumulates_in_call_order() {
    let buf: ChannelBuffer<NoopRawMutex, 32> = ChannelBuffer::new();
    assert_eq!(buf.try_fill(b"abc"), 3);
    assert_eq!(buf.try_fill(b"de"), 2);
    assert_eq!(buf.len(), Some(5));

    let mut drain = buf.try_drain().unwrap();
    assert_eq!(drain.pending(), &b"abcde"[..]);
    drain.consume(5);
    drop(drain);
    assert_eq!(buf.len(), Some(0));
}

#[test]
fn overfull_offer_is_truncated_then_partially_drained() {
    let buf = SmallBuffer::new();
    assert_eq!(buf.capacity(), 8);

    // offer 10 into an empty 8-capacity buffer: exactly 8 accepted
    assert_eq!(buf.try_fill(&[0, 1, 2, 3, 4, 5, 6, 7, 8, 9]), 8);
    assert_eq!(buf.len(), Some(8));

    // a sink that takes three bytes leaves the rest compacted in front
    let mut drain = buf.try_drain().unwrap();
    drain.consume(3);
    drop(drain);
    assert_eq!(buf.len(), Some(5));

    let drain = buf.try_drain().unwrap();
    assert_eq!(drain.pending(), &[3, 4, 5, 6, 7][..]);
}

#[test]
fn second_fill_stops_at_capacity() {
    let buf = SmallBuffer::new();
    assert_eq!(buf.try_fill(&[1, 2, 3, 4, 5]), 5);
    assert_eq!(buf.try_fill(&[6, 7, 8, 9, 10]), 3);
    assert_eq!(buf.len(), Some(8));

    // bytes 9 and 10 were never stored
    let drain = buf.try_drain().unwrap();
    assert_eq!(drain.pending(), &[1, 2, 3, 4, 5, 6, 7, 8][..]);
}

#[test]
fn drain_then_fill_restores_content() {
    let buf = SmallBuffer::new();
    buf.try_fill(&[1, 2, 3, 4, 5, 6]);

    let mut drain = buf.try_drain().unwrap();
    drain.consume(4);
    drop(drain);

    assert_eq!(buf.try_fill(&[7, 8, 9, 10]), 4);
    let drain = buf.try_drain().unwrap();
    assert_eq!(drain.pending(), &[5, 6, 7, 8, 9, 10][..]);
}

#[test]
fn contended_guard_skips_the_pass() {
    let buf = SmallBuffer::new();
    buf.try_fill(&[1, 2, 3]);

    let drain = buf.try_drain().unwrap();
    // a producer and a second consumer both find the guard taken
    assert_eq!(buf.try_fill(&[4]), 0);
    assert!(buf.try_drain().is_none());
    assert_eq!(buf.len(), None);
    assert_eq!(buf.free(), None);
    drop(drain);

    assert_eq!(buf.try_fill(&[4]), 1);
    assert_eq!(buf.len(), Some(4));
}

#[test]
fn empty_buffer_has_nothing_to_drain() {
    let buf = SmallBuffer::new();
    assert!(buf.try_drain().is_none());
    assert_eq!(buf.free(), Some(8));
}

#[test]
fn dropped_drain_retains_bytes() {
    // the transport went away mid-pump: nothing consumed, nothing lost
    let buf = SmallBuffer::new();
    buf.try_fill(&[1, 2, 3, 4]);

    let drain = buf.try_drain().unwrap();
    assert_eq!(drain.pending(), &[1, 2, 3, 4][..]);
    drop(drain);

    // draining resumes where it left off on the next connected pass
    let mut drain = buf.try_drain().unwrap();
    assert_eq!(drain.pending(), &[1, 2, 3, 4][..]);
    drain.consume(4);
    drop(drain);
    assert_eq!(buf.len(), Some(0));
}

#[test]
fn concurrent_fill_and_drain_hold_the_invariants() {
    use std::sync::Arc;

    let buf: Arc<ChannelBuffer<CriticalSectionRawMutex, 32>> = Arc::new(ChannelBuffer::new());

    // The producer offers a running byte sequence and advances only by
    // what was accepted, so the consumer must observe a gapless stream
    // while the fill level stays within capacity.
    let producer = {
        let buf = Arc::clone(&buf);
        std::thread::spawn(move || {
            let mut next = 0u8;
            for _ in 0..10_000 {
                let chunk = [next, next.wrapping_add(1), next.wrapping_add(2)];
                let accepted = buf.try_fill(&chunk);
                next = next.wrapping_add(accepted as u8);
            }
        })
    };
    let consumer = {
        let buf = Arc::clone(&buf);
        std::thread::spawn(move || {
            let mut expected = 0u8;
            for _ in 0..10_000 {
                if let Some(mut drain) = buf.try_drain() {
                    let n = drain.pending().len();
                    assert!(n <= 32);
                    for &b in drain.pending() {
                        assert_eq!(b, expected);
                        expected = expected.wrapping_add(1);
                    }
                    drain.consume(n);
                }
            }
        })
    };

    producer.join().unwrap();
    consumer.join().unwrap();
    assert!(buf.len().unwrap() <= 32);
}

#[test]
fn fresh_coding_pair_needs_no_reapply() {
    let pair: LineCodingPair<NoopRawMutex> = LineCodingPair::new();
    assert!(!pair.needs_reapply());
    assert_eq!(pair.host(), LineCoding::default_8n1());
}

#[test]
fn host_update_sets_reapply_until_applied() {
    let pair: LineCodingPair<NoopRawMutex> = LineCodingPair::new();
    let lc = LineCoding {
        baud_rate: 921_600,
        data_bits: 8,
        stop_bits: 0,
        parity: 0,
    };

    pair.set_host(lc);
    assert!(pair.needs_reapply());

    pair.mark_applied();
    assert!(!pair.needs_reapply());
    assert_eq!(pair.peripheral(), lc);

    // re-sending identical settings must not flag a reapply
    pair.set_host(lc);
    assert!(!pair.needs_reapply());
}

#[test]
fn divisor_table_matches_documentation() {
    assert_eq!(sample_rate_hz(96), 500_000);
    assert_eq!(sample_rate_hz(240), 200_000);
    assert_eq!(sample_rate_hz(480), 100_000);
    assert_eq!(sample_rate_hz(960), 50_000);
    assert_eq!(sample_rate_hz(9600), 5_000);
}

#[test]
fn interface_flags_reduce_to_any() {
    let flags: InterfaceFlags<3> = InterfaceFlags::new();
    assert!(!flags.any());

    flags.set_connected(1, true);
    assert!(flags.any());
    assert!(flags.is_connected(1));
    assert!(!flags.is_connected(0));

    flags.set_connected(1, false);
    assert!(!flags.any());
}
