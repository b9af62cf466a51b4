//! Scenario tests for TeeRing space accounting on a 4 KiB ring.

use teering::{CommitError, TeeRing, SMALL_CONFIG};

const INT: usize = std::mem::size_of::<u32>();

fn ring(readers: usize) -> TeeRing {
    TeeRing::new(SMALL_CONFIG.with_readers(readers)).expect("valid config")
}

/// The availability queries never promise more than the totals allow.
fn assert_spans_within_totals(ring: &TeeRing) {
    assert!(ring.space_free() >= ring.available_to_write());
    for reader in 0..ring.num_readers() {
        assert!(ring.space_used() >= ring.available_to_read(reader));
    }
}

fn push_u32(ring: &mut TeeRing, value: u32) {
    let span = ring.writable();
    assert!(span.len() >= INT, "only {} bytes writable", span.len());
    span[..INT].copy_from_slice(&value.to_ne_bytes());
    ring.commit_write(INT).expect("commit write");
}

fn pop_u32(ring: &mut TeeRing, reader: usize) -> u32 {
    let span = ring.readable(reader);
    assert!(span.len() >= INT, "only {} bytes readable", span.len());
    let value = u32::from_ne_bytes(span[..INT].try_into().unwrap());
    ring.commit_read(reader, INT).expect("commit read");
    value
}

#[test]
fn test_space_in_new_buffer() {
    let ring = ring(1);
    assert!(ring.head().is_origin());
    assert!(ring.tail(0).is_origin());
    assert_eq!(ring.constraining_reader(), 0);
    assert_eq!(ring.space_free(), 4095);
    assert_eq!(ring.space_used(), 0);
    assert_eq!(ring.available_to_write(), 4095);
    assert_eq!(ring.available_to_read(0), 0);
    assert_spans_within_totals(&ring);
}

#[test]
fn test_space_after_write() {
    let mut ring = ring(1);
    ring.commit_write(95).unwrap();
    assert_eq!(ring.space_free(), 4000);
    assert_eq!(ring.space_used(), 95);
    assert_spans_within_totals(&ring);
}

#[test]
fn test_space_after_write_read() {
    let mut ring = ring(1);
    ring.commit_write(95).unwrap();
    ring.commit_read(0, 95).unwrap();
    assert_eq!(ring.space_free(), 4095);
    assert_eq!(ring.space_used(), 0);
    assert_spans_within_totals(&ring);
}

#[test]
fn test_overflow_is_rejected() {
    let mut ring = ring(1);
    assert_eq!(
        ring.commit_write(4096),
        Err(CommitError::WriteExceedsAvailable {
            requested: 4096,
            available: 4095
        })
    );
    assert!(ring.head().is_origin());
}

#[test]
fn test_space_after_fill() {
    let mut ring = ring(1);
    ring.commit_write(4095).unwrap();
    assert_eq!(ring.space_free(), 0);
    assert_eq!(ring.space_used(), 4095);
    assert_eq!(ring.available_to_write(), 0);
    assert!(ring.is_full());
    assert_spans_within_totals(&ring);
}

#[test]
fn test_space_after_wrap() {
    let mut ring = ring(1);
    ring.commit_write(100).unwrap();
    ring.commit_read(0, 100).unwrap();
    assert_eq!(ring.available_to_read(0), 0);
    assert!(!ring.is_wrapped(0));

    // Runs exactly to the physical end, so head lands on the origin.
    assert_eq!(ring.available_to_write(), 3996);
    ring.commit_write(3996).unwrap();
    assert!(ring.head().is_origin());
    assert!(ring.is_wrapped(0));

    // Only the bytes before the reader's tail, minus the sentinel.
    assert_eq!(ring.available_to_write(), 99);
    ring.commit_write(99).unwrap();
    assert!(ring.is_wrapped(0));
    assert_eq!(ring.space_free(), 0);
    assert_eq!(ring.space_used(), 4095);
    assert_spans_within_totals(&ring);

    // The reader sees the run to the end first, then the run from the origin.
    assert_eq!(ring.available_to_read(0), 3996);
    ring.commit_read(0, 3996).unwrap();
    assert!(!ring.is_wrapped(0));
    assert_eq!(ring.available_to_read(0), 99);
}

#[test]
fn test_read_write_one_at_a_time() {
    let mut ring = ring(1);
    for i in 0..9000u32 {
        assert!(ring.available_to_write() >= INT);
        push_u32(&mut ring, i);
        assert!(ring.available_to_read(0) >= INT);
        assert_eq!(pop_u32(&mut ring, 0), i);
    }
    assert!(ring.is_empty());
}

#[test]
fn test_fill_drain() {
    let mut ring = ring(1);
    for i in 0..1023u32 {
        push_u32(&mut ring, i);
    }
    for i in 0..1023u32 {
        assert_eq!(pop_u32(&mut ring, 0), i);
    }
    assert!(ring.is_empty());
}

#[test]
fn test_fill_drain_drain() {
    let mut ring = ring(2);
    for i in 0..1023u32 {
        push_u32(&mut ring, i);
    }
    for i in 0..1023u32 {
        assert_eq!(pop_u32(&mut ring, 0), i);
    }
    // Reader 0 is done but reader 1 still pins everything.
    assert_eq!(ring.space_used(), 1023 * INT);
    assert_eq!(ring.constraining_reader(), 1);
    for i in 0..1023u32 {
        assert_eq!(pop_u32(&mut ring, 1), i);
    }
    assert!(ring.is_empty());
}

#[test]
fn test_wrap_multi() {
    let mut ring = ring(2);
    ring.commit_write(4095).unwrap();
    assert!(!ring.is_wrapped(0));
    assert!(!ring.is_wrapped(1));

    ring.commit_read(0, 2048).unwrap();
    ring.commit_read(1, 4095).unwrap();
    assert!(!ring.is_wrapped(0));
    assert!(!ring.is_wrapped(1));

    // The slower reader (0) is unwrapped with a non-zero tail: run to the end.
    ring.commit_write(1).unwrap();
    assert!(ring.head().is_origin());
    ring.commit_write(1024).unwrap();

    // Reader 1 finishes the last byte before the end, then follows head.
    ring.commit_read(1, 1).unwrap();
    ring.commit_read(1, 100).unwrap();
    assert!(ring.is_wrapped(0));
    assert!(!ring.is_wrapped(1));

    ring.commit_read(0, 2048).unwrap();
    ring.commit_read(0, 120).unwrap();
    assert!(!ring.is_wrapped(0));
    assert!(!ring.is_wrapped(1));
}

#[test]
fn test_writer_tracks_slower_reader() {
    let mut ring = ring(2);
    let data: Vec<u8> = (0..3000u32).map(|i| (i % 251) as u8).collect();
    assert_eq!(ring.write(&data), 3000);

    // Fast reader takes everything, slow reader takes a little.
    let mut fast = vec![0u8; 3000];
    assert_eq!(ring.read(0, &mut fast), 3000);
    let mut slow = vec![0u8; 500];
    assert_eq!(ring.read(1, &mut slow), 500);
    assert_eq!(fast, data);
    assert_eq!(slow, data[..500]);

    // Budget is the slow reader's slack, not the fast reader's.
    assert_eq!(ring.constraining_reader(), 1);
    assert_eq!(ring.slack(0), 4095);
    assert_eq!(ring.slack(1), 4095 - 2500);
    assert_eq!(ring.space_free(), ring.slack(1));

    // Contiguous span runs to the end (tail 1 is unwrapped and non-zero).
    assert_eq!(ring.available_to_write(), 4096 - 3000);
    ring.commit_write(1096).unwrap();
    assert!(ring.head().is_origin());
    // After the wrap only the bytes before the slow tail remain.
    assert_eq!(ring.available_to_write(), 499);
    ring.commit_write(499).unwrap();
    assert_eq!(ring.available_to_write(), 0);
    assert_eq!(ring.slack(1), 0);
    // The fast reader is still owed only what was written after it.
    assert_eq!(ring.unread(0), 1096 + 499);
}

#[test]
fn test_queries_are_idempotent() {
    let mut ring = ring(3);
    ring.commit_write(1234).unwrap();
    ring.commit_read(2, 34).unwrap();

    let snapshot = |r: &TeeRing| {
        (
            r.available_to_write(),
            (0..3).map(|i| r.available_to_read(i)).collect::<Vec<_>>(),
            r.space_free(),
            r.space_used(),
            r.constraining_reader(),
        )
    };
    assert_eq!(snapshot(&ring), snapshot(&ring));
}
