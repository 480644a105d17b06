//! Client session queue tests
//!
//! Socket-level behavior is covered by the integration tests; these
//! exercise the queue state machine directly.

use std::time::Instant;

use super::*;

fn test_client() -> Arc<ClientHandle> {
    ClientHandle::new("127.0.0.1:12345".parse().unwrap())
}

fn make_chunk(data: &'static [u8]) -> Arc<Chunk> {
    Arc::new(Chunk::new(Instant::now(), Bytes::from_static(data)))
}

fn pending_len(client: &ClientHandle) -> usize {
    client.queue.lock().pending.len()
}

// ============================================================================
// Push and the backlog cap
// ============================================================================

#[test]
fn test_new_client_is_drained() {
    let client = test_client();
    assert!(client.is_drained());
    assert!(!client.is_ready());
}

#[test]
fn test_push_queues_and_marks_undrained() {
    let client = test_client();
    client.push(&make_chunk(b"a"));

    assert_eq!(pending_len(&client), 1);
    assert!(!client.is_drained());
}

#[test]
fn test_push_at_cap_keeps_session() {
    let client = test_client();
    for _ in 0..PENDING_CHUNK_CAP {
        client.push(&make_chunk(b"x"));
    }

    assert!(!client.cancel.is_cancelled());
    assert_eq!(pending_len(&client), PENDING_CHUNK_CAP);
}

#[test]
fn test_push_over_cap_closes_session() {
    let client = test_client();
    for _ in 0..=PENDING_CHUNK_CAP {
        client.push(&make_chunk(b"x"));
    }

    assert!(client.cancel.is_cancelled());
    assert!(client.queue.lock().closing);
}

#[test]
fn test_push_after_closing_is_dropped() {
    let client = test_client();
    for _ in 0..=PENDING_CHUNK_CAP {
        client.push(&make_chunk(b"x"));
    }

    let len = pending_len(&client);
    client.push(&make_chunk(b"late"));
    assert_eq!(pending_len(&client), len);
}

#[test]
fn test_tags_do_not_count_toward_cap() {
    let client = test_client();
    client.ready.store(true, Ordering::Relaxed);

    for _ in 0..PENDING_CHUNK_CAP {
        client.push(&make_chunk(b"x"));
        client.send_stream_tags(&Bytes::from_static(b"{}"));
    }

    // Twice the cap in total entries, but only cap-many chunks
    assert!(!client.cancel.is_cancelled());
    assert_eq!(pending_len(&client), 2 * PENDING_CHUNK_CAP);
}

// ============================================================================
// Cancel
// ============================================================================

#[test]
fn test_cancel_pending_clears_queue() {
    let client = test_client();
    client.push(&make_chunk(b"a"));
    client.push(&make_chunk(b"b"));

    client.cancel_pending();

    assert_eq!(pending_len(&client), 0);
    assert_eq!(client.queue.lock().pending_chunks, 0);
}

#[test]
fn test_cancel_pending_resets_cap_counter() {
    let client = test_client();
    for _ in 0..PENDING_CHUNK_CAP {
        client.push(&make_chunk(b"x"));
    }

    client.cancel_pending();

    // A full new backlog fits again
    for _ in 0..PENDING_CHUNK_CAP {
        client.push(&make_chunk(b"y"));
    }
    assert!(!client.cancel.is_cancelled());
}

#[test]
fn test_cancel_pending_keeps_session_alive() {
    let client = test_client();
    client.push(&make_chunk(b"a"));

    client.cancel_pending();

    assert!(!client.cancel.is_cancelled());
    client.push(&make_chunk(b"resumed"));
    assert_eq!(pending_len(&client), 1);
}

// ============================================================================
// Handshake gating
// ============================================================================

#[test]
fn test_tags_dropped_before_handshake() {
    let client = test_client();
    client.send_stream_tags(&Bytes::from_static(b"{\"artist\":\"A\"}"));

    assert_eq!(pending_len(&client), 0);
    assert!(client.is_drained());
}

#[test]
fn test_tags_queued_after_handshake() {
    let client = test_client();
    client.ready.store(true, Ordering::Relaxed);

    client.send_stream_tags(&Bytes::from_static(b"{\"artist\":\"A\"}"));

    assert_eq!(pending_len(&client), 1);
    assert!(!client.is_drained());
}

#[test]
fn test_chunks_queue_before_handshake() {
    // Audio queued while awaiting the Hello is kept for delivery
    let client = test_client();
    client.push(&make_chunk(b"early"));

    assert_eq!(pending_len(&client), 1);
    assert!(!client.is_ready());
}
