//! Frame encoding and parsing tests

use bytes::BytesMut;

use super::*;

fn parse_one(frame: &[u8]) -> Frame {
    let mut buf = BytesMut::from(frame);
    let parsed = Frame::try_parse(&mut buf).unwrap().expect("complete frame");
    assert!(buf.is_empty(), "parser should consume the whole frame");
    parsed
}

// ============================================================================
// Header layout
// ============================================================================

#[test]
fn test_header_is_26_bytes() {
    let frame = wire_chunk_frame(TimeVal::default(), b"");
    // 8-byte timestamp + 4-byte size prefix, no data
    assert_eq!(frame.len(), BASE_HEADER_LEN + 12);
}

#[test]
fn test_header_fields_little_endian() {
    let frame = wire_chunk_frame(TimeVal { sec: 1, usec: 2 }, b"abc");

    // type = WireChunk = 2
    assert_eq!(&frame[0..2], &[2, 0]);
    // id, refers_to = 0
    assert_eq!(&frame[2..6], &[0, 0, 0, 0]);
    // size = 8 + 4 + 3 = 15
    assert_eq!(&frame[22..26], &15u32.to_le_bytes());
}

#[test]
fn test_known_kind_accepts_defined_types() {
    let frame = stream_tags_frame(b"{}");
    let parsed = parse_one(&frame);
    assert_eq!(parsed.known_kind().unwrap(), MessageKind::StreamTags);
}

#[test]
fn test_known_kind_rejects_unrecognized_type() {
    let mut raw = wire_chunk_frame(TimeVal::default(), b"x").to_vec();
    // Forge a type value the protocol doesn't define
    raw[0..2].copy_from_slice(&99u16.to_le_bytes());

    let parsed = parse_one(&raw);
    assert_eq!(parsed.kind(), None);

    let err = parsed.known_kind().unwrap_err();
    assert!(matches!(err, ProtocolError::UnknownType(99)));
}

#[test]
fn test_message_kind_roundtrip() {
    for kind in [
        MessageKind::CodecHeader,
        MessageKind::WireChunk,
        MessageKind::StreamTags,
        MessageKind::Hello,
    ] {
        assert_eq!(MessageKind::from_u16(kind.as_u16()), Some(kind));
    }
    assert_eq!(MessageKind::from_u16(0), None);
    assert_eq!(MessageKind::from_u16(99), None);
}

// ============================================================================
// Frame building
// ============================================================================

#[test]
fn test_codec_header_frame() {
    let received = TimeVal { sec: 10, usec: 20 };
    let frame = codec_header_frame("wave", &[1, 2, 3, 4], 7, received);
    let parsed = parse_one(&frame);

    assert_eq!(parsed.kind(), Some(MessageKind::CodecHeader));
    assert_eq!(parsed.header.refers_to, 7);
    assert_eq!(parsed.header.received, received);

    let payload = CodecHeaderPayload::parse(parsed.payload).unwrap();
    assert_eq!(payload.codec, "wave");
    assert_eq!(&payload.header[..], &[1, 2, 3, 4]);
}

#[test]
fn test_wire_chunk_frame() {
    let ts = TimeVal {
        sec: 123,
        usec: 456_789,
    };
    let frame = wire_chunk_frame(ts, b"pcm-data");
    let parsed = parse_one(&frame);

    assert_eq!(parsed.kind(), Some(MessageKind::WireChunk));

    let payload = WireChunkPayload::parse(parsed.payload).unwrap();
    assert_eq!(payload.timestamp, ts);
    assert_eq!(&payload.data[..], b"pcm-data");
}

#[test]
fn test_stream_tags_frame() {
    let json = br#"{"artist":"A"}"#;
    let frame = stream_tags_frame(json);
    let parsed = parse_one(&frame);

    assert_eq!(parsed.kind(), Some(MessageKind::StreamTags));

    let payload = StreamTagsPayload::parse(parsed.payload).unwrap();
    assert_eq!(&payload.json[..], json);
}

#[test]
fn test_sent_timestamp_is_stamped() {
    let frame = wire_chunk_frame(TimeVal::default(), b"");
    let parsed = parse_one(&frame);

    // A real wall clock, not the zero default
    assert!(parsed.header.sent.sec > 0);
}

// ============================================================================
// Incremental parsing
// ============================================================================

#[test]
fn test_try_parse_incomplete_header() {
    let mut buf = BytesMut::from(&[0u8; 10][..]);
    assert!(Frame::try_parse(&mut buf).unwrap().is_none());
    assert_eq!(buf.len(), 10);
}

#[test]
fn test_try_parse_incomplete_payload() {
    let frame = wire_chunk_frame(TimeVal::default(), b"abcdef");
    let mut buf = BytesMut::from(&frame[..frame.len() - 1]);

    assert!(Frame::try_parse(&mut buf).unwrap().is_none());

    // Completing the frame makes it parse
    buf.extend_from_slice(&frame[frame.len() - 1..]);
    assert!(Frame::try_parse(&mut buf).unwrap().is_some());
}

#[test]
fn test_try_parse_two_frames_back_to_back() {
    let a = wire_chunk_frame(TimeVal { sec: 1, usec: 0 }, b"first");
    let b = wire_chunk_frame(TimeVal { sec: 2, usec: 0 }, b"second");

    let mut buf = BytesMut::new();
    buf.extend_from_slice(&a);
    buf.extend_from_slice(&b);

    let first = Frame::try_parse(&mut buf).unwrap().unwrap();
    let second = Frame::try_parse(&mut buf).unwrap().unwrap();
    assert!(Frame::try_parse(&mut buf).unwrap().is_none());

    let first = WireChunkPayload::parse(first.payload).unwrap();
    let second = WireChunkPayload::parse(second.payload).unwrap();
    assert_eq!(&first.data[..], b"first");
    assert_eq!(&second.data[..], b"second");
}

#[test]
fn test_try_parse_rejects_oversized() {
    let mut raw = wire_chunk_frame(TimeVal::default(), b"x").to_vec();
    // Forge the size field past the limit
    raw[22..26].copy_from_slice(&(MAX_PAYLOAD_SIZE + 1).to_le_bytes());

    let mut buf = BytesMut::from(&raw[..]);
    let err = Frame::try_parse(&mut buf).unwrap_err();
    assert!(matches!(err, ProtocolError::Oversized { .. }));
}

// ============================================================================
// Payload decoding errors
// ============================================================================

#[test]
fn test_truncated_codec_header_payload() {
    let frame = codec_header_frame("wave", &[1, 2, 3], 0, TimeVal::default());
    let parsed = parse_one(&frame);

    let truncated = parsed.payload.slice(0..parsed.payload.len() - 2);
    assert!(CodecHeaderPayload::parse(truncated).is_err());
}

#[test]
fn test_truncated_wire_chunk_payload() {
    let payload = bytes::Bytes::from_static(&[0, 0, 0]);
    assert!(WireChunkPayload::parse(payload).is_err());
}

// ============================================================================
// TimeVal
// ============================================================================

#[test]
fn test_timeval_from_duration() {
    let tv = TimeVal::from_duration(std::time::Duration::new(5, 250_000_000));
    assert_eq!(tv.sec, 5);
    assert_eq!(tv.usec, 250_000);
}

#[test]
fn test_timeval_now_wall_is_recent() {
    let tv = TimeVal::now_wall();
    // After 2001; catches unit mistakes (ms vs s vs µs)
    assert!(tv.sec > 1_000_000_000);
    assert!((0..1_000_000).contains(&tv.usec));
}
