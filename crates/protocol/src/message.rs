//! Base-message header, timestamps and frame building/parsing
//!
//! Frame builders stamp `sent` with the wall clock at build time; `received`
//! is zero except where a message answers a client request (the codec header
//! echoes the `Hello` it responds to).

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::ProtocolError;
use crate::Result;

/// Size of the fixed base-message header
pub const BASE_HEADER_LEN: usize = 26;

/// Maximum accepted payload size (1MB)
///
/// Audio chunks are at most 32KiB and the handshake JSON is tiny; anything
/// near this limit is a broken or hostile peer.
pub const MAX_PAYLOAD_SIZE: u32 = 1024 * 1024;

/// Message type discriminants
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum MessageKind {
    /// Server → client: codec name and container prelude
    CodecHeader = 1,
    /// Server → client: one timestamped chunk of encoded audio
    WireChunk = 2,
    /// Server → client: stream metadata as a UTF-8 JSON object
    StreamTags = 3,
    /// Client → server: handshake
    Hello = 4,
}

impl MessageKind {
    /// Decode a wire discriminant
    pub fn from_u16(value: u16) -> Option<Self> {
        match value {
            1 => Some(MessageKind::CodecHeader),
            2 => Some(MessageKind::WireChunk),
            3 => Some(MessageKind::StreamTags),
            4 => Some(MessageKind::Hello),
            _ => None,
        }
    }

    /// Wire discriminant for this kind
    #[inline]
    pub fn as_u16(self) -> u16 {
        self as u16
    }
}

/// Wire timestamp: seconds + microseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TimeVal {
    pub sec: i32,
    pub usec: i32,
}

impl TimeVal {
    /// Convert a duration (since some epoch) into a wire timestamp
    pub fn from_duration(d: Duration) -> Self {
        Self {
            sec: d.as_secs() as i32,
            usec: d.subsec_micros() as i32,
        }
    }

    /// Current wall clock as a wire timestamp
    pub fn now_wall() -> Self {
        let since_epoch = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or(Duration::ZERO);
        Self::from_duration(since_epoch)
    }

    fn encode(&self, buf: &mut BytesMut) {
        buf.put_i32_le(self.sec);
        buf.put_i32_le(self.usec);
    }

    fn decode(buf: &mut Bytes) -> Self {
        Self {
            sec: buf.get_i32_le(),
            usec: buf.get_i32_le(),
        }
    }
}

/// The fixed base-message header preceding every payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    /// Message type discriminant (see [`MessageKind`])
    pub kind: u16,
    /// Sender-assigned message id
    pub id: u16,
    /// Id of the request this message answers (0 if unsolicited)
    pub refers_to: u16,
    /// Wall clock at send time
    pub sent: TimeVal,
    /// `sent` of the request this message answers (zero if unsolicited)
    pub received: TimeVal,
    /// Payload length in bytes
    pub size: u32,
}

impl FrameHeader {
    fn encode(&self, buf: &mut BytesMut) {
        buf.put_u16_le(self.kind);
        buf.put_u16_le(self.id);
        buf.put_u16_le(self.refers_to);
        self.sent.encode(buf);
        self.received.encode(buf);
        buf.put_u32_le(self.size);
    }

    fn decode(mut buf: Bytes) -> Self {
        Self {
            kind: buf.get_u16_le(),
            id: buf.get_u16_le(),
            refers_to: buf.get_u16_le(),
            sent: TimeVal::decode(&mut buf),
            received: TimeVal::decode(&mut buf),
            size: buf.get_u32_le(),
        }
    }
}

/// One complete message: header plus raw payload
#[derive(Debug, Clone)]
pub struct Frame {
    pub header: FrameHeader,
    pub payload: Bytes,
}

impl Frame {
    /// Try to parse one complete frame from the front of `buf`
    ///
    /// Returns `Ok(None)` when more data is needed; consumed bytes are
    /// removed from `buf`. The size field is validated against
    /// [`MAX_PAYLOAD_SIZE`] before the payload is awaited, so an oversized
    /// announcement fails fast.
    pub fn try_parse(buf: &mut BytesMut) -> Result<Option<Frame>> {
        if buf.len() < BASE_HEADER_LEN {
            return Ok(None);
        }

        // Payload size lives in the last four header bytes
        let size = u32::from_le_bytes([buf[22], buf[23], buf[24], buf[25]]);
        if size > MAX_PAYLOAD_SIZE {
            return Err(ProtocolError::Oversized {
                size,
                limit: MAX_PAYLOAD_SIZE,
            });
        }

        let total = BASE_HEADER_LEN + size as usize;
        if buf.len() < total {
            return Ok(None);
        }

        let header = FrameHeader::decode(buf.split_to(BASE_HEADER_LEN).freeze());
        let payload = buf.split_to(size as usize).freeze();

        Ok(Some(Frame { header, payload }))
    }

    /// The decoded message kind, if known
    pub fn kind(&self) -> Option<MessageKind> {
        MessageKind::from_u16(self.header.kind)
    }

    /// The decoded message kind, or the raw discriminant as an error
    ///
    /// For contexts where an unrecognized type is a protocol violation
    /// rather than something to skip.
    pub fn known_kind(&self) -> Result<MessageKind> {
        MessageKind::from_u16(self.header.kind)
            .ok_or(ProtocolError::UnknownType(self.header.kind))
    }
}

pub(crate) fn frame(
    kind: MessageKind,
    id: u16,
    refers_to: u16,
    received: TimeVal,
    payload_len: usize,
) -> BytesMut {
    let mut buf = BytesMut::with_capacity(BASE_HEADER_LEN + payload_len);
    let header = FrameHeader {
        kind: kind.as_u16(),
        id,
        refers_to,
        sent: TimeVal::now_wall(),
        received,
        size: payload_len as u32,
    };
    header.encode(&mut buf);
    buf
}

/// Build a `CodecHeader` frame
///
/// Payload: `codec` as a length-prefixed string followed by the
/// length-prefixed container prelude. `refers_to`/`received` echo the
/// `Hello` this answers.
pub fn codec_header_frame(codec: &str, header: &[u8], refers_to: u16, received: TimeVal) -> Bytes {
    let payload_len = 4 + codec.len() + 4 + header.len();
    let mut buf = frame(MessageKind::CodecHeader, 0, refers_to, received, payload_len);
    buf.put_u32_le(codec.len() as u32);
    buf.put_slice(codec.as_bytes());
    buf.put_u32_le(header.len() as u32);
    buf.put_slice(header);
    buf.freeze()
}

/// Build a `WireChunk` frame carrying one encoded audio chunk
pub fn wire_chunk_frame(timestamp: TimeVal, data: &[u8]) -> Bytes {
    let payload_len = 8 + 4 + data.len();
    let mut buf = frame(MessageKind::WireChunk, 0, 0, TimeVal::default(), payload_len);
    timestamp.encode(&mut buf);
    buf.put_u32_le(data.len() as u32);
    buf.put_slice(data);
    buf.freeze()
}

/// Build a `StreamTags` frame carrying a UTF-8 JSON object
pub fn stream_tags_frame(json: &[u8]) -> Bytes {
    let payload_len = 4 + json.len();
    let mut buf = frame(MessageKind::StreamTags, 0, 0, TimeVal::default(), payload_len);
    buf.put_u32_le(json.len() as u32);
    buf.put_slice(json);
    buf.freeze()
}

/// Decoded `CodecHeader` payload
#[derive(Debug, Clone, PartialEq)]
pub struct CodecHeaderPayload {
    /// Stream format name, e.g. `"wave"`
    pub codec: String,
    /// The container prelude
    pub header: Bytes,
}

impl CodecHeaderPayload {
    /// Parse a `CodecHeader` frame payload
    pub fn parse(mut payload: Bytes) -> Result<Self> {
        let codec = decode_blob(&mut payload, "codec name")?;
        let codec = String::from_utf8(codec.to_vec())
            .map_err(|e| ProtocolError::Malformed(format!("codec name not UTF-8: {e}")))?;
        let header = decode_blob(&mut payload, "codec header")?;
        Ok(Self { codec, header })
    }
}

/// Decoded `WireChunk` payload
#[derive(Debug, Clone, PartialEq)]
pub struct WireChunkPayload {
    /// Stream timestamp of the chunk
    pub timestamp: TimeVal,
    /// The encoded audio bytes
    pub data: Bytes,
}

impl WireChunkPayload {
    /// Parse a `WireChunk` frame payload
    pub fn parse(mut payload: Bytes) -> Result<Self> {
        if payload.remaining() < 8 {
            return Err(ProtocolError::Malformed("truncated chunk timestamp".into()));
        }
        let timestamp = TimeVal::decode(&mut payload);
        let data = decode_blob(&mut payload, "chunk data")?;
        Ok(Self { timestamp, data })
    }
}

/// Decoded `StreamTags` payload
#[derive(Debug, Clone, PartialEq)]
pub struct StreamTagsPayload {
    /// The UTF-8 JSON object
    pub json: Bytes,
}

impl StreamTagsPayload {
    /// Parse a `StreamTags` frame payload
    pub fn parse(mut payload: Bytes) -> Result<Self> {
        let json = decode_blob(&mut payload, "stream tags")?;
        Ok(Self { json })
    }
}

pub(crate) fn decode_blob(buf: &mut Bytes, what: &str) -> Result<Bytes> {
    if buf.remaining() < 4 {
        return Err(ProtocolError::Malformed(format!("truncated {what} length")));
    }
    let len = buf.get_u32_le() as usize;
    if buf.remaining() < len {
        return Err(ProtocolError::Malformed(format!("truncated {what}")));
    }
    Ok(buf.split_to(len))
}

pub(crate) fn encode_blob(data: &[u8], buf: &mut BytesMut) {
    buf.put_u32_le(data.len() as u32);
    buf.put_slice(data);
}

#[cfg(test)]
#[path = "message_test.rs"]
mod tests;
