//! Snapcast wire protocol framing
//!
//! Implements the subset of the Snapcast protocol a streaming server needs:
//! the fixed binary base-message header, the three server→client message
//! types that deliver audio and metadata, and the client→server `Hello`
//! handshake.
//!
//! # Wire Format
//!
//! Every message starts with a 26-byte header, all fields little-endian:
//!
//! ```text
//! ┌──────┬──────┬───────────┬───────────────┬───────────────┬──────┬─────────┐
//! │ type │ id   │ refers_to │ sent          │ received      │ size │ payload │
//! │ u16  │ u16  │ u16       │ i32 s, i32 µs │ i32 s, i32 µs │ u32  │ N bytes │
//! └──────┴──────┴───────────┴───────────────┴───────────────┴──────┴─────────┘
//! ```
//!
//! # Message Types
//!
//! - `CodecHeader` (1): server → client, codec name + container prelude
//! - `WireChunk` (2): server → client, timestamped encoded audio
//! - `StreamTags` (3): server → client, UTF-8 JSON metadata object
//! - `Hello` (4): client → server, JSON handshake

mod error;
mod hello;
mod message;

pub use error::ProtocolError;
pub use hello::Hello;
pub use message::{
    codec_header_frame, stream_tags_frame, wire_chunk_frame, CodecHeaderPayload, Frame,
    FrameHeader, MessageKind, StreamTagsPayload, TimeVal, WireChunkPayload, BASE_HEADER_LEN,
    MAX_PAYLOAD_SIZE,
};

/// Result type for protocol operations
pub type Result<T> = std::result::Result<T, ProtocolError>;
