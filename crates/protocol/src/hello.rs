//! The client handshake message
//!
//! A Snapcast client's first message is a `Hello` carrying a JSON object
//! describing the client. Parsing is lenient: every field is optional and
//! unknown fields are ignored, so old and new snapclients are both accepted.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::message::{decode_blob, encode_blob, frame, MessageKind, TimeVal};
use crate::Result;

/// The `Hello` handshake payload
///
/// Field names follow the Snapcast protocol reference.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Hello {
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(rename = "HostName")]
    pub hostname: String,
    #[serde(rename = "ClientName")]
    pub client_name: String,
    #[serde(rename = "Version")]
    pub version: String,
    #[serde(rename = "OS")]
    pub os: String,
    #[serde(rename = "Arch")]
    pub arch: String,
    #[serde(rename = "Instance")]
    pub instance: u32,
    #[serde(rename = "MAC")]
    pub mac: String,
    #[serde(rename = "SnapStreamProtocolVersion")]
    pub protocol_version: u32,
}

impl Hello {
    /// Parse a `Hello` frame payload (length-prefixed JSON)
    pub fn parse(mut payload: Bytes) -> Result<Self> {
        let json = decode_blob(&mut payload, "hello")?;
        Ok(serde_json::from_slice(&json)?)
    }

    /// The identifier a server should use for this client
    ///
    /// The configured `ID` wins; hosts that don't set one are identified by
    /// hostname.
    pub fn identity(&self) -> &str {
        if !self.id.is_empty() {
            &self.id
        } else {
            &self.hostname
        }
    }

    /// Build a `Hello` frame with the given message id
    ///
    /// This is the client side of the handshake, used by peers and tests.
    pub fn to_frame(&self, id: u16) -> Result<Bytes> {
        let json = serde_json::to_vec(self)?;
        let mut buf = frame(
            MessageKind::Hello,
            id,
            0,
            TimeVal::default(),
            4 + json.len(),
        );
        encode_blob(&json, &mut buf);
        Ok(buf.freeze())
    }
}

#[cfg(test)]
#[path = "hello_test.rs"]
mod tests;
