//! Logical messages relayed between clients.
//!
//! A [`Message`] is what connection handlers produce and the broadcaster
//! consumes. It is transport-agnostic: wire framing lives in
//! `relay-protocol`, and nothing here assumes the payload is valid UTF-8.

use bytes::Bytes;
use chrono::{DateTime, Utc};

/// Sender name reserved for relay-generated notices (connects, disconnects).
pub const SYSTEM_SENDER: &str = "SERVER";

/// One relayed message.
///
/// Created by a connection handler or by the relay itself, pushed onto the
/// queue, and dropped once the broadcaster has fanned it out. Never mutated
/// after construction.
#[derive(Debug, Clone)]
pub struct Message {
    /// Capture time. Informational only; delivery order is decided by
    /// queue position, not by this field.
    pub timestamp: DateTime<Utc>,
    /// Display name of the sender, copied at enqueue time so the message
    /// outlives the client it came from. [`SYSTEM_SENDER`] for notices.
    pub sender: String,
    /// Raw payload bytes, exactly as received from the wire.
    pub payload: Bytes,
}

impl Message {
    /// Message carrying a client-submitted payload.
    pub fn from_client(sender: impl Into<String>, payload: Bytes) -> Self {
        Self {
            timestamp: Utc::now(),
            sender: sender.into(),
            payload,
        }
    }

    /// Relay-generated notice, sent under [`SYSTEM_SENDER`].
    pub fn system(text: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            sender: SYSTEM_SENDER.to_string(),
            payload: Bytes::from(text.into().into_bytes()),
        }
    }

    /// Payload rendered as text, via [`text_lossy`].
    pub fn payload_text(&self) -> String {
        text_lossy(&self.payload)
    }

    /// The broadcast line for this message: `[sender]: payload`.
    pub fn display_text(&self) -> String {
        format!("[{}]: {}", self.sender, self.payload_text())
    }
}

/// Render raw payload bytes as display text.
///
/// Lossy UTF-8, with trailing NULs stripped so peers that frame C-style
/// NUL-terminated strings display cleanly.
pub fn text_lossy(payload: &[u8]) -> String {
    let text = String::from_utf8_lossy(payload);
    text.trim_end_matches('\0').to_string()
}

// ============================================================
//  Tests
// ============================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_message_formats_with_bracketed_sender() {
        let msg = Message::from_client("alice", Bytes::from_static(b"hello there"));
        assert_eq!(msg.sender, "alice");
        assert_eq!(msg.display_text(), "[alice]: hello there");
    }

    #[test]
    fn system_message_uses_reserved_sender() {
        let msg = Message::system("alice connected");
        assert_eq!(msg.sender, SYSTEM_SENDER);
        assert_eq!(msg.display_text(), "[SERVER]: alice connected");
    }

    #[test]
    fn empty_payload_renders_as_empty_text() {
        let msg = Message::from_client("bob", Bytes::new());
        assert_eq!(msg.payload_text(), "");
        assert_eq!(msg.display_text(), "[bob]: ");
    }

    #[test]
    fn trailing_nuls_are_stripped_from_display_text() {
        let msg = Message::from_client("carol", Bytes::from_static(b"hi\0\0"));
        assert_eq!(msg.payload_text(), "hi");
        assert_eq!(msg.display_text(), "[carol]: hi");
    }

    #[test]
    fn interior_nuls_are_preserved() {
        assert_eq!(text_lossy(b"a\0b\0"), "a\u{0}b");
    }

    #[test]
    fn invalid_utf8_is_replaced_not_rejected() {
        let rendered = text_lossy(&[0x66, 0x6f, 0xff, 0x6f]);
        assert_eq!(rendered, "fo\u{fffd}o");
    }
}
