//! Inbound chunk classification and outgoing message text

use bytes::Bytes;

use crate::registry::ConnectionId;

/// Leading byte of telnet option negotiation (IAC)
pub const NEGOTIATION_MARKER: u8 = 0xFF;

/// Leading byte of terminal escape sequences
pub const ESCAPE: u8 = 0x1B;

/// Line terminator used by every message the server produces
pub const LINE_END: &str = "\r\n";

const ARRIVAL_TEXT: &str = "Is now connected";
const DEPARTURE_TEXT: &str = "Closed connection";

/// What a chunk read from a client turned out to be
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    /// Protocol negotiation (starts with 0xFF), never relayed
    Negotiation,
    /// Terminal control noise (starts with ESC), never relayed
    Control,
    /// User text to relay
    Text(String),
}

impl Inbound {
    /// Classify a chunk of bytes read from a client
    pub fn classify(chunk: &[u8]) -> Self {
        match chunk.first() {
            Some(&NEGOTIATION_MARKER) => Inbound::Negotiation,
            Some(&ESCAPE) => Inbound::Control,
            _ => Inbound::Text(decode_ascii(chunk)),
        }
    }

    /// Whether this chunk is relayed to other clients
    pub fn is_relayed(&self) -> bool {
        matches!(self, Inbound::Text(_))
    }
}

/// Decode bytes as 7-bit ASCII, replacing anything above 0x7F with `?`
pub fn decode_ascii(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|&b| if b.is_ascii() { b as char } else { '?' })
        .collect()
}

/// Build a broadcast payload from `sender`
///
/// Text is prefixed with `[Client {id}] ` unless it starts with a bare line
/// terminator.
pub fn format_broadcast(sender: ConnectionId, text: &str) -> Bytes {
    if text.starts_with(LINE_END) {
        Bytes::copy_from_slice(text.as_bytes())
    } else {
        Bytes::from(format!("[Client {}] {}", sender, text))
    }
}

/// Notice sent to the other clients once `id` has introduced itself
pub fn arrival_notice(id: ConnectionId) -> Bytes {
    format_broadcast(id, &format!("{}{}", ARRIVAL_TEXT, LINE_END))
}

/// Notice sent to the other clients when `id` closes its stream
pub fn departure_notice(id: ConnectionId) -> Bytes {
    format_broadcast(id, &format!("{}{}", DEPARTURE_TEXT, LINE_END))
}

/// Message sent only to `id` after its first relayed chunk
pub fn welcome_message(id: ConnectionId) -> Bytes {
    Bytes::from(format!("Welcome. Your Client Id is: {}{}", id, LINE_END))
}
