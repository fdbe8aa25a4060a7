//! Codec trait and the JSON-lines implementation.
//!
//! A "codec" (coder/decoder) converts between typed messages and raw
//! frames. The session layer doesn't care HOW messages are serialized; it
//! just needs something that implements the [`Codec`] trait.
//!
//! The two directions are deliberately asymmetric:
//!
//! - **decode** is forgiving. It tries each known kind in a fixed order and
//!   accepts the first one whose payload fits.
//! - **encode** is strict. It produces exactly one line of JSON followed by
//!   `\r\n`, omitting optional fields rather than emitting `null`.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::types::{
    ClientHello, ClientMessage, ClientState, FileInfo, ServerMessage,
};
use crate::ProtocolError;

/// Outbound line terminator.
pub const LINE_TERMINATOR: &[u8] = b"\r\n";

/// Converts frames to [`ServerMessage`]s and [`ClientMessage`]s to bytes.
///
/// `Send + Sync + 'static` because the codec lives inside the long-running
/// connection task, which Tokio may move between threads.
pub trait Codec: Send + Sync + 'static {
    /// Decodes one inbound frame (without its `\n`).
    ///
    /// # Errors
    /// Returns a decode variant of [`ProtocolError`] if the frame is not
    /// JSON, not an object, names no known kind, or carries a payload that
    /// cannot be recovered.
    fn decode(&self, frame: &[u8]) -> Result<ServerMessage, ProtocolError>;

    /// Encodes one outbound message, including the line terminator.
    ///
    /// # Errors
    /// Returns [`ProtocolError::Encode`] if serialization fails.
    fn encode(&self, message: &ClientMessage) -> Result<Vec<u8>, ProtocolError>;
}

// ---------------------------------------------------------------------------
// JsonLineCodec
// ---------------------------------------------------------------------------

/// The SyncPlay [`Codec`]: one JSON object per line.
///
/// ## Example
///
/// ```rust
/// use sinkplay_protocol::{ClientMessage, Codec, JsonLineCodec, ServerMessage};
///
/// let codec = JsonLineCodec;
///
/// let bytes = codec.encode(&ClientMessage::ListRequest).unwrap();
/// assert_eq!(bytes, b"{\"List\":null}\r\n");
///
/// let msg = codec
///     .decode(br#"{"Chat": {"username": "alice", "message": "hi"}}"#)
///     .unwrap();
/// assert!(matches!(msg, ServerMessage::Chat(_)));
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonLineCodec;

impl Codec for JsonLineCodec {
    fn decode(&self, frame: &[u8]) -> Result<ServerMessage, ProtocolError> {
        decode_server_message(frame)
    }

    fn encode(&self, message: &ClientMessage) -> Result<Vec<u8>, ProtocolError> {
        encode_client_message(message)
    }
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

/// Decodes the payload of one kind.
type KindDecoder = fn(Value) -> Result<ServerMessage, serde_json::Error>;

/// The order in which kinds are tried. Servers only ever send one key per
/// frame, so in practice this matters only for malformed multi-key frames,
/// where the first recoverable kind wins.
const DECODE_ORDER: [(&str, KindDecoder); 6] = [
    ("Error", |v| serde_json::from_value(v).map(ServerMessage::Error)),
    ("Chat", |v| serde_json::from_value(v).map(ServerMessage::Chat)),
    ("Hello", |v| serde_json::from_value(v).map(ServerMessage::Hello)),
    ("Set", |v| serde_json::from_value(v).map(ServerMessage::Set)),
    ("State", |v| serde_json::from_value(v).map(ServerMessage::State)),
    ("List", |v| serde_json::from_value(v).map(ServerMessage::List)),
];

/// Decodes one frame into a [`ServerMessage`].
pub fn decode_server_message(frame: &[u8]) -> Result<ServerMessage, ProtocolError> {
    // serde_json accepts trailing whitespace, so a `\r` left over from a
    // `\r\n` terminator is harmless here.
    let value: Value =
        serde_json::from_slice(frame).map_err(ProtocolError::InvalidJson)?;
    let Value::Object(mut object) = value else {
        return Err(ProtocolError::NotAnObject);
    };

    let mut first_failure = None;
    for (kind, decode) in DECODE_ORDER {
        let Some(payload) = object.remove(kind) else {
            continue;
        };
        match decode(payload) {
            Ok(message) => return Ok(message),
            Err(source) => {
                tracing::trace!(kind, error = %source, "payload did not match kind");
                if first_failure.is_none() {
                    first_failure = Some(ProtocolError::Malformed { kind, source });
                }
            }
        }
    }

    Err(first_failure.unwrap_or_else(|| unknown_kind(&object)))
}

fn unknown_kind(object: &Map<String, Value>) -> ProtocolError {
    let keys: Vec<&str> = object.keys().map(String::as_str).collect();
    if keys.is_empty() {
        ProtocolError::UnknownKind("<empty object>".to_string())
    } else {
        ProtocolError::UnknownKind(keys.join(", "))
    }
}

// ---------------------------------------------------------------------------
// Encoding
// ---------------------------------------------------------------------------

/// Wire shape of outbound messages. Externally tagged, so serde writes
/// `{"Hello": {...}}`, `{"Chat": "..."}`, `{"List": null}` and so on.
#[derive(Serialize)]
enum WireMessage<'a> {
    Hello(&'a ClientHello),
    Chat(&'a str),
    Set(WireSet<'a>),
    List(()),
    State(&'a ClientState),
}

#[derive(Serialize)]
struct WireSet<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    ready: Option<WireReady>,
    #[serde(skip_serializing_if = "Option::is_none")]
    file: Option<&'a FileInfo>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WireReady {
    is_ready: bool,
    manually_initiated: bool,
}

impl<'a> From<&'a ClientMessage> for WireMessage<'a> {
    fn from(message: &'a ClientMessage) -> Self {
        match message {
            ClientMessage::Hello(hello) => Self::Hello(hello),
            ClientMessage::Chat(text) => Self::Chat(text),
            ClientMessage::SetReady {
                is_ready,
                manually_initiated,
            } => Self::Set(WireSet {
                ready: Some(WireReady {
                    is_ready: *is_ready,
                    manually_initiated: *manually_initiated,
                }),
                file: None,
            }),
            ClientMessage::SetFile(file) => Self::Set(WireSet {
                ready: None,
                file: Some(file),
            }),
            ClientMessage::ListRequest => Self::List(()),
            ClientMessage::State(state) => Self::State(state),
        }
    }
}

/// Encodes a [`ClientMessage`] as one JSON line terminated by `\r\n`.
pub fn encode_client_message(message: &ClientMessage) -> Result<Vec<u8>, ProtocolError> {
    let mut bytes = serde_json::to_vec(&WireMessage::from(message))
        .map_err(ProtocolError::Encode)?;
    bytes.extend_from_slice(LINE_TERMINATOR);
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_garbage_returns_invalid_json() {
        let result = decode_server_message(b"not json at all");
        assert!(matches!(result, Err(ProtocolError::InvalidJson(_))));
    }

    #[test]
    fn test_decode_array_returns_not_an_object() {
        let result = decode_server_message(b"[1, 2, 3]");
        assert!(matches!(result, Err(ProtocolError::NotAnObject)));
    }

    #[test]
    fn test_decode_unknown_key_returns_unknown_kind() {
        let result = decode_server_message(br#"{"FlyToMoon": {"speed": 9000}}"#);
        match result {
            Err(ProtocolError::UnknownKind(keys)) => assert_eq!(keys, "FlyToMoon"),
            other => panic!("expected UnknownKind, got {other:?}"),
        }
    }

    #[test]
    fn test_decode_known_key_bad_payload_returns_malformed() {
        let result = decode_server_message(br#"{"Chat": {"username": 5}}"#);
        assert!(matches!(
            result,
            Err(ProtocolError::Malformed { kind: "Chat", .. })
        ));
    }

    #[test]
    fn test_decode_falls_through_to_next_matching_kind() {
        // A broken Error next to a valid Chat: the Chat still decodes.
        let frame = br#"{"Error": 17, "Chat": {"username": "a", "message": "b"}}"#;
        let msg = decode_server_message(frame).unwrap();
        assert_eq!(msg.kind(), "Chat");
    }

    #[test]
    fn test_decode_tolerates_trailing_carriage_return() {
        let msg = decode_server_message(b"{\"Error\": {\"message\": \"x\"}}\r").unwrap();
        assert_eq!(msg.kind(), "Error");
    }

    #[test]
    fn test_encode_appends_crlf() {
        let bytes = encode_client_message(&ClientMessage::Chat("hi".into())).unwrap();
        assert_eq!(bytes, b"{\"Chat\":\"hi\"}\r\n");
    }

    #[test]
    fn test_encode_list_request_has_explicit_null() {
        let bytes = encode_client_message(&ClientMessage::ListRequest).unwrap();
        assert_eq!(bytes, b"{\"List\":null}\r\n");
    }

    #[test]
    fn test_encode_is_single_line() {
        let bytes =
            encode_client_message(&ClientMessage::Chat("line one\nline two".into()))
                .unwrap();
        let body = &bytes[..bytes.len() - 2];
        assert!(!body.contains(&b'\n'), "embedded newlines must be escaped");
    }
}
