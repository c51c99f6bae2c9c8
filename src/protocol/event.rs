//! Realtime event message types.
//!
//! Every message on the wire, in either direction, is one JSON [`Event`]
//! tagged by its `type`. Events synthesized from batch completions use the
//! same struct, so handlers cannot tell the two sources apart.
//!
//! # Event Types
//!
//! | Direction | Events |
//! |-----------|--------|
//! | Client → Server | `session.update`, `input_audio_buffer.*`, `conversation.item.create`, `response.create` |
//! | Server → Client | `session.updated`, `response.*`, `error` |

// ============================================================================
// Imports
// ============================================================================

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::Result;

// ============================================================================
// Event Types
// ============================================================================

/// Known values of [`Event::event_type`].
pub mod event_type {
    /// Client updates session configuration.
    pub const SESSION_UPDATE: &str = "session.update";
    /// Server confirms a session update.
    pub const SESSION_UPDATED: &str = "session.updated";
    /// Client appends base64 audio.
    pub const INPUT_AUDIO_BUFFER_APPEND: &str = "input_audio_buffer.append";
    /// Client commits the audio buffer.
    pub const INPUT_AUDIO_BUFFER_COMMIT: &str = "input_audio_buffer.commit";
    /// Client appends one video frame.
    pub const INPUT_VIDEO_FRAME_APPEND: &str = "input_audio_buffer.append_video_frame";
    /// Client adds a conversation item (e.g. a function call output).
    pub const CONVERSATION_ITEM_CREATE: &str = "conversation.item.create";
    /// Client asks for a response.
    pub const RESPONSE_CREATE: &str = "response.create";
    /// A response has started.
    pub const RESPONSE_CREATED: &str = "response.created";
    /// An output item was added to a response.
    pub const RESPONSE_OUTPUT_ITEM_ADDED: &str = "response.output_item.added";
    /// Incremental response text.
    pub const RESPONSE_TEXT_DELTA: &str = "response.text.delta";
    /// Full response text.
    pub const RESPONSE_TEXT_DONE: &str = "response.text.done";
    /// Incremental base64 response audio.
    pub const RESPONSE_AUDIO_DELTA: &str = "response.audio.delta";
    /// Response audio finished.
    pub const RESPONSE_AUDIO_DONE: &str = "response.audio.done";
    /// Incremental audio transcript.
    pub const RESPONSE_AUDIO_TRANSCRIPT_DELTA: &str = "response.audio_transcript.delta";
    /// Full audio transcript.
    pub const RESPONSE_AUDIO_TRANSCRIPT_DONE: &str = "response.audio_transcript.done";
    /// Function call arguments complete.
    pub const RESPONSE_FUNCTION_CALL_ARGUMENTS_DONE: &str =
        "response.function_call_arguments.done";
    /// A response has finished.
    pub const RESPONSE_DONE: &str = "response.done";
    /// Server-side error.
    pub const ERROR: &str = "error";
}

// ============================================================================
// Event
// ============================================================================

/// A realtime protocol message.
///
/// Identity is `(type, event_id)`. Optional fields that are empty are
/// omitted on the wire; unknown fields are kept in [`Event::extra`] so an
/// event survives a decode/encode pass unchanged.
///
/// # Format
///
/// ```json
/// {
///   "type": "response.text.delta",
///   "event_id": "event_...",
///   "client_timestamp": 1730000000000,
///   "response_id": "resp_...",
///   "item_id": "item_...",
///   "delta": "Hel"
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Event type identifier, see [`event_type`].
    #[serde(rename = "type")]
    pub event_type: String,

    /// Event identifier.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub event_id: String,

    /// Milliseconds since the Unix epoch, stamped by the client on send.
    #[serde(default, skip_serializing_if = "is_zero")]
    pub client_timestamp: i64,

    /// Milliseconds since the Unix epoch, stamped by the server.
    #[serde(default, skip_serializing_if = "is_zero")]
    pub server_timestamp: i64,

    /// Response correlation id.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub response_id: String,

    /// Item correlation id.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub item_id: String,

    /// Function call correlation id.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub call_id: String,

    /// Incremental text or base64 audio.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub delta: String,

    /// Complete text of a finished response part.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    /// Complete audio transcript.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transcript: Option<String>,

    /// Base64 audio appended by the client.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub audio: String,

    /// Raw video frame bytes, base64 on the wire.
    #[serde(
        default,
        skip_serializing_if = "Vec::is_empty",
        with = "frame_base64"
    )]
    pub video_frame: Vec<u8>,

    /// Session configuration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session: Option<Session>,

    /// Conversation item.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item: Option<Item>,

    /// Server error details.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorDetail>,

    /// Fields this crate does not model.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Event {
    /// Creates an empty event of the given type.
    #[inline]
    #[must_use]
    pub fn new(event_type: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            ..Self::default()
        }
    }

    /// Creates a video-frame append event carrying raw frame bytes.
    #[inline]
    #[must_use]
    pub fn video_frame(frame: impl Into<Vec<u8>>) -> Self {
        Self {
            video_frame: frame.into(),
            ..Self::new(event_type::INPUT_VIDEO_FRAME_APPEND)
        }
    }

    /// Returns `true` if the event has the given type.
    #[inline]
    #[must_use]
    pub fn is(&self, event_type: &str) -> bool {
        self.event_type == event_type
    }

    /// Returns the session instructions when present and non-empty.
    #[must_use]
    pub fn session_instructions(&self) -> Option<&str> {
        self.session
            .as_ref()
            .map(|s| s.instructions.as_str())
            .filter(|s| !s.is_empty())
    }

    /// Sets the client timestamp to now unless one is already set.
    pub fn stamp_client_timestamp(&mut self) {
        if self.client_timestamp <= 0 {
            self.client_timestamp = now_millis();
        }
    }

    /// Serializes the event to a JSON text frame.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Json`] if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parses an event from a JSON text frame.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Json`] if the text is not a valid event.
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }
}

// ============================================================================
// Session
// ============================================================================

/// Session configuration carried by `session.update` / `session.updated`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// System prompt. Also used as the text part of batched frame requests.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub instructions: String,

    /// Output modalities (`text`, `audio`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modalities: Option<Vec<String>>,

    /// Voice name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voice: Option<String>,

    /// Input audio format (e.g. `wav`, `pcm`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_audio_format: Option<String>,

    /// Output audio format.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_audio_format: Option<String>,

    /// Turn detection settings, passed through untouched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub turn_detection: Option<Value>,

    /// Tool definitions, passed through untouched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<Value>>,

    /// Vendor beta options.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub beta_fields: Option<BetaFields>,

    /// Fields this crate does not model.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Beta session options.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BetaFields {
    /// Chat mode (`audio`, `video_passive`, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chat_mode: Option<String>,

    /// TTS source.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tts_source: Option<String>,

    /// Whether the server may search on its own.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_search: Option<bool>,

    /// Cloned-voice sample.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tts_cloned: Option<TtsCloned>,

    /// Fields this crate does not model.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Cloned-voice payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TtsCloned {
    /// Base64 reference audio.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub audio: String,

    /// Transcript of the reference audio.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub text: String,
}

// ============================================================================
// Item
// ============================================================================

/// A conversation item.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Item {
    /// Item id.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,

    /// Item type (`message`, `function_call`, `function_call_output`).
    #[serde(rename = "type", default, skip_serializing_if = "String::is_empty")]
    pub item_type: String,

    /// Role of the author.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub role: String,

    /// Call correlation id for function call items.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub call_id: String,

    /// Function name.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,

    /// JSON-encoded function arguments.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub arguments: String,

    /// Function output.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub output: String,

    /// Content parts, passed through untouched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<Vec<Value>>,

    /// Fields this crate does not model.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

// ============================================================================
// ErrorDetail
// ============================================================================

/// Error payload of an `error` event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Error category.
    #[serde(rename = "type", default, skip_serializing_if = "String::is_empty")]
    pub error_type: String,

    /// Error code.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub code: String,

    /// Human-readable message.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub message: String,
}

// ============================================================================
// Helpers
// ============================================================================

/// Current wall-clock time in milliseconds since the Unix epoch.
#[must_use]
pub fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or_default()
}

fn is_zero(value: &i64) -> bool {
    *value == 0
}

/// Serde adapter encoding frame bytes as standard base64.
mod frame_base64 {
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = Option::<String>::deserialize(deserializer)?.unwrap_or_default();
        STANDARD
            .decode(encoded.as_bytes())
            .map_err(serde::de::Error::custom)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    #[test]
    fn test_new_sets_type_only() {
        let event = Event::new(event_type::RESPONSE_CREATE);
        assert_eq!(
            serde_json::to_value(&event).unwrap(),
            json!({ "type": "response.create" })
        );
    }

    #[test]
    fn test_video_frame_base64_on_wire() {
        let event = Event::video_frame(vec![0xff, 0xd8, 0xff]);
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "input_audio_buffer.append_video_frame");
        assert_eq!(value["video_frame"], "/9j/");

        let parsed: Event = serde_json::from_value(value).unwrap();
        assert_eq!(parsed.video_frame, vec![0xff, 0xd8, 0xff]);
    }

    #[test]
    fn test_invalid_base64_frame_rejected() {
        let text = r#"{"type":"input_audio_buffer.append_video_frame","video_frame":"***"}"#;
        assert!(Event::from_json(text).is_err());
    }

    #[test]
    fn test_null_frame_is_empty() {
        let text = r#"{"type":"input_audio_buffer.append_video_frame","video_frame":null}"#;
        let event = Event::from_json(text).unwrap();
        assert!(event.video_frame.is_empty());
    }

    #[test]
    fn test_session_instructions() {
        let text = r#"{"type":"session.update","session":{"instructions":"describe the scene"}}"#;
        let event = Event::from_json(text).unwrap();
        assert!(event.is(event_type::SESSION_UPDATE));
        assert_eq!(event.session_instructions(), Some("describe the scene"));

        let empty = Event::from_json(r#"{"type":"session.update","session":{}}"#).unwrap();
        assert_eq!(empty.session_instructions(), None);
    }

    #[test]
    fn test_beta_fields_tts_cloned() {
        let text = r#"{
            "type": "session.update",
            "session": {
                "beta_fields": {
                    "chat_mode": "video_passive",
                    "tts_cloned": { "audio": "UklGRg==", "text": "hello" }
                }
            }
        }"#;
        let event = Event::from_json(text).unwrap();
        let beta = event.session.unwrap().beta_fields.unwrap();
        assert_eq!(beta.chat_mode.as_deref(), Some("video_passive"));
        assert_eq!(beta.tts_cloned.unwrap().text, "hello");
    }

    #[test]
    fn test_unknown_fields_preserved() {
        let text = r#"{"type":"response.done","response":{"status":"completed"},"usage":3}"#;
        let event = Event::from_json(text).unwrap();
        assert_eq!(event.extra["usage"], 3);

        let back: Value = serde_json::from_str(&event.to_json().unwrap()).unwrap();
        assert_eq!(back["response"]["status"], "completed");
    }

    #[test]
    fn test_item_call_id() {
        let text = r#"{"type":"conversation.item.create","item":{"type":"function_call_output","call_id":"call_1","output":"{}"}}"#;
        let event = Event::from_json(text).unwrap();
        let item = event.item.unwrap();
        assert_eq!(item.item_type, "function_call_output");
        assert_eq!(item.call_id, "call_1");
    }

    #[test]
    fn test_stamp_client_timestamp() {
        let mut event = Event::new(event_type::RESPONSE_CREATE);
        event.stamp_client_timestamp();
        assert!(event.client_timestamp > 0);

        let mut preset = Event::new(event_type::RESPONSE_CREATE);
        preset.client_timestamp = 42;
        preset.stamp_client_timestamp();
        assert_eq!(preset.client_timestamp, 42);
    }

    #[test]
    fn test_error_event() {
        let text = r#"{"type":"error","error":{"type":"invalid_request_error","code":"1214","message":"bad"}}"#;
        let event = Event::from_json(text).unwrap();
        assert_eq!(event.error.unwrap().code, "1214");
    }
}
