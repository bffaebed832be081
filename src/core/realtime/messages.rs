//! Realtime session message types.
//!
//! Client events are what the controller asks the transport to send. Server
//! side, the transport hands back [`TransportEvent`]s: a closed union over the
//! tags the controller understands, plus an explicit `Unhandled` arm so that
//! nothing is absorbed silently.
//!
//! Recognised event tags:
//! - history_added - one item snapshot from the transport's conversation log
//! - history_updated - bulk snapshot of the conversation log
//! - conversation.item.input_audio_transcription.completed - user transcript
//! - response.audio_transcript.delta - assistant transcript chunk
//! - response.audio_transcript.done - assistant transcript complete
//! - error - non-fatal diagnostic

use serde::{Deserialize, Serialize};
use serde_json::Value;

// =============================================================================
// Conversation Items
// =============================================================================

/// Content part within a conversation item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentPart {
    /// Content type (input_text, text, input_audio, audio, output_audio)
    #[serde(rename = "type")]
    pub content_type: String,
    /// Text content
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Transcript of audio content
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transcript: Option<String>,
}

impl ContentPart {
    /// Plain text part as sent by the client.
    pub fn input_text(text: impl Into<String>) -> Self {
        Self {
            content_type: "input_text".to_string(),
            text: Some(text.into()),
            transcript: None,
        }
    }

    /// Displayable text carried by this part, if any.
    pub fn display_text(&self) -> Option<&str> {
        let value = match self.content_type.as_str() {
            "input_text" | "text" => self.text.as_deref(),
            "audio" | "input_audio" | "output_audio" => self.transcript.as_deref(),
            _ => None,
        };
        value.filter(|s| !s.is_empty())
    }
}

/// Conversation item as created by the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationItem {
    /// Item ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Item type
    #[serde(rename = "type")]
    pub item_type: String,
    /// Item role (user, assistant, system)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    /// Content parts
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub content: Vec<ContentPart>,
}

impl ConversationItem {
    /// A user-authored text message.
    pub fn user_text(id: Option<String>, text: impl Into<String>) -> Self {
        Self {
            id,
            item_type: "message".to_string(),
            role: Some("user".to_string()),
            content: vec![ContentPart::input_text(text)],
        }
    }
}

/// Snapshot of one item from the transport's own conversation log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryItem {
    /// Stable item identity
    #[serde(default, alias = "item_id")]
    pub item_id: String,
    /// Item kind (message, function_call, ...)
    #[serde(rename = "type", default)]
    pub item_type: String,
    /// Speaker role for message items
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    /// Transport-side status (in_progress, completed)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Content parts in order
    #[serde(default)]
    pub content: Vec<ContentPart>,
}

impl HistoryItem {
    /// Whether this snapshot describes a conversational message.
    pub fn is_message(&self) -> bool {
        self.item_type == "message"
    }
}

// =============================================================================
// Client Events (sent through the transport)
// =============================================================================

/// Client events the controller may push through the transport.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum ClientEvent {
    /// Create a conversation item
    #[serde(rename = "conversation.item.create")]
    ConversationItemCreate {
        /// Item to create
        item: ConversationItem,
    },

    /// Request a response
    #[serde(rename = "response.create")]
    ResponseCreate,

    /// Cancel the current response
    #[serde(rename = "response.cancel")]
    ResponseCancel,
}

// =============================================================================
// Transport Events (received from the transport)
// =============================================================================

/// Wire form of the recognised events.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
enum WireEvent {
    #[serde(rename = "history_added")]
    HistoryAdded { item: HistoryItem },

    #[serde(rename = "history_updated")]
    HistoryUpdated {
        #[serde(default)]
        items: Vec<HistoryItem>,
    },

    #[serde(rename = "conversation.item.input_audio_transcription.completed")]
    InputTranscriptionCompleted {
        #[serde(default)]
        item_id: String,
        #[serde(default)]
        transcript: Option<String>,
    },

    #[serde(rename = "response.audio_transcript.delta")]
    AudioTranscriptDelta {
        #[serde(default)]
        item_id: String,
        #[serde(default)]
        delta: Option<String>,
    },

    #[serde(rename = "response.audio_transcript.done")]
    AudioTranscriptDone {
        #[serde(default)]
        item_id: String,
        #[serde(default)]
        transcript: Option<String>,
    },

    #[serde(rename = "error")]
    Error {
        #[serde(default, alias = "message")]
        error: Value,
    },
}

/// An event delivered by the transport for the active session.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    /// Single item snapshot
    HistoryAdded(HistoryItem),
    /// Bulk item snapshot
    HistoryUpdated(Vec<HistoryItem>),
    /// Assistant transcript chunk
    TranscriptionDelta { item_id: String, delta: String },
    /// User input transcription finished
    TranscriptionCompleted { item_id: String, transcript: String },
    /// Assistant transcript finished
    ResponseTranscriptDone { item_id: String, transcript: String },
    /// Non-fatal error reported by the transport
    Error(Value),
    /// Any other tag, kept verbatim for diagnostics
    Unhandled { event_type: String, payload: Value },
}

impl TransportEvent {
    /// Decode a raw JSON event. Never fails: anything unrecognised or
    /// malformed becomes [`TransportEvent::Unhandled`].
    pub fn from_json(payload: Value) -> Self {
        let event_type = payload
            .get("type")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        match serde_json::from_value::<WireEvent>(payload.clone()) {
            Ok(event) => event.into(),
            Err(e) => {
                if is_recognised_tag(&event_type) {
                    tracing::warn!("Malformed {} event: {}", event_type, e);
                }
                TransportEvent::Unhandled {
                    event_type,
                    payload,
                }
            }
        }
    }

    /// Decode an event from its JSON text form.
    pub fn from_text(text: &str) -> Self {
        match serde_json::from_str::<Value>(text) {
            Ok(value) => Self::from_json(value),
            Err(e) => {
                tracing::warn!("Failed to parse transport event: {} - {}", e, text);
                TransportEvent::Unhandled {
                    event_type: String::new(),
                    payload: Value::String(text.to_string()),
                }
            }
        }
    }

    /// The event tag as it appears on the wire.
    pub fn event_type(&self) -> &str {
        match self {
            TransportEvent::HistoryAdded(_) => "history_added",
            TransportEvent::HistoryUpdated(_) => "history_updated",
            TransportEvent::TranscriptionDelta { .. } => "response.audio_transcript.delta",
            TransportEvent::TranscriptionCompleted { .. } => {
                "conversation.item.input_audio_transcription.completed"
            }
            TransportEvent::ResponseTranscriptDone { .. } => "response.audio_transcript.done",
            TransportEvent::Error(_) => "error",
            TransportEvent::Unhandled { event_type, .. } => event_type,
        }
    }
}

impl From<WireEvent> for TransportEvent {
    fn from(event: WireEvent) -> Self {
        match event {
            WireEvent::HistoryAdded { item } => TransportEvent::HistoryAdded(item),
            WireEvent::HistoryUpdated { items } => TransportEvent::HistoryUpdated(items),
            WireEvent::InputTranscriptionCompleted {
                item_id,
                transcript,
            } => TransportEvent::TranscriptionCompleted {
                item_id,
                transcript: transcript.unwrap_or_default(),
            },
            WireEvent::AudioTranscriptDelta { item_id, delta } => {
                TransportEvent::TranscriptionDelta {
                    item_id,
                    delta: delta.unwrap_or_default(),
                }
            }
            WireEvent::AudioTranscriptDone {
                item_id,
                transcript,
            } => TransportEvent::ResponseTranscriptDone {
                item_id,
                transcript: transcript.unwrap_or_default(),
            },
            WireEvent::Error { error } => TransportEvent::Error(error),
        }
    }
}

fn is_recognised_tag(tag: &str) -> bool {
    matches!(
        tag,
        "history_added"
            | "history_updated"
            | "conversation.item.input_audio_transcription.completed"
            | "response.audio_transcript.delta"
            | "response.audio_transcript.done"
            | "error"
    )
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_client_event_serialization() {
        let event = ClientEvent::ConversationItemCreate {
            item: ConversationItem::user_text(Some("abc".to_string()), "hi"),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "conversation.item.create");
        assert_eq!(json["item"]["id"], "abc");
        assert_eq!(json["item"]["role"], "user");
        assert_eq!(json["item"]["content"][0]["type"], "input_text");
        assert_eq!(json["item"]["content"][0]["text"], "hi");

        let json = serde_json::to_string(&ClientEvent::ResponseCreate).unwrap();
        assert!(json.contains("response.create"));
    }

    #[test]
    fn test_delta_event() {
        let event = TransportEvent::from_json(json!({
            "type": "response.audio_transcript.delta",
            "response_id": "resp_1",
            "item_id": "item_1",
            "output_index": 0,
            "content_index": 0,
            "delta": "Hel"
        }));
        assert_eq!(
            event,
            TransportEvent::TranscriptionDelta {
                item_id: "item_1".to_string(),
                delta: "Hel".to_string()
            }
        );
    }

    #[test]
    fn test_input_transcription_completed_event() {
        let event = TransportEvent::from_json(json!({
            "type": "conversation.item.input_audio_transcription.completed",
            "item_id": "item_2",
            "content_index": 0,
            "transcript": "I am ready"
        }));
        assert_eq!(
            event,
            TransportEvent::TranscriptionCompleted {
                item_id: "item_2".to_string(),
                transcript: "I am ready".to_string()
            }
        );
    }

    #[test]
    fn test_missing_transcript_defaults_to_empty() {
        let event = TransportEvent::from_json(json!({
            "type": "response.audio_transcript.done",
            "item_id": "item_3"
        }));
        assert_eq!(
            event,
            TransportEvent::ResponseTranscriptDone {
                item_id: "item_3".to_string(),
                transcript: String::new()
            }
        );
    }

    #[test]
    fn test_history_events() {
        let event = TransportEvent::from_json(json!({
            "type": "history_added",
            "item": {
                "itemId": "item_4",
                "type": "message",
                "role": "user",
                "status": "completed",
                "content": [{"type": "input_audio", "transcript": "hello"}]
            }
        }));
        match event {
            TransportEvent::HistoryAdded(item) => {
                assert_eq!(item.item_id, "item_4");
                assert!(item.is_message());
                assert_eq!(item.content[0].display_text(), Some("hello"));
            }
            other => panic!("Expected HistoryAdded, got {other:?}"),
        }

        let event = TransportEvent::from_json(json!({
            "type": "history_updated",
            "items": [{"item_id": "a", "type": "message"}, {"itemId": "b", "type": "function_call"}]
        }));
        match event {
            TransportEvent::HistoryUpdated(items) => {
                assert_eq!(items.len(), 2);
                assert_eq!(items[0].item_id, "a");
                assert!(!items[1].is_message());
            }
            other => panic!("Expected HistoryUpdated, got {other:?}"),
        }
    }

    #[test]
    fn test_error_event() {
        let event = TransportEvent::from_json(json!({
            "type": "error",
            "error": {"type": "invalid_request_error", "message": "bad"}
        }));
        match event {
            TransportEvent::Error(err) => assert_eq!(err["message"], "bad"),
            other => panic!("Expected Error, got {other:?}"),
        }
    }

    #[test]
    fn test_unknown_tag_is_unhandled() {
        let payload = json!({"type": "rate_limits.updated", "rate_limits": []});
        let event = TransportEvent::from_json(payload.clone());
        assert_eq!(event.event_type(), "rate_limits.updated");
        assert_eq!(
            event,
            TransportEvent::Unhandled {
                event_type: "rate_limits.updated".to_string(),
                payload
            }
        );
    }

    #[test]
    fn test_malformed_known_tag_is_unhandled() {
        let event = TransportEvent::from_json(json!({"type": "history_added"}));
        assert_eq!(event.event_type(), "history_added");
        assert!(matches!(event, TransportEvent::Unhandled { .. }));
    }

    #[test]
    fn test_invalid_json_text() {
        let event = TransportEvent::from_text("not json");
        assert!(matches!(event, TransportEvent::Unhandled { .. }));
    }

    #[test]
    fn test_display_text() {
        let audio_without_transcript = ContentPart {
            content_type: "audio".to_string(),
            text: None,
            transcript: None,
        };
        assert_eq!(audio_without_transcript.display_text(), None);

        let image = ContentPart {
            content_type: "input_image".to_string(),
            text: Some("ignored".to_string()),
            transcript: None,
        };
        assert_eq!(image.display_text(), None);

        assert_eq!(ContentPart::input_text("hey").display_text(), Some("hey"));
    }
}
