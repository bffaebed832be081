use serde::{Deserialize, Serialize};
use std::fmt;
use time::OffsetDateTime;

/// Text stored for a message whose content has not been transcribed yet.
pub const TRANSCRIBING_PLACEHOLDER: &str = "[Transcribing...]";

/// Text stored when a transcription finished without recognisable speech.
pub const INAUDIBLE_MARKER: &str = "[inaudible]";

/// Role of the speaker of a transcript item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TranscriptRole {
    /// User speech or text
    User,
    /// Agent speech or text
    Assistant,
}

impl TranscriptRole {
    /// Parse a role as reported by the transport. Unknown roles yield `None`.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "user" => Some(TranscriptRole::User),
            "assistant" => Some(TranscriptRole::Assistant),
            _ => None,
        }
    }
}

impl fmt::Display for TranscriptRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TranscriptRole::User => write!(f, "user"),
            TranscriptRole::Assistant => write!(f, "assistant"),
        }
    }
}

/// Progress of a transcript item. Only ever moves `InProgress -> Done`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ItemStatus {
    InProgress,
    Done,
}

/// Kind of a transcript item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ItemKind {
    /// Conversational message
    Message,
    /// Diagnostic marker rendered outside the conversation
    Breadcrumb,
}

/// One entry of the canonical transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptItem {
    pub item_id: String,
    pub role: TranscriptRole,
    pub text: String,
    pub status: ItemStatus,
    pub is_hidden: bool,
    pub kind: ItemKind,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl TranscriptItem {
    pub(crate) fn message(item_id: String, role: TranscriptRole, text: String) -> Self {
        Self {
            item_id,
            role,
            text,
            status: ItemStatus::InProgress,
            is_hidden: false,
            kind: ItemKind::Message,
            created_at: OffsetDateTime::now_utc(),
        }
    }

    pub fn is_done(&self) -> bool {
        self.status == ItemStatus::Done
    }

    /// Whether the stored text is still the transcription placeholder.
    pub fn is_placeholder(&self) -> bool {
        self.text == TRANSCRIBING_PLACEHOLDER
    }
}
