//! Transcript reconciliation.
//!
//! Partial (delta), final (completion) and snapshot (history) events all
//! land here and are folded into one ordered list keyed by item id.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use super::item::{
    INAUDIBLE_MARKER, ItemKind, ItemStatus, TRANSCRIBING_PLACEHOLDER, TranscriptItem,
    TranscriptRole,
};
use crate::api::types::{ReportRole, ReportTurn};
use crate::core::realtime::messages::HistoryItem;

/// Transcript shared between the event router and the rest of the application.
pub type SharedTranscript = Arc<RwLock<Transcript>>;

/// Ordered, id-keyed transcript.
///
/// Iteration order is the order in which ids were first seen; later updates
/// never move an item.
#[derive(Debug, Default)]
pub struct Transcript {
    items: Vec<TranscriptItem>,
    index: HashMap<String, usize>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty transcript ready to be shared.
    pub fn shared() -> SharedTranscript {
        Arc::new(RwLock::new(Self::new()))
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, item_id: &str) -> Option<&TranscriptItem> {
        self.index.get(item_id).map(|&i| &self.items[i])
    }

    pub fn items(&self) -> &[TranscriptItem] {
        &self.items
    }

    pub fn iter(&self) -> impl Iterator<Item = &TranscriptItem> {
        self.items.iter()
    }

    fn get_mut(&mut self, item_id: &str) -> Option<&mut TranscriptItem> {
        match self.index.get(item_id) {
            Some(&i) => self.items.get_mut(i),
            None => None,
        }
    }

    fn insert(&mut self, item: TranscriptItem) -> &mut TranscriptItem {
        let position = self.items.len();
        self.index.insert(item.item_id.clone(), position);
        self.items.push(item);
        &mut self.items[position]
    }

    /// Add a message directly, e.g. a locally authored user message.
    ///
    /// Returns `false` when the id is already present; the existing item is
    /// left untouched.
    pub fn add_message(
        &mut self,
        item_id: &str,
        role: TranscriptRole,
        text: &str,
        hidden: bool,
    ) -> bool {
        if self.index.contains_key(item_id) {
            return false;
        }
        let item = self.insert(TranscriptItem::message(
            item_id.to_string(),
            role,
            text.to_string(),
        ));
        item.is_hidden = hidden;
        true
    }

    /// Add a non-conversational marker. Breadcrumbs are created finalized.
    pub fn add_breadcrumb(&mut self, item_id: &str, text: &str) -> bool {
        if self.index.contains_key(item_id) {
            return false;
        }
        let item = self.insert(TranscriptItem::message(
            item_id.to_string(),
            TranscriptRole::Assistant,
            text.to_string(),
        ));
        item.kind = ItemKind::Breadcrumb;
        item.status = ItemStatus::Done;
        true
    }

    /// Merge a snapshot from the transport's conversation log.
    ///
    /// Non-message items are ignored. New ids need a known role; an empty
    /// extraction stores the transcription placeholder. Existing items only
    /// take non-empty text, and finalized items keep their text.
    pub fn upsert_from_history_snapshot(&mut self, snapshot: &HistoryItem) {
        if !snapshot.is_message() || snapshot.item_id.is_empty() {
            return;
        }

        let text = extract_message_text(snapshot);

        if let Some(item) = self.get_mut(&snapshot.item_id) {
            if item.is_done() {
                tracing::trace!("Snapshot for finalized item {} ignored", item.item_id);
                return;
            }
            if !text.is_empty() {
                item.text = text;
            }
            return;
        }

        let Some(role) = snapshot.role.as_deref().and_then(TranscriptRole::parse) else {
            tracing::debug!(
                "Snapshot for unknown item {} has no usable role: {:?}",
                snapshot.item_id,
                snapshot.role
            );
            return;
        };

        let text = if text.is_empty() {
            TRANSCRIBING_PLACEHOLDER.to_string()
        } else {
            text
        };
        self.insert(TranscriptItem::message(
            snapshot.item_id.clone(),
            role,
            text,
        ));
    }

    /// Append a partial transcript chunk.
    ///
    /// Unknown ids are created as assistant items, since deltas only come from
    /// agent speech. Finalized items are never reopened.
    pub fn apply_delta(&mut self, item_id: &str, delta: &str) {
        if item_id.is_empty() {
            return;
        }

        match self.get_mut(item_id) {
            Some(item) if item.is_done() => {
                tracing::trace!("Delta for finalized item {} ignored", item_id);
            }
            Some(item) => {
                if item.is_placeholder() {
                    item.text.clear();
                }
                item.text.push_str(delta);
                item.status = ItemStatus::InProgress;
            }
            None => {
                self.insert(TranscriptItem::message(
                    item_id.to_string(),
                    TranscriptRole::Assistant,
                    delta.to_string(),
                ));
            }
        }
    }

    /// Finalize an item with its complete transcript.
    ///
    /// An empty or line-break-only transcript is stored as [`INAUDIBLE_MARKER`].
    /// `role` is only used when the item has not been seen yet. Applying a
    /// completion to an already finalized item changes nothing.
    pub fn apply_completion(&mut self, item_id: &str, final_text: &str, role: TranscriptRole) {
        if item_id.is_empty() {
            return;
        }

        let text = if final_text.is_empty() || final_text == "\n" {
            INAUDIBLE_MARKER.to_string()
        } else {
            final_text.to_string()
        };

        let item = match self.get_mut(item_id) {
            Some(item) if item.is_done() => {
                tracing::trace!("Duplicate completion for item {} ignored", item_id);
                return;
            }
            Some(item) => item,
            None => self.insert(TranscriptItem::message(
                item_id.to_string(),
                role,
                String::new(),
            )),
        };
        item.text = text;
        item.status = ItemStatus::Done;
    }

    /// Drop every item. Only called on an explicit reset.
    pub fn clear(&mut self) {
        self.items.clear();
        self.index.clear();
    }

    /// Visible conversational turns in transcript order, for report generation.
    pub fn to_report_turns(&self) -> Vec<ReportTurn> {
        self.items
            .iter()
            .filter(|item| item.kind == ItemKind::Message && !item.is_hidden)
            .filter(|item| !item.text.is_empty())
            .map(|item| ReportTurn {
                role: match item.role {
                    TranscriptRole::User => ReportRole::User,
                    TranscriptRole::Assistant => ReportRole::Assistant,
                },
                content: item.text.clone(),
            })
            .collect()
    }
}

/// Join the displayable text of every content part, in order, by newlines.
fn extract_message_text(snapshot: &HistoryItem) -> String {
    snapshot
        .content
        .iter()
        .filter_map(|part| part.display_text())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::realtime::messages::ContentPart;

    fn snapshot(id: &str, role: &str, parts: Vec<ContentPart>) -> HistoryItem {
        HistoryItem {
            item_id: id.to_string(),
            item_type: "message".to_string(),
            role: Some(role.to_string()),
            status: None,
            content: parts,
        }
    }

    fn audio(transcript: Option<&str>) -> ContentPart {
        ContentPart {
            content_type: "audio".to_string(),
            text: None,
            transcript: transcript.map(str::to_string),
        }
    }

    #[test]
    fn test_completion_with_empty_text_is_inaudible() {
        let mut transcript = Transcript::new();
        transcript.apply_completion("a", "", TranscriptRole::User);
        transcript.apply_completion("b", "\n", TranscriptRole::User);

        assert_eq!(transcript.get("a").unwrap().text, INAUDIBLE_MARKER);
        assert_eq!(transcript.get("b").unwrap().text, INAUDIBLE_MARKER);
        assert!(transcript.get("a").unwrap().is_done());
    }

    #[test]
    fn test_completion_supersedes_deltas() {
        let mut transcript = Transcript::new();
        for delta in ["Hel", "lo ", "there"] {
            transcript.apply_delta("a", delta);
        }
        assert_eq!(transcript.get("a").unwrap().text, "Hello there");
        assert_eq!(transcript.get("a").unwrap().status, ItemStatus::InProgress);

        transcript.apply_completion("a", "Hello there!", TranscriptRole::Assistant);
        let item = transcript.get("a").unwrap();
        assert_eq!(item.text, "Hello there!");
        assert_eq!(item.status, ItemStatus::Done);
        assert_eq!(item.role, TranscriptRole::Assistant);
    }

    #[test]
    fn test_completion_is_idempotent_and_terminal() {
        let mut transcript = Transcript::new();
        transcript.apply_completion("a", "first", TranscriptRole::User);
        transcript.apply_completion("a", "second", TranscriptRole::User);
        transcript.apply_delta("a", " more");

        let item = transcript.get("a").unwrap();
        assert_eq!(item.text, "first");
        assert_eq!(item.status, ItemStatus::Done);
    }

    #[test]
    fn test_first_seen_ordering() {
        let mut transcript = Transcript::new();
        transcript.apply_delta("b", "x");
        transcript.upsert_from_history_snapshot(&snapshot("a", "user", vec![]));
        transcript.apply_delta("c", "y");
        transcript.apply_delta("a", "late");
        transcript.apply_completion("b", "done", TranscriptRole::Assistant);
        transcript.upsert_from_history_snapshot(&snapshot(
            "c",
            "assistant",
            vec![audio(Some("snap"))],
        ));

        let ids: Vec<_> = transcript.iter().map(|i| i.item_id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a", "c"]);
        assert_eq!(transcript.len(), 3);
    }

    #[test]
    fn test_snapshot_extracts_text_in_part_order() {
        let mut transcript = Transcript::new();
        transcript.upsert_from_history_snapshot(&snapshot(
            "a",
            "user",
            vec![
                ContentPart::input_text("typed"),
                audio(None),
                audio(Some("spoken")),
            ],
        ));
        assert_eq!(transcript.get("a").unwrap().text, "typed\nspoken");
        assert_eq!(transcript.get("a").unwrap().role, TranscriptRole::User);
    }

    #[test]
    fn test_snapshot_placeholder_and_non_regression() {
        let mut transcript = Transcript::new();
        transcript.upsert_from_history_snapshot(&snapshot("a", "user", vec![audio(None)]));
        assert_eq!(transcript.get("a").unwrap().text, TRANSCRIBING_PLACEHOLDER);

        transcript.apply_completion("a", "hello", TranscriptRole::User);
        transcript.upsert_from_history_snapshot(&snapshot("a", "user", vec![audio(None)]));
        assert_eq!(transcript.get("a").unwrap().text, "hello");

        // finalized text wins over a differing snapshot
        transcript.upsert_from_history_snapshot(&snapshot("a", "user", vec![audio(Some("hullo"))]));
        assert_eq!(transcript.get("a").unwrap().text, "hello");
    }

    #[test]
    fn test_snapshot_updates_in_progress_text() {
        let mut transcript = Transcript::new();
        transcript.apply_delta("a", "partial");
        transcript.upsert_from_history_snapshot(&snapshot(
            "a",
            "assistant",
            vec![audio(Some("partial answer"))],
        ));
        assert_eq!(transcript.get("a").unwrap().text, "partial answer");

        transcript.upsert_from_history_snapshot(&snapshot("a", "assistant", vec![]));
        assert_eq!(transcript.get("a").unwrap().text, "partial answer");
    }

    #[test]
    fn test_snapshot_ignores_non_messages_and_unknown_roles() {
        let mut transcript = Transcript::new();
        let mut call = snapshot("f", "assistant", vec![]);
        call.item_type = "function_call".to_string();
        transcript.upsert_from_history_snapshot(&call);
        transcript.upsert_from_history_snapshot(&snapshot("s", "system", vec![]));
        assert!(transcript.is_empty());
    }

    #[test]
    fn test_delta_replaces_placeholder() {
        let mut transcript = Transcript::new();
        transcript.upsert_from_history_snapshot(&snapshot("a", "assistant", vec![]));
        transcript.apply_delta("a", "Hi");
        assert_eq!(transcript.get("a").unwrap().text, "Hi");
    }

    #[test]
    fn test_clear() {
        let mut transcript = Transcript::new();
        transcript.apply_delta("a", "x");
        transcript.clear();
        assert!(transcript.is_empty());
        assert!(transcript.get("a").is_none());

        transcript.apply_delta("a", "y");
        assert_eq!(transcript.get("a").unwrap().text, "y");
    }

    #[test]
    fn test_add_message_keeps_existing() {
        let mut transcript = Transcript::new();
        assert!(transcript.add_message("m", TranscriptRole::User, "hi", true));
        assert!(!transcript.add_message("m", TranscriptRole::Assistant, "other", false));
        let item = transcript.get("m").unwrap();
        assert!(item.is_hidden);
        assert_eq!(item.text, "hi");
    }

    #[test]
    fn test_report_turns_skip_hidden_and_breadcrumbs() {
        let mut transcript = Transcript::new();
        transcript.add_message("greeting", TranscriptRole::User, "hi", true);
        transcript.add_breadcrumb("crumb", "session started");
        transcript.apply_completion("q", "Tell me about yourself", TranscriptRole::Assistant);
        transcript.apply_completion("r", "I build things", TranscriptRole::User);

        let turns = transcript.to_report_turns();
        assert_eq!(
            turns,
            vec![
                ReportTurn {
                    role: ReportRole::Assistant,
                    content: "Tell me about yourself".to_string()
                },
                ReportTurn {
                    role: ReportRole::User,
                    content: "I build things".to_string()
                },
            ]
        );
    }
}
