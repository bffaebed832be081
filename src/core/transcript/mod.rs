//! Canonical conversation transcript.
//!
//! The transport reports the same utterance several ways: streaming
//! chunks, a final transcript, and snapshots of its own conversation log.
//! [`Transcript`] folds all of them into one ordered list of items keyed by
//! item id, so observers render from a single source of truth.

mod item;
mod reconciler;

pub use item::{
    INAUDIBLE_MARKER, ItemKind, ItemStatus, TRANSCRIBING_PLACEHOLDER, TranscriptItem,
    TranscriptRole,
};
pub use reconciler::{SharedTranscript, Transcript};
