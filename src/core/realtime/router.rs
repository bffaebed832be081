//! Event routing from the transport into the transcript.
//!
//! The transport holds an [`EventSink`] for the lifetime of one session.
//! Once the session is torn down the sink goes stale and any late events
//! are dropped instead of touching the transcript.

use serde_json::Value;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use super::messages::TransportEvent;
use crate::core::transcript::{SharedTranscript, TranscriptRole};

/// Observer for events the router does not handle itself.
pub type EventObserver = Arc<dyn Fn(&str, &Value) + Send + Sync>;

/// Which path handled an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteOutcome {
    /// Partial transcript appended
    Delta,
    /// Item finalized
    Completed,
    /// Snapshot merged; carries the number of items in the snapshot
    Snapshot(usize),
    /// Transport error logged
    Error,
    /// Passed through to logging and the observer
    Unhandled,
    /// Sink no longer belongs to a live session
    Stale,
}

/// Dispatches transport events to the transcript reconciler.
pub struct EventRouter {
    transcript: SharedTranscript,
    observer: Option<EventObserver>,
}

impl EventRouter {
    pub fn new(transcript: SharedTranscript) -> Self {
        Self {
            transcript,
            observer: None,
        }
    }

    pub fn with_observer(mut self, observer: EventObserver) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn transcript(&self) -> &SharedTranscript {
        &self.transcript
    }

    pub fn route(&self, event: TransportEvent) -> RouteOutcome {
        match event {
            TransportEvent::TranscriptionDelta { item_id, delta } => {
                self.transcript.write().apply_delta(&item_id, &delta);
                RouteOutcome::Delta
            }
            TransportEvent::TranscriptionCompleted {
                item_id,
                transcript,
            } => {
                tracing::debug!("User transcription completed for {}", item_id);
                self.transcript
                    .write()
                    .apply_completion(&item_id, &transcript, TranscriptRole::User);
                RouteOutcome::Completed
            }
            TransportEvent::ResponseTranscriptDone {
                item_id,
                transcript,
            } => {
                tracing::debug!("Assistant transcript done for {}", item_id);
                self.transcript
                    .write()
                    .apply_completion(&item_id, &transcript, TranscriptRole::Assistant);
                RouteOutcome::Completed
            }
            TransportEvent::HistoryAdded(item) => {
                self.transcript.write().upsert_from_history_snapshot(&item);
                RouteOutcome::Snapshot(1)
            }
            TransportEvent::HistoryUpdated(items) => {
                let mut transcript = self.transcript.write();
                for item in &items {
                    transcript.upsert_from_history_snapshot(item);
                }
                RouteOutcome::Snapshot(items.len())
            }
            TransportEvent::Error(error) => {
                tracing::warn!("Realtime transport reported an error: {}", error);
                RouteOutcome::Error
            }
            TransportEvent::Unhandled {
                event_type,
                payload,
            } => {
                tracing::debug!("Unhandled transport event: {}", event_type);
                if let Some(observer) = &self.observer {
                    observer(&event_type, &payload);
                }
                RouteOutcome::Unhandled
            }
        }
    }
}

/// Session-scoped entry point through which the transport delivers events.
///
/// Cheap to clone. All clones go stale together when the session ends.
#[derive(Clone)]
pub struct EventSink {
    router: Arc<EventRouter>,
    live: Arc<AtomicBool>,
    generation: u64,
}

impl EventSink {
    pub(crate) fn new(router: Arc<EventRouter>, generation: u64) -> Self {
        Self {
            router,
            live: Arc::new(AtomicBool::new(true)),
            generation,
        }
    }

    /// Session generation this sink was issued for.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_live(&self) -> bool {
        self.live.load(Ordering::Acquire)
    }

    pub(crate) fn invalidate(&self) {
        self.live.store(false, Ordering::Release);
    }

    pub fn dispatch(&self, event: TransportEvent) -> RouteOutcome {
        if !self.is_live() {
            tracing::trace!(
                "Dropping {} for ended session {}",
                event.event_type(),
                self.generation
            );
            return RouteOutcome::Stale;
        }
        self.router.route(event)
    }

    pub fn dispatch_json(&self, payload: Value) -> RouteOutcome {
        self.dispatch(TransportEvent::from_json(payload))
    }

    pub fn dispatch_text(&self, text: &str) -> RouteOutcome {
        self.dispatch(TransportEvent::from_text(text))
    }
}

impl std::fmt::Debug for EventSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventSink")
            .field("generation", &self.generation)
            .field("live", &self.is_live())
            .finish()
    }
}
