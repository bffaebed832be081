//! Realtime session control.
//!
//! This module drives one live, bidirectional conversation against an
//! externally supplied transport and turns the transport's event stream into
//! transcript updates.
//!
//! # Architecture
//!
//! - [`SessionController`] owns the lifecycle state machine
//! - [`RealtimeTransport`] is the narrow command surface of the transport
//! - [`EventSink`] is handed to the transport on open and routes events
//!   through the [`EventRouter`] until the session ends
//!
//! # Example
//!
//! ```rust,ignore
//! use coach_realtime::core::realtime::{SessionController, StaticToken};
//! use coach_realtime::core::tools::{ExecutorRegistry, ToolCompiler};
//! use std::sync::Arc;
//!
//! let registry = ExecutorRegistry::with_callbacks(
//!     Arc::new(|tip| println!("tip: {tip}")),
//!     Arc::new(|| println!("call ended")),
//! );
//! let controller = SessionController::new(transport, ToolCompiler::new(registry))
//!     .with_greeting("hi");
//!
//! controller.connect(&StaticToken::new(token), &tools, audio_config).await?;
//! controller.send_user_text("Can we start with my last project?").await?;
//! controller.disconnect().await;
//! ```

mod base;
pub mod messages;
mod router;
mod session;

pub use base::{
    OpenRequest, RealtimeError, RealtimeResult, RealtimeTransport, SessionProvisioner,
    SessionStatus, StaticToken, StatusCallback, TokenProvider,
};
pub use messages::{ClientEvent, ContentPart, ConversationItem, HistoryItem, TransportEvent};
pub use router::{EventObserver, EventRouter, EventSink, RouteOutcome};
pub use session::SessionController;
