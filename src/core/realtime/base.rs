//! Base traits and types for driving a realtime conversational session.
//!
//! The session controller never talks to the wire itself. It drives an
//! externally supplied [`RealtimeTransport`] through a narrow command surface
//! and receives events back through the [`EventSink`] handed over on open.
//!
//! # Collaborators
//!
//! - [`TokenProvider`] - yields the ephemeral token for one session
//! - [`SessionProvisioner`] - yields token, tool declarations and audio config
//! - [`RealtimeTransport`] - opens, closes and commands the live session

use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use zeroize::Zeroize;

use super::messages::ClientEvent;
use super::router::EventSink;
use crate::api::types::{AudioConfig, EphemeralSessionData, InterviewSetup};
use crate::core::tools::ToolDescriptor;

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur while driving a realtime session.
#[derive(Debug, Error)]
pub enum RealtimeError {
    /// Token or session provisioning was rejected or malformed
    #[error("Provisioning failed: {0}")]
    ProvisioningFailed(String),

    /// The transport failed to open or to carry a command
    #[error("Transport failed: {0}")]
    TransportFailed(String),

    /// Operation requires a connected session
    #[error("Inactive session: not connected")]
    NotConnected,

    /// A disconnect superseded the connect attempt
    #[error("Connect cancelled: {0}")]
    Cancelled(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

/// Result type for realtime operations.
pub type RealtimeResult<T> = Result<T, RealtimeError>;

// =============================================================================
// Session Status
// =============================================================================

/// Lifecycle status of the session controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionStatus {
    /// No session; initial and terminal state
    #[default]
    Disconnected,
    /// Provisioning or transport setup in flight
    Connecting,
    /// Transport open and ready
    Connected,
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionStatus::Disconnected => write!(f, "DISCONNECTED"),
            SessionStatus::Connecting => write!(f, "CONNECTING"),
            SessionStatus::Connected => write!(f, "CONNECTED"),
        }
    }
}

// =============================================================================
// Callback Types
// =============================================================================

/// Callback invoked on every status transition.
pub type StatusCallback = Arc<dyn Fn(SessionStatus) + Send + Sync>;

// =============================================================================
// Collaborators
// =============================================================================

/// Source of the short-lived credential authorizing one session.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Fetch an ephemeral token. Any error aborts the connect attempt.
    async fn fetch_token(&self) -> RealtimeResult<String>;
}

/// A token that was already obtained, e.g. as part of session provisioning.
#[derive(Clone)]
pub struct StaticToken(String);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

impl fmt::Debug for StaticToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("StaticToken(***)")
    }
}

impl Drop for StaticToken {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

#[async_trait]
impl TokenProvider for StaticToken {
    async fn fetch_token(&self) -> RealtimeResult<String> {
        if self.0.is_empty() {
            return Err(RealtimeError::ProvisioningFailed(
                "No ephemeral token provided".to_string(),
            ));
        }
        Ok(self.0.clone())
    }
}

/// Backend that provisions everything a session needs in one call.
#[async_trait]
pub trait SessionProvisioner: Send + Sync {
    /// Provision token, tool declarations and audio configuration.
    async fn provision(&self, setup: &InterviewSetup) -> RealtimeResult<EphemeralSessionData>;
}

/// Everything the transport needs to open one session.
pub struct OpenRequest {
    /// Ephemeral credential for this session only
    pub ephemeral_token: String,
    /// Audio configuration passed through untouched
    pub audio_config: Option<AudioConfig>,
    /// Compiled tools the remote agent may invoke
    pub tools: Arc<[ToolDescriptor]>,
    /// Where the transport delivers events for this session
    pub events: EventSink,
}

impl fmt::Debug for OpenRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenRequest")
            .field("ephemeral_token", &"***")
            .field("audio_config", &self.audio_config)
            .field("tools", &self.tools.iter().map(|t| t.name()).collect::<Vec<_>>())
            .finish()
    }
}

/// Command surface of the external realtime transport.
///
/// Implementations use interior mutability: the controller shares one
/// transport across connects and may call `close` while `open` is pending.
/// `interrupt` and `mute` are fire-and-forget and must not block.
#[async_trait]
pub trait RealtimeTransport: Send + Sync {
    /// Open a session. Events must be delivered in order through `request.events`.
    async fn open(&self, request: OpenRequest) -> RealtimeResult<()>;

    /// Close the session if one is open.
    async fn close(&self) -> RealtimeResult<()>;

    /// Append a user-authored text message and request a response.
    async fn send_message(&self, text: &str) -> RealtimeResult<()>;

    /// Send a raw client event.
    async fn send_event(&self, event: ClientEvent) -> RealtimeResult<()>;

    /// Cancel the in-flight agent response.
    fn interrupt(&self) -> RealtimeResult<()>;

    /// Toggle audio streaming without tearing the session down.
    fn mute(&self, muted: bool) -> RealtimeResult<()>;
}
