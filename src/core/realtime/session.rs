//! Session lifecycle controller.
//!
//! Owns the `DISCONNECTED -> CONNECTING -> CONNECTED -> DISCONNECTED` state
//! machine and drives the transport through it. Every connect attempt is
//! tagged with a generation number; `disconnect` bumps the generation, so an
//! attempt that resumes after a disconnect notices it was superseded, undoes
//! whatever it opened and reports [`RealtimeError::Cancelled`].

use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use uuid::Uuid;

use super::base::{
    OpenRequest, RealtimeError, RealtimeResult, RealtimeTransport, SessionProvisioner,
    SessionStatus, StatusCallback, TokenProvider,
};
use super::messages::{ClientEvent, ConversationItem};
use super::router::{EventRouter, EventSink};
use crate::api::types::{AudioConfig, BackendTool, InterviewSetup};
use crate::core::tools::{ToolCompiler, ToolDescriptor};
use crate::core::transcript::{SharedTranscript, Transcript, TranscriptRole};

/// Resources held while a session is being opened or is open.
struct ActiveSession {
    sink: EventSink,
    tools: Arc<[ToolDescriptor]>,
}

struct SessionState {
    status: SessionStatus,
    generation: u64,
    session: Option<ActiveSession>,
}

/// Client-side controller for one realtime conversation at a time.
pub struct SessionController {
    transport: Arc<dyn RealtimeTransport>,
    compiler: ToolCompiler,
    router: Arc<EventRouter>,
    state: Mutex<SessionState>,
    status_callbacks: RwLock<Vec<StatusCallback>>,
    muted: AtomicBool,
    greeting: Option<String>,
}

impl SessionController {
    pub fn new(transport: Arc<dyn RealtimeTransport>, compiler: ToolCompiler) -> Self {
        Self {
            transport,
            compiler,
            router: Arc::new(EventRouter::new(Transcript::shared())),
            state: Mutex::new(SessionState {
                status: SessionStatus::Disconnected,
                generation: 0,
                session: None,
            }),
            status_callbacks: RwLock::new(Vec::new()),
            muted: AtomicBool::new(false),
            greeting: None,
        }
    }

    /// Use a custom router, e.g. one with an event observer attached.
    pub fn with_router(mut self, router: EventRouter) -> Self {
        self.router = Arc::new(router);
        self
    }

    /// Message sent on the user's behalf right after every connect.
    pub fn with_greeting(mut self, greeting: impl Into<String>) -> Self {
        let greeting = greeting.into();
        self.greeting = Some(greeting).filter(|g| !g.trim().is_empty());
        self
    }

    /// Initial mute preference.
    pub fn with_muted(self, muted: bool) -> Self {
        self.muted.store(muted, Ordering::SeqCst);
        self
    }

    pub fn status(&self) -> SessionStatus {
        self.state.lock().status
    }

    pub fn is_muted(&self) -> bool {
        self.muted.load(Ordering::SeqCst)
    }

    /// Register an observer invoked on every status transition.
    pub fn on_status_change(&self, callback: StatusCallback) {
        self.status_callbacks.write().push(callback);
    }

    pub fn transcript(&self) -> SharedTranscript {
        Arc::clone(self.router.transcript())
    }

    /// Discard the transcript. Disconnecting never does this on its own.
    pub fn reset_transcript(&self) {
        self.router.transcript().write().clear();
    }

    /// Tools compiled for the connected session, empty otherwise.
    pub fn active_tools(&self) -> Arc<[ToolDescriptor]> {
        let state = self.state.lock();
        match (&state.session, state.status) {
            (Some(session), SessionStatus::Connected) => Arc::clone(&session.tools),
            _ => Arc::from(Vec::new()),
        }
    }

    /// Connect using a token provider and tool declarations obtained elsewhere.
    ///
    /// Returns `Ok(false)` without side effects when a session is already
    /// connecting or connected.
    pub async fn connect(
        &self,
        token_provider: &dyn TokenProvider,
        tools: &[BackendTool],
        audio_config: Option<AudioConfig>,
    ) -> RealtimeResult<bool> {
        let Some(generation) = self.begin_connect() else {
            return Ok(false);
        };

        let token = match token_provider.fetch_token().await {
            Ok(token) => token,
            Err(e) => return Err(self.abort_connect(generation, e)),
        };

        self.open_session(generation, token, tools, audio_config)
            .await
            .map(|()| true)
    }

    /// Connect after provisioning token, tools and audio config in one call.
    pub async fn connect_provisioned(
        &self,
        provisioner: &dyn SessionProvisioner,
        setup: &InterviewSetup,
    ) -> RealtimeResult<bool> {
        let Some(generation) = self.begin_connect() else {
            return Ok(false);
        };

        let data = match provisioner.provision(setup).await {
            Ok(data) => data,
            Err(e) => return Err(self.abort_connect(generation, e)),
        };
        if data.ephemeral_token.is_empty() {
            return Err(self.abort_connect(
                generation,
                RealtimeError::ProvisioningFailed("No ephemeral token provided".to_string()),
            ));
        }

        let token = data.ephemeral_token.clone();
        self.open_session(generation, token, &data.tools, data.audio_config.clone())
            .await
            .map(|()| true)
    }

    /// Tear down the session. Valid in any state and idempotent.
    pub async fn disconnect(&self) {
        let (previous, session) = {
            let mut state = self.state.lock();
            state.generation += 1;
            let previous = state.status;
            state.status = SessionStatus::Disconnected;
            (previous, state.session.take())
        };

        if let Some(session) = session {
            session.sink.invalidate();
            if let Err(e) = self.transport.close().await {
                tracing::warn!("Error closing realtime transport: {}", e);
            }
        }

        if previous != SessionStatus::Disconnected {
            tracing::info!("Realtime session disconnected");
            self.notify(SessionStatus::Disconnected);
        }
    }

    /// Send a user text message and request a response.
    pub async fn send_user_text(&self, text: &str) -> RealtimeResult<()> {
        self.ensure_connected()?;
        self.transport.send_message(text).await.inspect_err(|e| {
            tracing::error!("Failed to send user text: {}", e);
        })
    }

    /// Send a message on the user's behalf without showing it in the transcript.
    ///
    /// Once the transport accepts the item it is recorded as a hidden user
    /// item under a fresh id and the transport is asked to respond to it.
    pub async fn send_simulated_user_message(&self, text: &str) -> RealtimeResult<()> {
        self.ensure_connected()?;

        let item_id = Uuid::new_v4().simple().to_string();
        self.transport
            .send_event(ClientEvent::ConversationItemCreate {
                item: ConversationItem::user_text(Some(item_id.clone()), text),
            })
            .await?;

        self.router
            .transcript()
            .write()
            .add_message(&item_id, TranscriptRole::User, text, true);

        self.transport.send_event(ClientEvent::ResponseCreate).await
    }

    /// Cancel the agent's current response. No-op without a connected session.
    pub fn interrupt(&self) {
        if self.status() != SessionStatus::Connected {
            return;
        }
        if let Err(e) = self.transport.interrupt() {
            tracing::warn!("Failed to interrupt response: {}", e);
        }
    }

    /// Record the mute preference and forward it to a connected session.
    pub fn mute(&self, muted: bool) {
        self.muted.store(muted, Ordering::SeqCst);
        if self.status() == SessionStatus::Connected {
            self.apply_mute(muted);
        }
    }

    fn apply_mute(&self, muted: bool) {
        if let Err(e) = self.transport.mute(muted) {
            tracing::warn!("Failed to apply mute={}: {}", muted, e);
        }
    }

    fn ensure_connected(&self) -> RealtimeResult<()> {
        if self.status() == SessionStatus::Connected {
            Ok(())
        } else {
            Err(RealtimeError::NotConnected)
        }
    }

    /// Enter `Connecting` and return the attempt's generation, or `None`
    /// when a session already exists.
    fn begin_connect(&self) -> Option<u64> {
        let generation = {
            let mut state = self.state.lock();
            if state.status != SessionStatus::Disconnected {
                tracing::debug!("Connect ignored: session is {}", state.status);
                return None;
            }
            state.generation += 1;
            state.status = SessionStatus::Connecting;
            state.generation
        };
        tracing::info!("Connecting realtime session (generation {})", generation);
        self.notify(SessionStatus::Connecting);
        Some(generation)
    }

    /// Roll a failed attempt back to `Disconnected`.
    ///
    /// If the attempt was already superseded the state belongs to someone
    /// else and only a cancellation is reported.
    fn abort_connect(&self, generation: u64, error: RealtimeError) -> RealtimeError {
        let session = {
            let mut state = self.state.lock();
            if state.generation != generation {
                return cancelled();
            }
            state.status = SessionStatus::Disconnected;
            state.session.take()
        };
        if let Some(session) = session {
            session.sink.invalidate();
        }
        tracing::error!("Realtime session connect failed: {}", error);
        self.notify(SessionStatus::Disconnected);
        error
    }

    async fn open_session(
        &self,
        generation: u64,
        ephemeral_token: String,
        declarations: &[BackendTool],
        audio_config: Option<AudioConfig>,
    ) -> RealtimeResult<()> {
        let tools: Arc<[ToolDescriptor]> = self.compiler.compile(declarations).into();
        let sink = EventSink::new(Arc::clone(&self.router), generation);

        {
            let mut state = self.state.lock();
            if state.generation != generation {
                return Err(cancelled());
            }
            state.session = Some(ActiveSession {
                sink: sink.clone(),
                tools: Arc::clone(&tools),
            });
        }

        let request = OpenRequest {
            ephemeral_token,
            audio_config,
            tools,
            events: sink.clone(),
        };
        if let Err(e) = self.transport.open(request).await {
            sink.invalidate();
            return Err(self.abort_connect(generation, e));
        }

        // A superseded attempt may only close the transport while no newer
        // attempt has claimed it.
        let superseded = {
            let mut state = self.state.lock();
            if state.generation == generation {
                state.status = SessionStatus::Connected;
                None
            } else {
                Some(state.status == SessionStatus::Disconnected)
            }
        };
        if let Some(owns_transport) = superseded {
            sink.invalidate();
            if owns_transport {
                if let Err(e) = self.transport.close().await {
                    tracing::warn!("Error closing superseded transport: {}", e);
                }
            } else {
                tracing::debug!(
                    "Connect generation {} superseded by a newer attempt; leaving transport open",
                    generation
                );
            }
            return Err(cancelled());
        }

        tracing::info!("Realtime session connected (generation {})", generation);
        self.notify(SessionStatus::Connected);

        self.apply_mute(self.is_muted());

        if let Some(greeting) = &self.greeting {
            if let Err(e) = self.send_simulated_user_message(greeting).await {
                tracing::warn!("Failed to send greeting: {}", e);
            }
        }

        Ok(())
    }

    fn notify(&self, status: SessionStatus) {
        let callbacks = self.status_callbacks.read().clone();
        for callback in callbacks {
            callback(status);
        }
    }
}

fn cancelled() -> RealtimeError {
    RealtimeError::Cancelled("disconnect requested while connecting".to_string())
}
