//! Mock collaborators for session tests
//!
//! - `MockTransport` records every command, keeps the event sink it was
//!   opened with and can hold `open` until released
//! - `MockProvisioner` returns canned provisioning results
//! - `GatedToken` holds `fetch_token` until released

// Allow dead code in test infrastructure - not every test binary uses every helper
#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Notify;

use coach_realtime::api::{EphemeralSessionData, InterviewSetup};
use coach_realtime::core::realtime::{
    ClientEvent, EventSink, OpenRequest, RealtimeError, RealtimeResult, RealtimeTransport,
    RouteOutcome, SessionProvisioner, TokenProvider,
};
use coach_realtime::core::tools::ToolDescriptor;

/// Command observed by the mock transport
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Open { token: String, tools: Vec<String> },
    Close,
    Message(String),
    Event(ClientEvent),
    Interrupt,
    Mute(bool),
}

/// Pause point shared between a mock and the test driving it
#[derive(Default)]
pub struct Gate {
    pub entered: Notify,
    pub release: Notify,
}

impl Gate {
    async fn pass(&self) {
        self.entered.notify_one();
        self.release.notified().await;
    }
}

#[derive(Default)]
pub struct MockTransport {
    commands: Mutex<Vec<Command>>,
    sink: Mutex<Option<EventSink>>,
    tools: Mutex<Option<Arc<[ToolDescriptor]>>>,
    fail_open: AtomicBool,
    fail_commands: AtomicBool,
    open_gate: Option<Arc<Gate>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_open() -> Self {
        let transport = Self::default();
        transport.fail_open.store(true, Ordering::SeqCst);
        transport
    }

    pub fn gated(gate: Arc<Gate>) -> Self {
        Self {
            open_gate: Some(gate),
            ..Default::default()
        }
    }

    pub fn fail_commands(&self, fail: bool) {
        self.fail_commands.store(fail, Ordering::SeqCst);
    }

    pub fn commands(&self) -> Vec<Command> {
        self.commands.lock().clone()
    }

    pub fn count(&self, predicate: impl Fn(&Command) -> bool) -> usize {
        self.commands.lock().iter().filter(|c| predicate(c)).count()
    }

    /// Sink handed over by the most recent `open`
    pub fn sink(&self) -> Option<EventSink> {
        self.sink.lock().clone()
    }

    /// Deliver a raw event through the most recent sink
    pub fn emit(&self, event: Value) -> RouteOutcome {
        match self.sink() {
            Some(sink) => sink.dispatch_json(event),
            None => panic!("transport was never opened"),
        }
    }

    /// Invoke a tool the way the remote agent would
    pub async fn call_tool(&self, name: &str, args: Value) -> Option<String> {
        let tools = self.tools.lock().clone()?;
        let tool = tools.iter().find(|t| t.name() == name)?.clone();
        Some(tool.invoke(&args).await)
    }

    fn record(&self, command: Command) -> RealtimeResult<()> {
        self.commands.lock().push(command);
        if self.fail_commands.load(Ordering::SeqCst) {
            return Err(RealtimeError::TransportFailed("mock failure".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl RealtimeTransport for MockTransport {
    async fn open(&self, request: OpenRequest) -> RealtimeResult<()> {
        self.commands.lock().push(Command::Open {
            token: request.ephemeral_token.clone(),
            tools: request.tools.iter().map(|t| t.name().to_string()).collect(),
        });
        *self.sink.lock() = Some(request.events.clone());
        *self.tools.lock() = Some(Arc::clone(&request.tools));

        if let Some(gate) = &self.open_gate {
            gate.pass().await;
        }

        if self.fail_open.load(Ordering::SeqCst) {
            return Err(RealtimeError::TransportFailed(
                "connection refused".to_string(),
            ));
        }
        Ok(())
    }

    async fn close(&self) -> RealtimeResult<()> {
        self.record(Command::Close)
    }

    async fn send_message(&self, text: &str) -> RealtimeResult<()> {
        self.record(Command::Message(text.to_string()))
    }

    async fn send_event(&self, event: ClientEvent) -> RealtimeResult<()> {
        self.record(Command::Event(event))
    }

    fn interrupt(&self) -> RealtimeResult<()> {
        self.record(Command::Interrupt)
    }

    fn mute(&self, muted: bool) -> RealtimeResult<()> {
        self.record(Command::Mute(muted))
    }
}

/// Provisioner returning a fixed result
pub struct MockProvisioner {
    result: Mutex<Option<RealtimeResult<EphemeralSessionData>>>,
    pub calls: Mutex<Vec<InterviewSetup>>,
}

impl MockProvisioner {
    pub fn succeeding(data: EphemeralSessionData) -> Self {
        Self {
            result: Mutex::new(Some(Ok(data))),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            result: Mutex::new(Some(Err(RealtimeError::ProvisioningFailed(
                message.to_string(),
            )))),
            calls: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl SessionProvisioner for MockProvisioner {
    async fn provision(&self, setup: &InterviewSetup) -> RealtimeResult<EphemeralSessionData> {
        self.calls.lock().push(setup.clone());
        self.result
            .lock()
            .take()
            .unwrap_or_else(|| Err(RealtimeError::ProvisioningFailed("exhausted".to_string())))
    }
}

/// Token provider that waits on a gate before answering
pub struct GatedToken {
    pub gate: Arc<Gate>,
    pub token: String,
}

#[async_trait]
impl TokenProvider for GatedToken {
    async fn fetch_token(&self) -> RealtimeResult<String> {
        self.gate.pass().await;
        Ok(self.token.clone())
    }
}

/// Token provider that always fails
pub struct FailingToken;

#[async_trait]
impl TokenProvider for FailingToken {
    async fn fetch_token(&self) -> RealtimeResult<String> {
        Err(RealtimeError::ProvisioningFailed("HTTP 503".to_string()))
    }
}
