//! Tool executors and the registry the compiler resolves them from.
//!
//! Compilation never decides behavior itself: every tool name is looked up
//! in an [`ExecutorRegistry`], falling back to the default executor for
//! names nobody registered.

use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

use super::schema::ValidationError;

/// Name of the tool that surfaces a coaching tip to the user.
pub const COACH_TIP_TOOL: &str = "coach_tip";

/// Name of the tool the agent calls to end the conversation.
pub const END_CALL_TOOL: &str = "end_call";

/// Errors raised while invoking a tool.
///
/// These never abort a session; they are rendered into the tool result the
/// agent receives.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Invalid arguments for tool {tool}: {source}")]
    InvalidArguments {
        tool: String,
        #[source]
        source: ValidationError,
    },

    #[error("Tool {tool} failed: {message}")]
    ExecutionFailed { tool: String, message: String },
}

/// Result handed back to the agent after a tool call.
pub type ToolOutcome = String;

/// Behavior behind a tool name.
#[async_trait]
pub trait ToolExecutor: Send + Sync {
    /// Run the tool with already validated arguments.
    async fn execute(&self, tool_name: &str, args: &Value) -> Result<ToolOutcome, ToolError>;
}

/// Callback receiving a coaching tip.
pub type TipCallback = Arc<dyn Fn(&str) + Send + Sync>;

/// Callback invoked when the agent ends the call.
pub type EndCallCallback = Arc<dyn Fn() + Send + Sync>;

/// Fallback for tools without a registered executor.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultExecutor;

#[async_trait]
impl ToolExecutor for DefaultExecutor {
    async fn execute(&self, tool_name: &str, args: &Value) -> Result<ToolOutcome, ToolError> {
        tracing::info!("Executing tool {} with args: {}", tool_name, args);
        Ok(format!("Tool {tool_name} executed successfully"))
    }
}

/// Delivers the `tip` argument to the tip sink.
pub struct CoachTipExecutor {
    on_tip: TipCallback,
}

impl CoachTipExecutor {
    pub fn new(on_tip: TipCallback) -> Self {
        Self { on_tip }
    }
}

#[async_trait]
impl ToolExecutor for CoachTipExecutor {
    async fn execute(&self, tool_name: &str, args: &Value) -> Result<ToolOutcome, ToolError> {
        let Some(tip) = args.get("tip").and_then(Value::as_str) else {
            return Err(ToolError::ExecutionFailed {
                tool: tool_name.to_string(),
                message: "no tip provided".to_string(),
            });
        };
        tracing::debug!("Coaching tip: {}", tip);
        (self.on_tip)(tip);
        Ok(format!("Coaching tip delivered: {tip}"))
    }
}

/// Notifies the end-call sink.
pub struct EndCallExecutor {
    on_end_call: EndCallCallback,
}

impl EndCallExecutor {
    pub fn new(on_end_call: EndCallCallback) -> Self {
        Self { on_end_call }
    }
}

#[async_trait]
impl ToolExecutor for EndCallExecutor {
    async fn execute(&self, _tool_name: &str, _args: &Value) -> Result<ToolOutcome, ToolError> {
        tracing::info!("Agent requested end of call");
        (self.on_end_call)();
        Ok("Call ended successfully".to_string())
    }
}

/// Concurrent name-to-executor map with a default fallback.
#[derive(Clone)]
pub struct ExecutorRegistry {
    executors: Arc<DashMap<String, Arc<dyn ToolExecutor>>>,
    fallback: Arc<dyn ToolExecutor>,
}

impl ExecutorRegistry {
    /// Registry where every tool runs the default executor.
    pub fn new() -> Self {
        Self {
            executors: Arc::new(DashMap::new()),
            fallback: Arc::new(DefaultExecutor),
        }
    }

    /// Registry with the built-in `coach_tip` and `end_call` executors.
    pub fn with_callbacks(on_tip: TipCallback, on_end_call: EndCallCallback) -> Self {
        let registry = Self::new();
        registry.register(COACH_TIP_TOOL, Arc::new(CoachTipExecutor::new(on_tip)));
        registry.register(END_CALL_TOOL, Arc::new(EndCallExecutor::new(on_end_call)));
        registry
    }

    /// Register an executor, replacing any previous one for `name`.
    pub fn register(&self, name: impl Into<String>, executor: Arc<dyn ToolExecutor>) {
        self.executors.insert(name.into(), executor);
    }

    /// Replace the fallback used for unregistered names.
    pub fn with_fallback(mut self, fallback: Arc<dyn ToolExecutor>) -> Self {
        self.fallback = fallback;
        self
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.executors.contains_key(name)
    }

    /// Executor for `name`, or the fallback.
    pub fn resolve(&self, name: &str) -> Arc<dyn ToolExecutor> {
        self.executors
            .get(name)
            .map(|entry| Arc::clone(entry.value()))
            .unwrap_or_else(|| Arc::clone(&self.fallback))
    }
}

impl Default for ExecutorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ExecutorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<String> = self.executors.iter().map(|e| e.key().clone()).collect();
        names.sort();
        f.debug_struct("ExecutorRegistry")
            .field("executors", &names)
            .finish()
    }
}
