//! Backend tool declarations compiled into tools the remote agent can call.
//!
//! Compilation is pure and happens once per connect. Behavior is injected
//! through an [`ExecutorRegistry`], so the same declarations can be wired
//! to different sinks (UI, tests, CLI).

mod compiler;
mod executor;
mod schema;

pub use compiler::{FunctionDefinition, ToolCompiler, ToolDefinition, ToolDescriptor};
pub use executor::{
    COACH_TIP_TOOL, CoachTipExecutor, DefaultExecutor, END_CALL_TOOL, EndCallCallback,
    EndCallExecutor, ExecutorRegistry, TipCallback, ToolError, ToolExecutor, ToolOutcome,
};
pub use schema::{FieldValidator, ObjectValidator, ParamType, ValidationError};
