//! Compilation of backend tool declarations into invocable descriptors.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use super::executor::{ExecutorRegistry, ToolError, ToolExecutor, ToolOutcome};
use super::schema::{FieldValidator, ObjectValidator};
use crate::api::types::BackendTool;

/// Tool definition for function calling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Tool type (always "function")
    #[serde(rename = "type")]
    pub tool_type: String,
    /// Function definition
    pub function: FunctionDefinition,
}

/// Function definition for tool calling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDefinition {
    /// Function name
    pub name: String,
    /// Function description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// JSON schema for parameters
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Value>,
}

/// A compiled tool: metadata, argument validator and executor.
#[derive(Clone)]
pub struct ToolDescriptor {
    name: String,
    description: String,
    validator: ObjectValidator,
    executor: Arc<dyn ToolExecutor>,
}

impl ToolDescriptor {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn validator(&self) -> &ObjectValidator {
        &self.validator
    }

    /// Validate `input` and run the executor.
    pub async fn try_invoke(&self, input: &Value) -> Result<ToolOutcome, ToolError> {
        self.validator
            .validate(input)
            .map_err(|source| ToolError::InvalidArguments {
                tool: self.name.clone(),
                source,
            })?;
        self.executor.execute(&self.name, input).await
    }

    /// Invoke the tool on behalf of the agent.
    ///
    /// Failures are rendered into the returned text instead of being
    /// propagated; rejected arguments never reach the executor.
    pub async fn invoke(&self, input: &Value) -> ToolOutcome {
        match self.try_invoke(input).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::warn!("{}", e);
                e.to_string()
            }
        }
    }

    /// Function definition advertised to the remote agent.
    pub fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            tool_type: "function".to_string(),
            function: FunctionDefinition {
                name: self.name.clone(),
                description: Some(self.description.clone()).filter(|d| !d.is_empty()),
                parameters: Some(self.validator.to_json_schema()),
            },
        }
    }
}

impl fmt::Debug for ToolDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolDescriptor")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("validator", &self.validator)
            .finish_non_exhaustive()
    }
}

/// Turns backend declarations into [`ToolDescriptor`]s.
///
/// Compilation is total: unknown parameter types compile to unconstrained
/// fields, and names without a registered executor get the default one.
#[derive(Debug, Clone, Default)]
pub struct ToolCompiler {
    registry: ExecutorRegistry,
}

impl ToolCompiler {
    pub fn new(registry: ExecutorRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &ExecutorRegistry {
        &self.registry
    }

    /// Compile declarations in order. A repeated name keeps its first declaration.
    pub fn compile(&self, declarations: &[BackendTool]) -> Vec<ToolDescriptor> {
        let mut seen = HashSet::new();
        let mut compiled = Vec::with_capacity(declarations.len());

        for declaration in declarations {
            if !seen.insert(declaration.name.as_str()) {
                tracing::warn!(
                    "Duplicate tool declaration '{}' dropped",
                    declaration.name
                );
                continue;
            }
            compiled.push(self.compile_one(declaration));
        }

        tracing::debug!("Compiled {} tools", compiled.len());
        compiled
    }

    fn compile_one(&self, declaration: &BackendTool) -> ToolDescriptor {
        let fields = declaration
            .parameters
            .properties
            .iter()
            .map(|(name, spec)| FieldValidator::compile(name, spec))
            .collect();

        ToolDescriptor {
            name: declaration.name.clone(),
            description: declaration.description.clone(),
            validator: ObjectValidator::new(fields),
            executor: self.registry.resolve(&declaration.name),
        }
    }
}
