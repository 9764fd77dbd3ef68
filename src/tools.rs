//! Tool surface of the offer flow
//!
//! Each tool is a stateless singleton; the flow machine reaches it through
//! `ToolContext` on every call.

mod authenticate;
mod conversation;
mod submit;

pub use authenticate::AuthenticateUserTool;
pub use conversation::{DownloadUserInfoTool, GetFlowStatusTool, LogoutTool, PrepareNewOfferTool};
pub use submit::SubmitOfferTool;

use crate::runtime::{FlowError, FlowMachine};
use crate::state_machine::FlowState;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;

/// `error_kind` for input that failed to parse or validate
pub const INVALID_INPUT: &str = "invalid_input";

/// Result from tool execution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolOutput {
    pub success: bool,
    pub output: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<String>,
}

impl ToolOutput {
    pub fn success(output: impl Into<String>) -> Self {
        Self {
            success: true,
            output: output.into(),
            data: None,
            error_kind: None,
        }
    }

    pub fn error(kind: &str, message: impl Into<String>) -> Self {
        Self {
            success: false,
            output: message.into(),
            data: None,
            error_kind: Some(kind.to_string()),
        }
    }

    pub fn invalid_input(message: impl std::fmt::Display) -> Self {
        Self::error(INVALID_INPUT, format!("Invalid input: {message}"))
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }
}

impl From<FlowError> for ToolOutput {
    fn from(err: FlowError) -> Self {
        let mut output = Self::error(err.kind(), err.to_string());
        if let FlowError::Persistence { retries_left, .. } = err {
            output = output.with_data(json!({ "retries_left": retries_left }));
        }
        output
    }
}

/// Everything a tool needs for one invocation
#[derive(Clone)]
pub struct ToolContext {
    flow: Arc<FlowMachine>,
}

impl ToolContext {
    pub fn new(flow: Arc<FlowMachine>) -> Self {
        Self { flow }
    }

    pub fn flow(&self) -> &FlowMachine {
        &self.flow
    }
}

/// Trait for tools the agent can invoke
#[async_trait]
pub trait Tool: Send + Sync {
    /// Tool name
    fn name(&self) -> &str;

    /// Description steering the agent
    fn description(&self) -> String;

    /// JSON schema for tool input
    fn input_schema(&self) -> Value;

    /// Execute the tool with context provided via `ToolContext`
    async fn run(&self, input: Value, ctx: ToolContext) -> ToolOutput;
}

/// Published description of a tool
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

/// Collection of tools exposed to the agent
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
}

impl ToolRegistry {
    /// The six flow tools, in call order
    pub fn standard() -> Self {
        let tools: Vec<Arc<dyn Tool>> = vec![
            Arc::new(AuthenticateUserTool),
            Arc::new(DownloadUserInfoTool),
            Arc::new(PrepareNewOfferTool),
            Arc::new(SubmitOfferTool),
            Arc::new(GetFlowStatusTool),
            Arc::new(LogoutTool),
        ];
        Self { tools }
    }

    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools
            .iter()
            .map(|t| ToolDefinition {
                name: t.name().to_string(),
                description: t.description(),
                input_schema: t.input_schema(),
            })
            .collect()
    }

    /// Execute a tool by name; `None` if no such tool exists
    pub async fn execute(&self, name: &str, input: Value, ctx: ToolContext) -> Option<ToolOutput> {
        for tool in &self.tools {
            if tool.name() == name {
                return Some(tool.run(input, ctx).await);
            }
        }
        None
    }
}

/// Fields common to every successful response
fn base_payload(state: &FlowState) -> serde_json::Map<String, Value> {
    let mut map = serde_json::Map::new();
    map.insert("conversation_id".into(), json!(state.conversation_id));
    map.insert("stage".into(), json!(state.stage));
    map.insert("next_step".into(), json!(state.next_step()));
    map
}

/// Build a success output from a state plus tool-specific fields
fn respond(state: &FlowState, output: String, extra: Value) -> ToolOutput {
    let mut payload = base_payload(state);
    if let Value::Object(fields) = extra {
        payload.extend(fields);
    }
    ToolOutput::success(output).with_data(Value::Object(payload))
}

fn next_step_text(state: &FlowState) -> String {
    match state.next_step() {
        Some(tool) => format!("Next step: {tool}."),
        None => "The conversation is finished.".to_string(),
    }
}
