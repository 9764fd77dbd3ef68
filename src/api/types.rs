//! API request and response types

use crate::state_machine::FlowState;
use crate::tools::ToolDefinition;
use serde::Serialize;

/// Response listing the tool surface
#[derive(Debug, Serialize)]
pub struct ToolsResponse {
    pub tools: Vec<ToolDefinition>,
}

/// Response with a single conversation
#[derive(Debug, Serialize)]
pub struct ConversationResponse {
    pub conversation: FlowState,
    pub next_step: Option<&'static str>,
}

impl From<FlowState> for ConversationResponse {
    fn from(conversation: FlowState) -> Self {
        let next_step = conversation.next_step();
        Self {
            conversation,
            next_step,
        }
    }
}

/// Liveness plus the count of writes that missed the durable store
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub degraded_writes: u64,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub kind: &'static str,
}

impl ErrorResponse {
    pub fn new(kind: &'static str, message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
            kind,
        }
    }
}
