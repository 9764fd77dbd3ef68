//! Tools that act on an existing conversation by id alone

use super::{next_step_text, respond, Tool, ToolContext, ToolOutput};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

#[derive(Debug, Deserialize)]
struct ConversationInput {
    conversation_id: String,
}

/// Parse `{"conversation_id": ...}`, rejecting blank ids
pub(super) fn conversation_id(input: Value) -> Result<String, ToolOutput> {
    let input: ConversationInput =
        serde_json::from_value(input).map_err(ToolOutput::invalid_input)?;
    let id = input.conversation_id.trim();
    if id.is_empty() {
        return Err(ToolOutput::invalid_input("conversation_id must not be empty"));
    }
    Ok(id.to_string())
}

fn conversation_schema() -> Value {
    json!({
        "type": "object",
        "required": ["conversation_id"],
        "properties": {
            "conversation_id": {
                "type": "string",
                "description": "Id returned by authenticate_user"
            }
        }
    })
}

// ============================================================================
// download_user_info
// ============================================================================

pub struct DownloadUserInfoTool;

#[async_trait]
impl Tool for DownloadUserInfoTool {
    fn name(&self) -> &'static str {
        "download_user_info"
    }

    fn description(&self) -> String {
        "Download the authenticated customer's profile and current plan. Call after authenticate_user and before prepare_new_offer.".to_string()
    }

    fn input_schema(&self) -> Value {
        conversation_schema()
    }

    async fn run(&self, input: Value, ctx: ToolContext) -> ToolOutput {
        let id = match conversation_id(input) {
            Ok(id) => id,
            Err(out) => return out,
        };

        match ctx.flow().download_info(&id).await {
            Ok(state) => {
                let plan = state.identity.current_plan_mbps;
                respond(
                    &state,
                    format!(
                        "Downloaded profile of {} (current plan {plan} Mbps). {}",
                        state.identity.name,
                        next_step_text(&state)
                    ),
                    json!({ "profile": state.profile }),
                )
            }
            Err(e) => e.into(),
        }
    }
}

// ============================================================================
// prepare_new_offer
// ============================================================================

pub struct PrepareNewOfferTool;

#[async_trait]
impl Tool for PrepareNewOfferTool {
    fn name(&self) -> &'static str {
        "prepare_new_offer"
    }

    fn description(&self) -> String {
        "Prepare a speed upgrade offer from the downloaded profile. Present the offer to the customer and ask whether they accept before submitting.".to_string()
    }

    fn input_schema(&self) -> Value {
        conversation_schema()
    }

    async fn run(&self, input: Value, ctx: ToolContext) -> ToolOutput {
        let id = match conversation_id(input) {
            Ok(id) => id,
            Err(out) => return out,
        };

        match ctx.flow().prepare_offer(&id).await {
            Ok(state) => {
                let description = state
                    .offer
                    .as_ref()
                    .map(|offer| offer.description.clone())
                    .unwrap_or_default();
                respond(
                    &state,
                    format!("{description} {}", next_step_text(&state)),
                    json!({ "offer": state.offer }),
                )
            }
            Err(e) => e.into(),
        }
    }
}

// ============================================================================
// get_flow_status
// ============================================================================

pub struct GetFlowStatusTool;

#[async_trait]
impl Tool for GetFlowStatusTool {
    fn name(&self) -> &'static str {
        "get_flow_status"
    }

    fn description(&self) -> String {
        "Report the current stage of a conversation and everything collected so far. Safe to call at any time; changes nothing.".to_string()
    }

    fn input_schema(&self) -> Value {
        conversation_schema()
    }

    async fn run(&self, input: Value, ctx: ToolContext) -> ToolOutput {
        let id = match conversation_id(input) {
            Ok(id) => id,
            Err(out) => return out,
        };

        match ctx.flow().get_status(&id).await {
            Ok(state) => respond(
                &state,
                format!(
                    "Conversation {} is at stage {}. {}",
                    state.conversation_id,
                    state.stage,
                    next_step_text(&state)
                ),
                json!({ "state": state }),
            ),
            Err(e) => e.into(),
        }
    }
}

// ============================================================================
// logout
// ============================================================================

pub struct LogoutTool;

#[async_trait]
impl Tool for LogoutTool {
    fn name(&self) -> &'static str {
        "logout"
    }

    fn description(&self) -> String {
        "End the conversation. Afterwards only get_flow_status may be called for it.".to_string()
    }

    fn input_schema(&self) -> Value {
        conversation_schema()
    }

    async fn run(&self, input: Value, ctx: ToolContext) -> ToolOutput {
        let id = match conversation_id(input) {
            Ok(id) => id,
            Err(out) => return out,
        };

        match ctx.flow().logout(&id).await {
            Ok(state) => respond(
                &state,
                format!("Logged out of {}.", state.conversation_id),
                json!({}),
            ),
            Err(e) => e.into(),
        }
    }
}
