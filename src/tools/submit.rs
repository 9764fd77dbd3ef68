//! Submit tool - hands the customer's decision to the external service

use super::conversation::conversation_id;
use super::{next_step_text, respond, Tool, ToolContext, ToolOutput};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

pub struct SubmitOfferTool;

#[derive(Debug, Deserialize)]
struct SubmitFlags {
    #[serde(default = "default_true")]
    accept_offer: bool,
    #[serde(default = "default_true")]
    persist_to_db: bool,
}

fn default_true() -> bool {
    true
}

#[async_trait]
impl Tool for SubmitOfferTool {
    fn name(&self) -> &'static str {
        "submit_offer_to_external_service"
    }

    fn description(&self) -> String {
        "Submit the customer's decision on the prepared offer. Set accept_offer to false if the customer declined. Can only succeed once per conversation; if the external service fails, one retry is allowed.".to_string()
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "required": ["conversation_id"],
            "properties": {
                "conversation_id": {
                    "type": "string",
                    "description": "Id returned by authenticate_user"
                },
                "accept_offer": {
                    "type": "boolean",
                    "description": "Whether the customer accepted the offer",
                    "default": true
                },
                "persist_to_db": {
                    "type": "boolean",
                    "description": "Record the decision durably instead of a mocked acknowledgement",
                    "default": true
                }
            }
        })
    }

    async fn run(&self, input: Value, ctx: ToolContext) -> ToolOutput {
        let flags: SubmitFlags = match serde_json::from_value(input.clone()) {
            Ok(flags) => flags,
            Err(e) => return ToolOutput::invalid_input(e),
        };
        let id = match conversation_id(input) {
            Ok(id) => id,
            Err(out) => return out,
        };

        match ctx
            .flow()
            .submit(&id, flags.accept_offer, flags.persist_to_db)
            .await
        {
            Ok(state) => {
                let Some(decision) = state.decision.as_ref() else {
                    return ToolOutput::error("storage", "Submitted state has no decision");
                };
                let receipt = &decision.receipt;
                let output = format!(
                    "Offer {} (reference {}{}). {}",
                    receipt.status.as_str(),
                    receipt.external_reference,
                    if receipt.saved_to_db { ", saved" } else { "" },
                    next_step_text(&state)
                );
                respond(&state, output, json!({ "receipt": receipt }))
            }
            Err(e) => e.into(),
        }
    }
}
