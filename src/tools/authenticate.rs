//! Authenticate tool - verifies the caller and opens a conversation

use super::{next_step_text, respond, Tool, ToolContext, ToolOutput};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

pub struct AuthenticateUserTool;

#[derive(Debug, Deserialize)]
struct AuthenticateInput {
    name: String,
    rodne_cislo_suffix: String,
    /// Falls back to the configured reference phone
    phone_number: Option<String>,
}

#[async_trait]
impl Tool for AuthenticateUserTool {
    fn name(&self) -> &'static str {
        "authenticate_user"
    }

    fn description(&self) -> String {
        "Authenticate the customer by full name, the last four digits of their birth number (rodne cislo) and their phone number. Must be called first. Returns the conversation_id that every other tool requires.".to_string()
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "required": ["name", "rodne_cislo_suffix"],
            "properties": {
                "name": {
                    "type": "string",
                    "description": "Customer's full name"
                },
                "rodne_cislo_suffix": {
                    "type": "string",
                    "description": "Last four digits of the birth number"
                },
                "phone_number": {
                    "type": "string",
                    "description": "Phone number the customer is calling from; defaults to the number on record for this line"
                }
            }
        })
    }

    async fn run(&self, input: Value, ctx: ToolContext) -> ToolOutput {
        let input: AuthenticateInput = match serde_json::from_value(input) {
            Ok(input) => input,
            Err(e) => return ToolOutput::invalid_input(e),
        };
        if input.name.trim().is_empty() {
            return ToolOutput::invalid_input("name must not be empty");
        }

        let flow = ctx.flow();
        let phone_number = input
            .phone_number
            .as_deref()
            .unwrap_or_else(|| flow.reference_phone());

        match flow
            .authenticate(&input.name, &input.rodne_cislo_suffix, phone_number)
            .await
        {
            Ok(state) => respond(
                &state,
                format!(
                    "Authenticated {} (conversation_id: {}). {}",
                    state.identity.name,
                    state.conversation_id,
                    next_step_text(&state)
                ),
                json!({ "customer": state.identity }),
            ),
            Err(e) => e.into(),
        }
    }
}
