//! HTTP request handlers

use super::types::{ConversationResponse, ErrorResponse, HealthResponse, ToolsResponse};
use super::AppState;
use crate::runtime::FlowError;
use crate::tools::{ToolContext, ToolOutput, INVALID_INPUT};
use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Tool surface
        .route("/api/tools", get(list_tools))
        .route("/api/tools/:name", post(invoke_tool))
        // Read-only conversation view
        .route("/api/conversations/:id", get(get_conversation))
        // Health and version
        .route("/api/health", get(get_health))
        .route("/version", get(get_version))
        .with_state(state)
}

// ============================================================
// Tools
// ============================================================

async fn list_tools(State(state): State<AppState>) -> Json<ToolsResponse> {
    Json(ToolsResponse {
        tools: state.tools.definitions(),
    })
}

async fn invoke_tool(
    State(state): State<AppState>,
    Path(name): Path<String>,
    body: Bytes,
) -> Response {
    let input: Value = if body.iter().all(u8::is_ascii_whitespace) {
        json!({})
    } else {
        match serde_json::from_slice(&body) {
            Ok(input) => input,
            Err(e) => return tool_response(ToolOutput::invalid_input(e)),
        }
    };

    let ctx = ToolContext::new(state.flow.clone());
    match state.tools.execute(&name, input, ctx).await {
        Some(output) => {
            if !output.success {
                tracing::debug!(tool = %name, kind = ?output.error_kind, "Tool call failed");
            }
            tool_response(output)
        }
        None => (
            StatusCode::NOT_FOUND,
            Json(ToolOutput::error("unknown_tool", format!("Unknown tool: {name}"))),
        )
            .into_response(),
    }
}

fn tool_response(output: ToolOutput) -> Response {
    let status = if output.success {
        StatusCode::OK
    } else {
        status_for_kind(output.error_kind.as_deref().unwrap_or_default())
    };
    (status, Json(output)).into_response()
}

/// HTTP status for an `error_kind`
fn status_for_kind(kind: &str) -> StatusCode {
    match kind {
        "authentication" => StatusCode::UNAUTHORIZED,
        "not_found" => StatusCode::NOT_FOUND,
        "precondition" => StatusCode::CONFLICT,
        "persistence" => StatusCode::SERVICE_UNAVAILABLE,
        INVALID_INPUT => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

// ============================================================
// Conversations
// ============================================================

async fn get_conversation(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ConversationResponse>, AppError> {
    let conversation = state.flow.get_status(&id).await?;
    Ok(Json(conversation.into()))
}

async fn get_health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        degraded_writes: state.flow.degraded_writes(),
    })
}

async fn get_version() -> &'static str {
    concat!("offer-flow ", env!("CARGO_PKG_VERSION"))
}

// ============================================================
// Error Handling
// ============================================================

struct AppError(FlowError);

impl From<FlowError> for AppError {
    fn from(err: FlowError) -> Self {
        Self(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let kind = self.0.kind();
        let body = Json(ErrorResponse::new(kind, self.0.to_string()));
        (status_for_kind(kind), body).into_response()
    }
}
