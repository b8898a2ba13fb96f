//! HTTP route handlers exposing the tool catalog.

use axum::body::Bytes;
use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Serialize;
use tower_http::trace::TraceLayer;

use crate::tools::{self, CATALOG, ToolArgs, ToolError, ToolOutput};

use super::state::AppState;

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/tools", get(list_tools))
        .route("/tools/:name", post(invoke_tool))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health() -> &'static str {
    "ok"
}

/// Tool catalog entry as served to clients.
#[derive(Debug, Serialize)]
struct ToolInfo {
    name: &'static str,
    description: &'static str,
}

/// Response for the tool catalog.
#[derive(Debug, Serialize)]
struct ToolListResponse {
    tools: Vec<ToolInfo>,
}

/// List the available tools with their descriptions.
async fn list_tools() -> Json<ToolListResponse> {
    let tools = CATALOG
        .iter()
        .map(|spec| ToolInfo {
            name: spec.name,
            description: spec.description,
        })
        .collect();

    Json(ToolListResponse { tools })
}

/// Invoke a tool by name. The body is an optional JSON argument object.
async fn invoke_tool(
    State(state): State<AppState>,
    Path(name): Path<String>,
    body: Bytes,
) -> Result<Response, AppError> {
    let args: ToolArgs = if body.is_empty() {
        ToolArgs::default()
    } else {
        serde_json::from_slice(&body).map_err(|e| AppError::BadRequest {
            message: format!("invalid tool arguments: {e}"),
        })?
    };

    let output = tools::dispatch(&state.client, &name, &args).await?;

    Ok(match output {
        ToolOutput::Json(value) => Json(value).into_response(),
        ToolOutput::Text(text) => text.into_response(),
    })
}

/// Error response body.
#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

/// Application-level error with an HTTP status mapping.
#[derive(Debug)]
pub enum AppError {
    BadRequest { message: String },
    NotFound { message: String },
    Upstream { message: String },
}

impl From<ToolError> for AppError {
    fn from(e: ToolError) -> Self {
        match e {
            ToolError::UnknownTool(_) => AppError::NotFound {
                message: e.to_string(),
            },
            ToolError::MissingArgument { .. } | ToolError::InvalidDate(_) => AppError::BadRequest {
                message: e.to_string(),
            },
            // Upstream failures (API, auth, malformed payloads) are not
            // the caller's fault.
            _ => AppError::Upstream {
                message: e.to_string(),
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest { message } => (StatusCode::BAD_REQUEST, message),
            AppError::NotFound { message } => (StatusCode::NOT_FOUND, message),
            AppError::Upstream { message } => (StatusCode::BAD_GATEWAY, message),
        };

        tracing::warn!(status = %status, message = %message, "tool request failed");

        (status, Json(ErrorResponse { error: message })).into_response()
    }
}
