//! HTTP surface for the tool registry.
//!
//! - `GET /health` service status
//! - `GET /tools` tool names, descriptions and input schemas
//! - `POST /tools/{name}` run a tool; the JSON body is its arguments
//!
//! Every tool call answers with a [`ResponseEnvelope`]. The HTTP status carries
//! the outcome class so callers need not inspect the body to branch.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Path, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use super::tenants::{ClientRegistry, TenantOverrides};
use crate::error::{ClientError, ToolError};
use crate::models::ResponseEnvelope;
use crate::tools::{ToolContext, ToolRegistry};

/// Shared state for HTTP handlers.
pub struct AppState {
    pub tools: ToolRegistry,
    pub tenants: ClientRegistry,
}

impl AppState {
    #[must_use]
    pub fn new(tools: ToolRegistry, tenants: ClientRegistry) -> Self {
        Self { tools, tenants }
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("tools", &self.tools.len())
            .field("tenants", &self.tenants)
            .finish()
    }
}

/// Create the HTTP router.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(health_check))
        .route("/health", get(health_check))
        .route("/tools", get(list_tools))
        .route("/tools/{name}", post(call_tool))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "sgp-mcp",
        "version": env!("CARGO_PKG_VERSION"),
        "tools": state.tools.len(),
        "tenants": state.tenants.len()
    }))
}

async fn list_tools(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.tools.list())
}

async fn call_tool(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ApiError> {
    if state.tools.get(&name).is_none() {
        return Err(ApiError::Tool(ToolError::NotFound(name)));
    }

    let arguments = if body.iter().all(u8::is_ascii_whitespace) {
        serde_json::json!({})
    } else {
        serde_json::from_slice(&body).map_err(ToolError::from)?
    };

    let overrides = TenantOverrides::from_headers(&headers);
    let client = state.tenants.resolve(&overrides).map_err(ApiError::Tenant)?;
    let ctx = ToolContext::new(client);

    let envelope = state.tools.dispatch(&ctx, &name, arguments).await?;
    let status = if envelope.is_success() { StatusCode::OK } else { StatusCode::BAD_GATEWAY };

    Ok((status, Json(envelope)).into_response())
}

/// Failure of a tool call before an envelope could be produced.
#[derive(Debug)]
pub enum ApiError {
    Tool(ToolError),
    /// Tenant headers did not describe a usable SGP deployment
    Tenant(anyhow::Error),
}

impl From<ToolError> for ApiError {
    fn from(err: ToolError) -> Self {
        Self::Tool(err)
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Tool(ToolError::NotFound(_)) => StatusCode::NOT_FOUND,
            Self::Tool(ToolError::Client(ClientError::RateLimitExceeded { .. })) => {
                StatusCode::TOO_MANY_REQUESTS
            }
            Self::Tool(
                ToolError::Client(
                    ClientError::MissingCredentials { .. } | ClientError::InvalidRequest(_),
                )
                | ToolError::Validation { .. }
                | ToolError::Serialization(_),
            ) => StatusCode::BAD_REQUEST,
            Self::Tenant(_) => StatusCode::BAD_REQUEST,
        }
    }

    fn message(&self) -> String {
        match self {
            Self::Tool(err) => err.to_user_message(),
            Self::Tenant(err) => format!("Invalid tenant configuration: {err:#}"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(ResponseEnvelope::error(self.message()));

        if let Self::Tool(ToolError::Client(err)) = &self {
            if let Some(wait) = err.retry_after() {
                let headers = [(header::RETRY_AFTER, retry_after_secs(wait).to_string())];
                return (status, headers, body).into_response();
            }
        }

        (status, body).into_response()
    }
}

/// Whole seconds to wait, rounded up, never zero.
fn retry_after_secs(wait: Duration) -> u64 {
    (wait.as_secs() + u64::from(wait.subsec_nanos() > 0)).max(1)
}
