//! MCP tool implementations.
//!
//! Each tool:
//! 1. Parses and validates its input
//! 2. Calls one SGP endpoint wrapper on the client
//! 3. Returns the client's envelope unchanged
//!
//! The MCP protocol layer (or the HTTP router) resolves a tool by name through
//! [`ToolRegistry`] and serializes the envelope as the tool result.

mod customer;
mod network;

pub use customer::*;
pub use network::*;

use std::sync::Arc;

use serde::Serialize;
use serde_json::json;

use crate::client::SgpClient;
use crate::error::{ToolError, ToolResult};
use crate::models::ResponseEnvelope;

/// Tool execution context.
#[derive(Debug, Clone)]
pub struct ToolContext {
    /// API client.
    pub client: Arc<SgpClient>,
}

impl ToolContext {
    /// Create a new tool context.
    #[must_use]
    pub fn new(client: Arc<SgpClient>) -> Self {
        Self { client }
    }
}

/// Trait for MCP tools.
#[async_trait::async_trait]
pub trait McpTool: Send + Sync {
    /// Tool name (e.g., "list_onus").
    fn name(&self) -> &'static str;

    /// Tool description for LLM.
    fn description(&self) -> &'static str;

    /// JSON Schema for input parameters.
    fn input_schema(&self) -> serde_json::Value;

    /// Execute the tool with given input.
    async fn execute(
        &self,
        ctx: &ToolContext,
        input: serde_json::Value,
    ) -> ToolResult<ResponseEnvelope>;
}

/// Register all tools.
#[must_use]
pub fn register_all_tools() -> Vec<Box<dyn McpTool>> {
    vec![
        // Customer service tools (5)
        Box::new(customer::ConsultCustomerTool),
        Box::new(customer::ListInvoicesTool),
        Box::new(customer::OpenTicketTool),
        Box::new(customer::ReleaseTrustUnlockTool),
        Box::new(customer::CheckAccessTool),

        // Network inventory tools (3)
        Box::new(network::ListOnusTool),
        Box::new(network::OnuDetailsTool),
        Box::new(network::ListRadiusUsersTool),
    ]
}

/// Tool info for listings.
#[derive(Debug, Serialize)]
pub struct ToolInfo {
    pub name: String,
    pub description: String,
    #[serde(rename = "inputSchema")]
    pub input_schema: serde_json::Value,
}

/// Name-to-tool dispatcher.
pub struct ToolRegistry {
    tools: Vec<Box<dyn McpTool>>,
}

impl ToolRegistry {
    /// Registry with every tool registered.
    #[must_use]
    pub fn new() -> Self {
        Self { tools: register_all_tools() }
    }

    /// Get tool by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&dyn McpTool> {
        self.tools.iter().find(|t| t.name() == name).map(|t| t.as_ref())
    }

    /// List all available tools.
    #[must_use]
    pub fn list(&self) -> Vec<ToolInfo> {
        self.tools
            .iter()
            .map(|t| ToolInfo {
                name: t.name().to_string(),
                description: t.description().to_string(),
                input_schema: t.input_schema(),
            })
            .collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Run a tool by name.
    pub async fn dispatch(
        &self,
        ctx: &ToolContext,
        name: &str,
        arguments: serde_json::Value,
    ) -> ToolResult<ResponseEnvelope> {
        let tool = self.get(name).ok_or_else(|| ToolError::NotFound(name.to_string()))?;

        tracing::info!(tool = %name, "Executing tool");

        tool.execute(ctx, arguments).await.inspect_err(|e| {
            tracing::error!(tool = %name, error = %e, "Tool execution failed");
        })
    }

    /// Run a tool by name and render the envelope as tool result text.
    pub async fn call_text(
        &self,
        ctx: &ToolContext,
        name: &str,
        arguments: serde_json::Value,
    ) -> ToolResult<String> {
        let envelope = self.dispatch(ctx, name, arguments).await?;
        Ok(serde_json::to_string_pretty(&envelope)?)
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry").field("tools", &self.tools.len()).finish()
    }
}

/// Add the shared per-call auth override properties to a tool schema.
fn with_auth_override(mut schema: serde_json::Value) -> serde_json::Value {
    if let Some(properties) = schema.get_mut("properties").and_then(|p| p.as_object_mut()) {
        properties.insert(
            "authMethod".to_string(),
            json!({
                "type": "string",
                "enum": ["basic", "token", "cpf_cnpj"],
                "description": "Override the configured authentication mode"
            }),
        );
        properties.insert(
            "credentials".to_string(),
            json!({
                "type": "object",
                "description": "Credentials for this call (username/password, token/app or cpfcnpj/senha)",
                "properties": {
                    "username": {"type": "string"},
                    "password": {"type": "string"},
                    "token": {"type": "string"},
                    "app": {"type": "string"},
                    "cpfcnpj": {"type": "string"},
                    "senha": {"type": "string"}
                }
            }),
        );
    }
    schema
}
