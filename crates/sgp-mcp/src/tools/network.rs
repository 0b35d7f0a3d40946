//! Network inventory tools (FTTH and RADIUS).

use serde_json::json;

use super::{McpTool, ToolContext, with_auth_override};
use crate::error::ToolResult;
use crate::models::{MAX_PER_PAGE, OnuDetailsInput, PageInput, ResponseEnvelope};

fn page_schema() -> serde_json::Value {
    with_auth_override(json!({
        "type": "object",
        "properties": {
            "page": {
                "type": "integer",
                "default": 1,
                "minimum": 1,
                "description": "Page number (1-based)"
            },
            "perPage": {
                "type": "integer",
                "default": 20,
                "minimum": 1,
                "maximum": MAX_PER_PAGE,
                "description": "Items per page"
            }
        }
    }))
}

/// ONU inventory tool.
pub struct ListOnusTool;

#[async_trait::async_trait]
impl McpTool for ListOnusTool {
    fn name(&self) -> &'static str {
        "list_onus"
    }

    fn description(&self) -> &'static str {
        "List FTTH ONUs registered in SGP, one page at a time. Results are cached briefly."
    }

    fn input_schema(&self) -> serde_json::Value {
        page_schema()
    }

    async fn execute(
        &self,
        ctx: &ToolContext,
        input: serde_json::Value,
    ) -> ToolResult<ResponseEnvelope> {
        let params: PageInput = serde_json::from_value(input)?;
        params.validate()?;

        Ok(ctx
            .client
            .list_onus(params.page, params.per_page, params.auth.request_options())
            .await?)
    }
}

/// ONU details tool.
pub struct OnuDetailsTool;

#[async_trait::async_trait]
impl McpTool for OnuDetailsTool {
    fn name(&self) -> &'static str {
        "get_onu_details"
    }

    fn description(&self) -> &'static str {
        "Get details (signal, status, serial, OLT port) of one FTTH ONU. Results are cached briefly."
    }

    fn input_schema(&self) -> serde_json::Value {
        with_auth_override(json!({
            "type": "object",
            "properties": {
                "onuId": {
                    "type": "integer",
                    "description": "ONU id in SGP"
                }
            },
            "required": ["onuId"]
        }))
    }

    async fn execute(
        &self,
        ctx: &ToolContext,
        input: serde_json::Value,
    ) -> ToolResult<ResponseEnvelope> {
        let params: OnuDetailsInput = serde_json::from_value(input)?;

        Ok(ctx.client.get_onu_details(params.onu_id, params.auth.request_options()).await?)
    }
}

/// RADIUS user listing tool.
pub struct ListRadiusUsersTool;

#[async_trait::async_trait]
impl McpTool for ListRadiusUsersTool {
    fn name(&self) -> &'static str {
        "list_radius_users"
    }

    fn description(&self) -> &'static str {
        "List RADIUS (PPPoE) users, one page at a time."
    }

    fn input_schema(&self) -> serde_json::Value {
        page_schema()
    }

    async fn execute(
        &self,
        ctx: &ToolContext,
        input: serde_json::Value,
    ) -> ToolResult<ResponseEnvelope> {
        let params: PageInput = serde_json::from_value(input)?;
        params.validate()?;

        Ok(ctx
            .client
            .list_radius_users(params.page, params.per_page, params.auth.request_options())
            .await?)
    }
}
