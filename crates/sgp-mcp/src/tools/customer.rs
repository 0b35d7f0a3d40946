//! Customer service tools (URA endpoints).
//!
//! These are customer-scoped and never cached.

use serde_json::json;

use super::{McpTool, ToolContext, with_auth_override};
use crate::error::ToolResult;
use crate::models::{
    ConsultCustomerInput, ContractInput, ListInvoicesInput, OpenTicketInput, ResponseEnvelope,
};

fn contract_schema() -> serde_json::Value {
    with_auth_override(json!({
        "type": "object",
        "properties": {
            "contrato": {
                "type": "integer",
                "minimum": 1,
                "description": "SGP contract number"
            }
        },
        "required": ["contrato"]
    }))
}

/// Customer lookup tool.
pub struct ConsultCustomerTool;

#[async_trait::async_trait]
impl McpTool for ConsultCustomerTool {
    fn name(&self) -> &'static str {
        "consult_customer"
    }

    fn description(&self) -> &'static str {
        "Look up a customer by CPF/CNPJ and return their registration data and contracts."
    }

    fn input_schema(&self) -> serde_json::Value {
        with_auth_override(json!({
            "type": "object",
            "properties": {
                "cpfcnpj": {
                    "type": "string",
                    "description": "Customer CPF or CNPJ (digits only). Defaults to the authenticated customer."
                }
            }
        }))
    }

    async fn execute(
        &self,
        ctx: &ToolContext,
        input: serde_json::Value,
    ) -> ToolResult<ResponseEnvelope> {
        let params: ConsultCustomerInput = serde_json::from_value(input)?;

        Ok(ctx
            .client
            .consult_customer(params.cpfcnpj.as_deref(), params.auth.request_options())
            .await?)
    }
}

/// Invoice listing tool.
pub struct ListInvoicesTool;

#[async_trait::async_trait]
impl McpTool for ListInvoicesTool {
    fn name(&self) -> &'static str {
        "list_invoices"
    }

    fn description(&self) -> &'static str {
        "List the invoices (titulos) of a contract, optionally filtered by status."
    }

    fn input_schema(&self) -> serde_json::Value {
        with_auth_override(json!({
            "type": "object",
            "properties": {
                "contrato": {
                    "type": "integer",
                    "minimum": 1,
                    "description": "SGP contract number"
                },
                "status": {
                    "type": "string",
                    "description": "Invoice status filter (e.g. 'aberto', 'pago')"
                }
            },
            "required": ["contrato"]
        }))
    }

    async fn execute(
        &self,
        ctx: &ToolContext,
        input: serde_json::Value,
    ) -> ToolResult<ResponseEnvelope> {
        let params: ListInvoicesInput = serde_json::from_value(input)?;
        params.validate()?;

        Ok(ctx
            .client
            .list_invoices(params.contrato, params.status.as_deref(), params.auth.request_options())
            .await?)
    }
}

/// Support ticket tool.
pub struct OpenTicketTool;

#[async_trait::async_trait]
impl McpTool for OpenTicketTool {
    fn name(&self) -> &'static str {
        "open_ticket"
    }

    fn description(&self) -> &'static str {
        "Open a support ticket (chamado) on a contract."
    }

    fn input_schema(&self) -> serde_json::Value {
        with_auth_override(json!({
            "type": "object",
            "properties": {
                "contrato": {
                    "type": "integer",
                    "minimum": 1,
                    "description": "SGP contract number"
                },
                "ocorrenciatipo": {
                    "type": "integer",
                    "description": "Occurrence type id configured in SGP"
                },
                "conteudo": {
                    "type": "string",
                    "description": "Ticket description"
                }
            },
            "required": ["contrato", "ocorrenciatipo", "conteudo"]
        }))
    }

    async fn execute(
        &self,
        ctx: &ToolContext,
        input: serde_json::Value,
    ) -> ToolResult<ResponseEnvelope> {
        let params: OpenTicketInput = serde_json::from_value(input)?;
        params.validate()?;

        Ok(ctx
            .client
            .open_ticket(
                params.contrato,
                params.ocorrenciatipo,
                &params.conteudo,
                params.auth.request_options(),
            )
            .await?)
    }
}

/// Trust unlock tool.
pub struct ReleaseTrustUnlockTool;

#[async_trait::async_trait]
impl McpTool for ReleaseTrustUnlockTool {
    fn name(&self) -> &'static str {
        "release_trust_unlock"
    }

    fn description(&self) -> &'static str {
        "Temporarily unblock a suspended contract on a payment promise (liberacao por promessa)."
    }

    fn input_schema(&self) -> serde_json::Value {
        contract_schema()
    }

    async fn execute(
        &self,
        ctx: &ToolContext,
        input: serde_json::Value,
    ) -> ToolResult<ResponseEnvelope> {
        let params: ContractInput = serde_json::from_value(input)?;
        params.validate()?;

        Ok(ctx.client.release_trust_unlock(params.contrato, params.auth.request_options()).await?)
    }
}

/// Access status tool.
pub struct CheckAccessTool;

#[async_trait::async_trait]
impl McpTool for CheckAccessTool {
    fn name(&self) -> &'static str {
        "check_access"
    }

    fn description(&self) -> &'static str {
        "Check the connection and access status of a contract."
    }

    fn input_schema(&self) -> serde_json::Value {
        contract_schema()
    }

    async fn execute(
        &self,
        ctx: &ToolContext,
        input: serde_json::Value,
    ) -> ToolResult<ResponseEnvelope> {
        let params: ContractInput = serde_json::from_value(input)?;
        params.validate()?;

        Ok(ctx.client.check_access(params.contrato, params.auth.request_options()).await?)
    }
}
