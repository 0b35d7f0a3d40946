//! Input models for MCP tool parameters.

use serde::{Deserialize, Serialize};

use crate::auth::{AuthMethod, Credentials};
use crate::client::RequestOptions;
use crate::error::{ToolError, ToolResult};

/// Per-call authentication override accepted by every tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthOverride {
    /// Force an auth mode instead of the configured preference.
    #[serde(default)]
    pub auth_method: Option<AuthMethod>,

    /// Credentials that take precedence over the configured ones.
    #[serde(default)]
    pub credentials: Option<Credentials>,
}

impl AuthOverride {
    /// Request options carrying this override, without caching.
    #[must_use]
    pub fn request_options(&self) -> RequestOptions {
        RequestOptions {
            auth_method: self.auth_method,
            credentials: self.credentials.clone(),
            ..RequestOptions::default()
        }
    }
}

/// Input for customer lookup.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsultCustomerInput {
    /// Customer CPF/CNPJ. Defaults to the authenticated customer.
    #[serde(default)]
    pub cpfcnpj: Option<String>,

    #[serde(flatten)]
    pub auth: AuthOverride,
}

/// Input for operations scoped to one contract.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractInput {
    /// SGP contract number.
    pub contrato: u64,

    #[serde(flatten)]
    pub auth: AuthOverride,
}

impl ContractInput {
    pub fn validate(&self) -> ToolResult<()> {
        validate_contract(self.contrato)
    }
}

/// Input for invoice listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListInvoicesInput {
    /// SGP contract number.
    pub contrato: u64,

    /// Invoice status filter (e.g. "aberto", "pago").
    #[serde(default)]
    pub status: Option<String>,

    #[serde(flatten)]
    pub auth: AuthOverride,
}

impl ListInvoicesInput {
    pub fn validate(&self) -> ToolResult<()> {
        validate_contract(self.contrato)
    }
}

/// Input for opening a support ticket.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenTicketInput {
    /// SGP contract number.
    pub contrato: u64,

    /// Occurrence type id configured in SGP.
    pub ocorrenciatipo: u32,

    /// Ticket description.
    pub conteudo: String,

    #[serde(flatten)]
    pub auth: AuthOverride,
}

impl OpenTicketInput {
    pub fn validate(&self) -> ToolResult<()> {
        validate_contract(self.contrato)?;
        if self.conteudo.trim().is_empty() {
            return Err(ToolError::validation("conteudo", "cannot be empty"));
        }
        Ok(())
    }
}

/// Input for paginated listings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInput {
    /// 1-based page number.
    #[serde(default = "default_page")]
    pub page: u32,

    /// Items per page.
    #[serde(default = "default_per_page")]
    pub per_page: u32,

    #[serde(flatten)]
    pub auth: AuthOverride,
}

impl PageInput {
    pub fn validate(&self) -> ToolResult<()> {
        if self.page == 0 {
            return Err(ToolError::validation("page", "must be at least 1"));
        }
        if !(1..=MAX_PER_PAGE).contains(&self.per_page) {
            return Err(ToolError::validation(
                "perPage",
                format!("must be between 1 and {MAX_PER_PAGE}"),
            ));
        }
        Ok(())
    }
}

/// Input for ONU details.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OnuDetailsInput {
    /// ONU id in SGP.
    pub onu_id: u64,

    #[serde(flatten)]
    pub auth: AuthOverride,
}

/// Largest page size SGP accepts.
pub const MAX_PER_PAGE: u32 = 100;

fn default_page() -> u32 {
    1
}

fn default_per_page() -> u32 {
    20
}

fn validate_contract(contrato: u64) -> ToolResult<()> {
    if contrato == 0 {
        return Err(ToolError::validation("contrato", "must be a positive contract number"));
    }
    Ok(())
}
