//! SGP endpoint wrappers.
//!
//! Thin mappings onto [`SgpClient::request`]. Payloads stay opaque; only
//! operator-wide reads (ONU inventory) are cached, since customer-scoped
//! answers must not be shared across identities.

use reqwest::Method;
use serde_json::json;

use super::{RequestOptions, SgpClient};
use crate::cache_key;
use crate::error::ClientResult;
use crate::models::ResponseEnvelope;

impl SgpClient {
    /// Look up a customer and their contracts.
    pub async fn consult_customer(
        &self,
        cpfcnpj: Option<&str>,
        options: RequestOptions,
    ) -> ClientResult<ResponseEnvelope> {
        let body = cpfcnpj.map(|doc| json!({ "cpfcnpj": doc }));
        self.request(Method::POST, "/ura/consultacliente/", body, options).await
    }

    /// List invoices of a contract, optionally filtered by status.
    pub async fn list_invoices(
        &self,
        contrato: u64,
        status: Option<&str>,
        options: RequestOptions,
    ) -> ClientResult<ResponseEnvelope> {
        let mut body = json!({ "contrato": contrato });
        if let Some(status) = status {
            body["status"] = json!(status);
        }
        self.request(Method::POST, "/ura/titulos/", Some(body), options).await
    }

    /// Open a support ticket on a contract.
    pub async fn open_ticket(
        &self,
        contrato: u64,
        ocorrenciatipo: u32,
        conteudo: &str,
        options: RequestOptions,
    ) -> ClientResult<ResponseEnvelope> {
        let body = json!({
            "contrato": contrato,
            "ocorrenciatipo": ocorrenciatipo,
            "conteudo": conteudo,
        });
        self.request(Method::POST, "/ura/chamado/", Some(body), options).await
    }

    /// Temporarily unblock a contract on a payment promise.
    pub async fn release_trust_unlock(
        &self,
        contrato: u64,
        options: RequestOptions,
    ) -> ClientResult<ResponseEnvelope> {
        let body = json!({ "contrato": contrato });
        self.request(Method::POST, "/ura/liberacaopromessa/", Some(body), options).await
    }

    /// Connection and access status of a contract.
    pub async fn check_access(
        &self,
        contrato: u64,
        options: RequestOptions,
    ) -> ClientResult<ResponseEnvelope> {
        let body = json!({ "contrato": contrato });
        self.request(Method::POST, "/ura/verificaacesso/", Some(body), options).await
    }

    /// One page of the ONU inventory. Cached under `onus_<page>_<per_page>`.
    pub async fn list_onus(
        &self,
        page: u32,
        per_page: u32,
        options: RequestOptions,
    ) -> ClientResult<ResponseEnvelope> {
        let endpoint = format!("/ftth/onus?page={page}&per_page={per_page}");
        let options = RequestOptions {
            use_cache: true,
            cache_key: Some(format!("onus_{page}_{per_page}")),
            ..options
        };
        self.request(Method::GET, &endpoint, None, options).await
    }

    /// Details of one ONU. Cached under `onu_details:<id>`.
    pub async fn get_onu_details(
        &self,
        onu_id: u64,
        options: RequestOptions,
    ) -> ClientResult<ResponseEnvelope> {
        let options = RequestOptions {
            use_cache: true,
            cache_key: Some(cache_key!("onu_details", onu_id)),
            ..options
        };
        self.request(Method::GET, &format!("/ftth/onu/{onu_id}"), None, options).await
    }

    /// One page of RADIUS users.
    pub async fn list_radius_users(
        &self,
        page: u32,
        per_page: u32,
        options: RequestOptions,
    ) -> ClientResult<ResponseEnvelope> {
        let endpoint = format!("/radius/usuarios?page={page}&per_page={per_page}");
        self.request(Method::GET, &endpoint, None, options).await
    }
}
