//! SGP API client.
//!
//! Every outbound call goes through [`SgpClient::request`], which:
//! - Serves cacheable reads from the response cache (free: no quota, no network)
//! - Enforces a per-auth-mode sliding-window quota
//! - Attaches auth material as header, query params or body fragment
//! - Retries once, after a fixed backoff, when SGP answers 429
//! - Folds every upstream failure into an error [`ResponseEnvelope`]
//!
//! Only local preconditions (missing credentials, exhausted quota) are
//! returned as `Err`.

mod endpoints;
mod middleware;

pub use middleware::TracingMiddleware;

use std::time::Duration;

use reqwest::header::HeaderMap;
use reqwest::{Client, Method, StatusCode};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use serde_json::Value;
use tracing::Instrument;

use crate::auth::{AuthMethod, AuthStrategy, Credentials};
use crate::cache::ResponseCache;
use crate::config::{Config, api};
use crate::error::{ClientError, ClientResult, UpstreamError};
use crate::models::ResponseEnvelope;
use crate::rate_limit::RateLimiter;

/// Longest upstream body excerpt carried into an error message.
const MAX_ERROR_BODY: usize = 500;

/// Per-call options. Consumed by a single [`SgpClient::request`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestOptions {
    /// Auth mode for this call; the client's preferred mode when `None`.
    pub auth_method: Option<AuthMethod>,

    /// Credentials overriding the configured defaults, field by field.
    pub credentials: Option<Credentials>,

    /// Serve from and populate the response cache.
    pub use_cache: bool,

    /// Cache key; caching is skipped without one.
    pub cache_key: Option<String>,
}

impl RequestOptions {
    /// Options for a cacheable read stored under `key`.
    #[must_use]
    pub fn cached(key: impl Into<String>) -> Self {
        Self { use_cache: true, cache_key: Some(key.into()), ..Self::default() }
    }

    /// Use the given auth mode.
    #[must_use]
    pub fn with_auth(mut self, method: AuthMethod) -> Self {
        self.auth_method = Some(method);
        self
    }

    /// Use the given credentials ahead of the configured ones.
    #[must_use]
    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    fn effective_cache_key(&self) -> Option<&str> {
        self.cache_key.as_deref().filter(|_| self.use_cache)
    }
}

/// SGP API client.
#[derive(Clone)]
pub struct SgpClient {
    /// HTTP client with middleware.
    http: ClientWithMiddleware,

    /// Auth artifact builder.
    auth: AuthStrategy,

    /// Per-auth-mode quota tracking.
    rate_limiter: RateLimiter,

    /// Response cache.
    cache: ResponseCache,

    /// SGP base URL, without trailing slash.
    base_url: String,

    /// Window the quotas apply to.
    rate_limit_window: Duration,

    /// Wait before retrying a throttled call.
    retry_backoff: Duration,
}

impl SgpClient {
    /// Create a new client with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the base URL is invalid or HTTP client initialization fails.
    pub fn new(config: Config) -> anyhow::Result<Self> {
        config.validate()?;

        let client = Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .pool_max_idle_per_host(api::MAX_KEEPALIVE)
            .pool_idle_timeout(api::KEEPALIVE_EXPIRY)
            .gzip(true)
            .build()?;

        let http = ClientBuilder::new(client).with(TracingMiddleware).build();

        let auth = AuthStrategy::new(config.credentials, config.rate_limits);
        tracing::debug!(preferred = %auth.preferred(), base_url = %config.base_url, "SGP client ready");

        Ok(Self {
            http,
            auth,
            rate_limiter: RateLimiter::new(),
            cache: ResponseCache::new(config.cache_ttl, config.cache_max_size),
            base_url: config.base_url,
            rate_limit_window: config.rate_limit_window,
            retry_backoff: config.retry_backoff,
        })
    }

    /// Issue one call to SGP.
    ///
    /// `endpoint` is relative to the base URL and may carry a query string.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::RateLimitExceeded`] when the auth mode's quota is
    /// exhausted and [`ClientError::MissingCredentials`] when the auth mode
    /// cannot be satisfied. Upstream failures are returned as error envelopes.
    pub async fn request(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<Value>,
        options: RequestOptions,
    ) -> ClientResult<ResponseEnvelope> {
        let span = tracing::debug_span!(
            "sgp_request",
            request_id = %uuid::Uuid::new_v4(),
            %method,
            endpoint
        );

        self.orchestrate(method, endpoint, body, options).instrument(span).await
    }

    async fn orchestrate(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<Value>,
        options: RequestOptions,
    ) -> ClientResult<ResponseEnvelope> {
        let cache_key = options.effective_cache_key();

        if let Some(key) = cache_key {
            if let Some(cached) = self.cache.get(key).await {
                tracing::debug!(cache_key = key, "Cache hit");
                return Ok(cached);
            }
            tracing::debug!(cache_key = key, "Cache miss");
        }

        let auth_method = options.auth_method.unwrap_or_else(|| self.auth.preferred());
        self.admit(auth_method)?;

        let credentials = options.credentials.as_ref();
        let headers = self.auth.build_headers(auth_method, credentials)?;
        let params = self.auth.build_params(auth_method, credentials)?;
        let payload = self.build_payload(&method, auth_method, credentials, body)?;

        let url = self.url(endpoint);
        let started = std::time::Instant::now();

        let envelope = match self.execute(&method, &url, &headers, &params, payload).await {
            Ok(data) => ResponseEnvelope::success(data),
            Err(err) => {
                tracing::warn!(auth = %auth_method, error = %err, "SGP request failed");
                ResponseEnvelope::from(err)
            }
        };

        tracing::debug!(
            status = ?envelope.status,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "SGP request completed"
        );

        if envelope.is_success() {
            if let Some(key) = cache_key {
                self.cache.set(key, envelope.clone(), None).await;
            }
        }

        Ok(envelope)
    }

    /// Consume one slot of the auth mode's quota or fail.
    fn admit(&self, auth_method: AuthMethod) -> ClientResult<()> {
        let key = self.auth.rate_limit_key(auth_method);
        let limit = self.auth.quota(auth_method);

        if self.rate_limiter.check_limit(&key, limit, self.rate_limit_window) {
            return Ok(());
        }

        let retry_after = self
            .rate_limiter
            .next_reset(&key, self.rate_limit_window)
            .saturating_duration_since(tokio::time::Instant::now());

        tracing::warn!(key = %key, limit, retry_after_ms = retry_after.as_millis() as u64, "Local rate limit reached");
        Err(ClientError::rate_limited(key, limit, retry_after))
    }

    /// Serialized request body: `{...auth_body, ...caller_body}` for methods
    /// that carry one.
    fn build_payload(
        &self,
        method: &Method,
        auth_method: AuthMethod,
        credentials: Option<&Credentials>,
        body: Option<Value>,
    ) -> ClientResult<Option<Vec<u8>>> {
        let carries_body = *method == Method::POST || *method == Method::PUT || *method == Method::PATCH;

        let merged = if carries_body {
            match (self.auth.build_body(auth_method, credentials)?, body) {
                (None, body) => body,
                (Some(auth_fields), None) => Some(Value::Object(auth_fields)),
                (Some(mut auth_fields), Some(Value::Object(fields))) => {
                    auth_fields.extend(fields);
                    Some(Value::Object(auth_fields))
                }
                (Some(_), Some(_)) => {
                    return Err(ClientError::InvalidRequest(format!(
                        "{auth_method} authentication requires a JSON object body"
                    )));
                }
            }
        } else {
            if auth_method == AuthMethod::CpfCnpj {
                return Err(ClientError::InvalidRequest(format!(
                    "{auth_method} authentication requires POST, PUT or PATCH, got {method}"
                )));
            }
            body
        };

        merged
            .map(|value| serde_json::to_vec(&value))
            .transpose()
            .map_err(|e| ClientError::InvalidRequest(e.to_string()))
    }

    /// Send the request, retrying once after a 429.
    async fn execute(
        &self,
        method: &Method,
        url: &str,
        headers: &HeaderMap,
        params: &[(String, String)],
        payload: Option<Vec<u8>>,
    ) -> Result<Value, UpstreamError> {
        let mut message = String::new();

        for attempt in 1..=api::MAX_ATTEMPTS {
            let mut request = self.http.request(method.clone(), url).headers(headers.clone());
            if !params.is_empty() {
                request = request.query(params);
            }
            if let Some(ref bytes) = payload {
                request = request.body(bytes.clone());
            }

            let response = request.send().await?;

            let status = response.status();
            if status != StatusCode::TOO_MANY_REQUESTS {
                return read_response(response).await;
            }
            message = error_message(status, &response.text().await?);

            if attempt < api::MAX_ATTEMPTS {
                tracing::warn!(
                    attempt,
                    backoff_ms = self.retry_backoff.as_millis() as u64,
                    "SGP returned 429, backing off before retry"
                );
                tokio::time::sleep(self.retry_backoff).await;
            }
        }

        Err(UpstreamError::Throttled { attempts: api::MAX_ATTEMPTS, message })
    }

    fn url(&self, endpoint: &str) -> String {
        if endpoint.starts_with('/') {
            format!("{}{}", self.base_url, endpoint)
        } else {
            format!("{}/{}", self.base_url, endpoint)
        }
    }

    /// Auth mode used when a call does not request one.
    #[must_use]
    pub const fn preferred_auth(&self) -> AuthMethod {
        self.auth.preferred()
    }

    /// Auth strategy, for fail-fast credential checks.
    #[must_use]
    pub const fn auth(&self) -> &AuthStrategy {
        &self.auth
    }

    #[must_use]
    pub const fn rate_limiter(&self) -> &RateLimiter {
        &self.rate_limiter
    }

    #[must_use]
    pub const fn cache(&self) -> &ResponseCache {
        &self.cache
    }

    #[must_use]
    pub const fn rate_limit_window(&self) -> Duration {
        self.rate_limit_window
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl std::fmt::Debug for SgpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SgpClient")
            .field("base_url", &self.base_url)
            .field("preferred_auth", &self.auth.preferred())
            .finish()
    }
}

/// Decode a non-429 response.
async fn read_response(response: reqwest::Response) -> Result<Value, UpstreamError> {
    let status = response.status();
    let text = response.text().await?;

    if !status.is_success() {
        return Err(UpstreamError::Status {
            status: status.as_u16(),
            message: error_message(status, &text),
        });
    }

    if text.trim().is_empty() {
        return Ok(Value::Null);
    }

    serde_json::from_str(&text).map_err(|e| UpstreamError::Decode(e.to_string()))
}

/// Best message from an error body: a JSON `message`-like field, the raw
/// body, or the status reason.
fn error_message(status: StatusCode, body: &str) -> String {
    if let Ok(Value::Object(fields)) = serde_json::from_str::<Value>(body) {
        for name in ["message", "msg", "error", "detail"] {
            if let Some(Value::String(message)) = fields.get(name) {
                return message.clone();
            }
        }
    }

    let body = body.trim();
    if body.is_empty() {
        return status.canonical_reason().unwrap_or("Unknown error").to_string();
    }

    match body.char_indices().nth(MAX_ERROR_BODY) {
        Some((cut, _)) => format!("{}...", &body[..cut]),
        None => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn client() -> SgpClient {
        SgpClient::new(Config::for_testing("http://127.0.0.1:9")).unwrap()
    }

    #[test]
    fn test_url_joins_with_single_slash() {
        let client = client();
        assert_eq!(client.url("/ftth/onus?page=1"), "http://127.0.0.1:9/ftth/onus?page=1");
        assert_eq!(client.url("ura/titulos/"), "http://127.0.0.1:9/ura/titulos/");
    }

    #[test]
    fn test_payload_merges_auth_first() {
        let client = client();
        let creds = Credentials::cpf_cnpj("123", "x");
        let bytes = client
            .build_payload(
                &Method::POST,
                AuthMethod::CpfCnpj,
                Some(&creds),
                Some(json!({"contrato": 7, "senha": "caller"})),
            )
            .unwrap()
            .unwrap();

        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body, json!({"cpfcnpj": "123", "senha": "caller", "contrato": 7}));
    }

    #[test]
    fn test_payload_without_auth_body_is_verbatim() {
        let client = client();
        let bytes = client
            .build_payload(&Method::PUT, AuthMethod::Token, None, Some(json!([1, 2])))
            .unwrap()
            .unwrap();
        assert_eq!(serde_json::from_slice::<Value>(&bytes).unwrap(), json!([1, 2]));
    }

    #[test]
    fn test_payload_rejects_cpf_cnpj_on_get() {
        let client = client();
        let creds = Credentials::cpf_cnpj("123", "x");
        let err = client
            .build_payload(&Method::GET, AuthMethod::CpfCnpj, Some(&creds), None)
            .unwrap_err();
        assert!(matches!(err, ClientError::InvalidRequest(_)));
    }

    #[test]
    fn test_payload_rejects_non_object_with_auth_body() {
        let client = client();
        let creds = Credentials::cpf_cnpj("123", "x");
        let err = client
            .build_payload(&Method::POST, AuthMethod::CpfCnpj, Some(&creds), Some(json!("raw")))
            .unwrap_err();
        assert!(matches!(err, ClientError::InvalidRequest(_)));
    }

    #[test]
    fn test_error_message_extraction() {
        assert_eq!(
            error_message(StatusCode::BAD_REQUEST, r#"{"msg": "Contrato inexistente"}"#),
            "Contrato inexistente"
        );
        assert_eq!(error_message(StatusCode::BAD_GATEWAY, "upstream down"), "upstream down");
        assert_eq!(error_message(StatusCode::NOT_FOUND, ""), "Not Found");

        let long = "x".repeat(MAX_ERROR_BODY + 10);
        assert!(error_message(StatusCode::INTERNAL_SERVER_ERROR, &long).ends_with("..."));
    }

    #[test]
    fn test_cache_key_requires_use_cache() {
        let options = RequestOptions { cache_key: Some("k".into()), ..RequestOptions::default() };
        assert_eq!(options.effective_cache_key(), None);
        assert_eq!(RequestOptions::cached("k").effective_cache_key(), Some("k"));
    }

    #[test]
    fn test_debug_hides_credentials() {
        let mut config = Config::for_testing("http://127.0.0.1:9");
        config.credentials = Credentials::basic("admin", "hunter2");
        let client = SgpClient::new(config).unwrap();
        let debug = format!("{client:?}");
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("preferred_auth"));
    }
}
