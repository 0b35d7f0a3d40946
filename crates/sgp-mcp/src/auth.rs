//! Authentication strategy for the SGP API.
//!
//! SGP accepts three mutually exclusive credential transports:
//!
//! | Mode       | Travels in            | Default quota (req/min) |
//! |------------|-----------------------|-------------------------|
//! | `basic`    | `Authorization` header| 100                     |
//! | `token`    | query string          | 300                     |
//! | `cpf_cnpj` | JSON body             | 50                      |
//!
//! [`AuthStrategy`] owns the configured default credentials and dispatches on
//! [`AuthMethod`] to build the artifacts for a single call.

use std::fmt;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};

use crate::config::RateLimits;
use crate::error::{ClientError, ClientResult};

/// Application name sent with token auth when none is configured.
pub const DEFAULT_APP: &str = "sgp-mcp";

/// Prefix shared by every rate-limit key.
const RATE_LIMIT_KEY_PREFIX: &str = "rate_limit_";

/// SGP authentication mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthMethod {
    /// HTTP basic auth with an operator username and password.
    Basic,
    /// API token and application name in the query string.
    Token,
    /// Customer document (CPF/CNPJ) and password in the request body.
    CpfCnpj,
}

impl AuthMethod {
    /// All modes, in precedence order.
    pub const ALL: [Self; 3] = [Self::Token, Self::Basic, Self::CpfCnpj];

    /// Wire name of the mode.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Basic => "basic",
            Self::Token => "token",
            Self::CpfCnpj => "cpf_cnpj",
        }
    }
}

impl fmt::Display for AuthMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Credential set. Any field may be absent; empty strings count as absent.
#[derive(Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Credentials {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpfcnpj: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub senha: Option<String>,
}

impl Credentials {
    /// Operator username and password.
    #[must_use]
    pub fn basic(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self { username: Some(username.into()), password: Some(password.into()), ..Self::default() }
    }

    /// API token.
    #[must_use]
    pub fn token(token: impl Into<String>) -> Self {
        Self { token: Some(token.into()), ..Self::default() }
    }

    /// Customer document and password.
    #[must_use]
    pub fn cpf_cnpj(cpfcnpj: impl Into<String>, senha: impl Into<String>) -> Self {
        Self { cpfcnpj: Some(cpfcnpj.into()), senha: Some(senha.into()), ..Self::default() }
    }

    /// Set the application name used with token auth.
    #[must_use]
    pub fn with_app(mut self, app: impl Into<String>) -> Self {
        self.app = Some(app.into());
        self
    }

    fn has_basic(&self) -> bool {
        present(self.username.as_ref()).is_some() && present(self.password.as_ref()).is_some()
    }

    fn has_token(&self) -> bool {
        present(self.token.as_ref()).is_some()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("has_password", &self.password.is_some())
            .field("has_token", &self.token.is_some())
            .field("app", &self.app)
            .field("has_cpfcnpj", &self.cpfcnpj.is_some())
            .field("has_senha", &self.senha.is_some())
            .finish()
    }
}

/// Credential field selector.
#[derive(Debug, Clone, Copy)]
enum Field {
    Username,
    Password,
    Token,
    App,
    CpfCnpj,
    Senha,
}

impl Field {
    const fn name(self) -> &'static str {
        match self {
            Self::Username => "username",
            Self::Password => "password",
            Self::Token => "token",
            Self::App => "app",
            Self::CpfCnpj => "cpfcnpj",
            Self::Senha => "senha",
        }
    }

    fn get(self, credentials: &Credentials) -> Option<&String> {
        match self {
            Self::Username => credentials.username.as_ref(),
            Self::Password => credentials.password.as_ref(),
            Self::Token => credentials.token.as_ref(),
            Self::App => credentials.app.as_ref(),
            Self::CpfCnpj => credentials.cpfcnpj.as_ref(),
            Self::Senha => credentials.senha.as_ref(),
        }
    }
}

fn present(value: Option<&String>) -> Option<&str> {
    value.map(String::as_str).filter(|v| !v.is_empty())
}

/// Builds per-call auth artifacts from configured defaults and call overrides.
#[derive(Clone)]
pub struct AuthStrategy {
    defaults: Credentials,
    quotas: RateLimits,
    preferred: AuthMethod,
}

impl AuthStrategy {
    /// Create a strategy. The preferred mode is fixed here: token, then basic,
    /// then cpf_cnpj.
    #[must_use]
    pub fn new(defaults: Credentials, quotas: RateLimits) -> Self {
        let preferred = if defaults.has_token() {
            AuthMethod::Token
        } else if defaults.has_basic() {
            AuthMethod::Basic
        } else {
            AuthMethod::CpfCnpj
        };

        Self { defaults, quotas, preferred }
    }

    /// Mode used when a call does not request one.
    #[must_use]
    pub const fn preferred(&self) -> AuthMethod {
        self.preferred
    }

    /// Headers for the given mode.
    ///
    /// Only `basic` carries credentials here; token and cpf_cnpj credentials
    /// travel in the query string and body respectively.
    pub fn build_headers(
        &self,
        method: AuthMethod,
        overrides: Option<&Credentials>,
    ) -> ClientResult<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        match method {
            AuthMethod::Basic => {
                let (username, password) = self.require_basic(overrides)?;
                let encoded = STANDARD.encode(format!("{username}:{password}"));
                let value = HeaderValue::from_str(&format!("Basic {encoded}"))
                    .map_err(|e| ClientError::InvalidRequest(e.to_string()))?;
                headers.insert(AUTHORIZATION, value);
            }
            AuthMethod::Token => {
                self.require(method, overrides, &[Field::Token])?;
            }
            AuthMethod::CpfCnpj => {}
        }

        Ok(headers)
    }

    /// Query parameters for the given mode. Non-empty only for `token`.
    pub fn build_params(
        &self,
        method: AuthMethod,
        overrides: Option<&Credentials>,
    ) -> ClientResult<Vec<(String, String)>> {
        match method {
            AuthMethod::Token => {
                let fields = self.require(method, overrides, &[Field::Token])?;
                let app = self.resolve(overrides, Field::App).unwrap_or(DEFAULT_APP);
                Ok(vec![
                    ("token".to_string(), fields[0].to_string()),
                    ("app".to_string(), app.to_string()),
                ])
            }
            AuthMethod::Basic | AuthMethod::CpfCnpj => Ok(Vec::new()),
        }
    }

    /// Body fragment for the given mode. Present only for `cpf_cnpj`.
    pub fn build_body(
        &self,
        method: AuthMethod,
        overrides: Option<&Credentials>,
    ) -> ClientResult<Option<serde_json::Map<String, serde_json::Value>>> {
        match method {
            AuthMethod::CpfCnpj => {
                let fields = self.require(method, overrides, &[Field::CpfCnpj, Field::Senha])?;
                let mut body = serde_json::Map::new();
                body.insert("cpfcnpj".to_string(), fields[0].into());
                body.insert("senha".to_string(), fields[1].into());
                Ok(Some(body))
            }
            AuthMethod::Basic | AuthMethod::Token => Ok(None),
        }
    }

    /// Rate-limit bucket for the mode. Modes never share a bucket.
    #[must_use]
    pub fn rate_limit_key(&self, method: AuthMethod) -> String {
        format!("{RATE_LIMIT_KEY_PREFIX}{method}")
    }

    /// Per-window request ceiling for the mode.
    #[must_use]
    pub const fn quota(&self, method: AuthMethod) -> u32 {
        self.quotas.for_method(method)
    }

    /// Whether every field the mode needs resolves to a non-empty value.
    #[must_use]
    pub fn validate(&self, method: AuthMethod, overrides: Option<&Credentials>) -> bool {
        match method {
            AuthMethod::Basic => self.require_basic(overrides).is_ok(),
            AuthMethod::Token => self.resolve(overrides, Field::Token).is_some(),
            AuthMethod::CpfCnpj => {
                self.resolve(overrides, Field::CpfCnpj).is_some()
                    && self.resolve(overrides, Field::Senha).is_some()
            }
        }
    }

    fn require_basic<'a>(
        &'a self,
        overrides: Option<&'a Credentials>,
    ) -> ClientResult<(&'a str, &'a str)> {
        let fields =
            self.require(AuthMethod::Basic, overrides, &[Field::Username, Field::Password])?;
        Ok((fields[0], fields[1]))
    }

    /// Resolve every named field or report all of the missing ones.
    fn require<'a>(
        &'a self,
        method: AuthMethod,
        overrides: Option<&'a Credentials>,
        fields: &[Field],
    ) -> ClientResult<Vec<&'a str>> {
        let mut resolved = Vec::with_capacity(fields.len());
        let mut missing = Vec::new();

        for &field in fields {
            match self.resolve(overrides, field) {
                Some(value) => resolved.push(value),
                None => missing.push(field.name()),
            }
        }

        if missing.is_empty() {
            Ok(resolved)
        } else {
            Err(ClientError::missing_credentials(method, missing))
        }
    }

    /// Call override first, then the configured default.
    fn resolve<'a>(
        &'a self,
        overrides: Option<&'a Credentials>,
        field: Field,
    ) -> Option<&'a str> {
        overrides
            .and_then(|c| present(field.get(c)))
            .or_else(|| present(field.get(&self.defaults)))
    }
}

impl fmt::Debug for AuthStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthStrategy")
            .field("preferred", &self.preferred)
            .field("quotas", &self.quotas)
            .finish()
    }
}
