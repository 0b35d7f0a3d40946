//! Configuration for the SGP MCP server.

use std::str::FromStr;
use std::time::Duration;

use anyhow::Context;

use crate::auth::{AuthMethod, Credentials};

/// API configuration constants.
pub mod api {
    use std::time::Duration;

    /// Overall request timeout.
    pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

    /// Connection timeout.
    pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

    /// Wait before the single retry after an upstream 429.
    pub const RETRY_BACKOFF: Duration = Duration::from_millis(1000);

    /// Attempts per call, including the retry after a 429.
    pub const MAX_ATTEMPTS: u32 = 2;

    /// Sliding window for the per-auth-mode quotas.
    pub const RATE_LIMIT_WINDOW: Duration = Duration::from_secs(60);

    /// Default quota for basic auth (requests per window).
    pub const BASIC_QUOTA: u32 = 100;

    /// Default quota for token auth (requests per window).
    pub const TOKEN_QUOTA: u32 = 300;

    /// Default quota for cpf_cnpj auth (requests per window).
    pub const CPF_CNPJ_QUOTA: u32 = 50;

    /// Cache TTL (5 minutes).
    pub const CACHE_TTL: Duration = Duration::from_secs(300);

    /// Maximum number of cached responses.
    pub const CACHE_MAX_SIZE: u64 = 1000;

    /// Maximum keepalive connections.
    pub const MAX_KEEPALIVE: usize = 10;

    /// Keepalive expiry.
    pub const KEEPALIVE_EXPIRY: Duration = Duration::from_secs(30);
}

/// Environment variable names.
pub mod env {
    pub const URL: &str = "SGP_URL";
    pub const USERNAME: &str = "SGP_USERNAME";
    pub const PASSWORD: &str = "SGP_PASSWORD";
    pub const TOKEN: &str = "SGP_TOKEN";
    pub const APP: &str = "SGP_APP";
    pub const CPFCNPJ: &str = "SGP_CPFCNPJ";
    pub const SENHA: &str = "SGP_SENHA";
    pub const RATE_LIMIT_BASIC: &str = "SGP_RATE_LIMIT_BASIC";
    pub const RATE_LIMIT_TOKEN: &str = "SGP_RATE_LIMIT_TOKEN";
    pub const RATE_LIMIT_CPF_CNPJ: &str = "SGP_RATE_LIMIT_CPF_CNPJ";
    pub const CACHE_TTL_SECS: &str = "SGP_CACHE_TTL_SECS";
    pub const CACHE_MAX_KEYS: &str = "SGP_CACHE_MAX_KEYS";
    pub const REQUEST_TIMEOUT_SECS: &str = "SGP_REQUEST_TIMEOUT_SECS";
    pub const RETRY_BACKOFF_MS: &str = "SGP_RETRY_BACKOFF_MS";
}

/// Per-auth-mode request quotas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RateLimits {
    pub basic: u32,
    pub token: u32,
    pub cpf_cnpj: u32,
}

impl RateLimits {
    /// Quota for a given mode.
    #[must_use]
    pub const fn for_method(&self, method: AuthMethod) -> u32 {
        match method {
            AuthMethod::Basic => self.basic,
            AuthMethod::Token => self.token,
            AuthMethod::CpfCnpj => self.cpf_cnpj,
        }
    }
}

impl Default for RateLimits {
    fn default() -> Self {
        Self { basic: api::BASIC_QUOTA, token: api::TOKEN_QUOTA, cpf_cnpj: api::CPF_CNPJ_QUOTA }
    }
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// SGP base URL, without trailing slash.
    pub base_url: String,

    /// Default credentials; per-call overrides take precedence field by field.
    pub credentials: Credentials,

    /// Per-auth-mode quotas.
    pub rate_limits: RateLimits,

    /// Sliding window the quotas apply to.
    pub rate_limit_window: Duration,

    /// Overall request timeout.
    pub request_timeout: Duration,

    /// Connection timeout.
    pub connect_timeout: Duration,

    /// Wait before retrying a throttled request.
    pub retry_backoff: Duration,

    /// Cache TTL.
    pub cache_ttl: Duration,

    /// Maximum cache size.
    pub cache_max_size: u64,
}

impl Config {
    /// Create a configuration with default limits.
    #[must_use]
    pub fn new(base_url: impl Into<String>, credentials: Credentials) -> Self {
        Self {
            base_url: normalize_base_url(base_url.into()),
            credentials,
            rate_limits: RateLimits::default(),
            rate_limit_window: api::RATE_LIMIT_WINDOW,
            request_timeout: api::REQUEST_TIMEOUT,
            connect_timeout: api::CONNECT_TIMEOUT,
            retry_backoff: api::RETRY_BACKOFF,
            cache_ttl: api::CACHE_TTL,
            cache_max_size: api::CACHE_MAX_SIZE,
        }
    }

    /// Create a test configuration pointing at a mock server.
    #[must_use]
    pub fn for_testing(base_url: &str) -> Self {
        Self {
            request_timeout: Duration::from_secs(5),
            connect_timeout: Duration::from_secs(2),
            retry_backoff: Duration::from_millis(50),
            ..Self::new(base_url, Credentials::token("test-token").with_app("test-app"))
        }
    }

    /// Create configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns error if `SGP_URL` is missing or any variable is invalid.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Create configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_url = lookup(env::URL).with_context(|| format!("{} is not set", env::URL))?;

        let credentials = Credentials {
            username: lookup(env::USERNAME),
            password: lookup(env::PASSWORD),
            token: lookup(env::TOKEN),
            app: lookup(env::APP),
            cpfcnpj: lookup(env::CPFCNPJ),
            senha: lookup(env::SENHA),
        };

        let mut config = Self::new(base_url, credentials);

        let defaults = RateLimits::default();
        config.rate_limits = RateLimits {
            basic: parse_var(&lookup, env::RATE_LIMIT_BASIC)?.unwrap_or(defaults.basic),
            token: parse_var(&lookup, env::RATE_LIMIT_TOKEN)?.unwrap_or(defaults.token),
            cpf_cnpj: parse_var(&lookup, env::RATE_LIMIT_CPF_CNPJ)?.unwrap_or(defaults.cpf_cnpj),
        };

        if let Some(secs) = parse_var::<u64, _>(&lookup, env::CACHE_TTL_SECS)? {
            config.cache_ttl = Duration::from_secs(secs);
        }
        if let Some(max) = parse_var(&lookup, env::CACHE_MAX_KEYS)? {
            config.cache_max_size = max;
        }
        if let Some(secs) = parse_var::<u64, _>(&lookup, env::REQUEST_TIMEOUT_SECS)? {
            config.request_timeout = Duration::from_secs(secs);
        }
        if let Some(ms) = parse_var::<u64, _>(&lookup, env::RETRY_BACKOFF_MS)? {
            config.retry_backoff = Duration::from_millis(ms);
        }

        config.validate()?;
        Ok(config)
    }

    /// Check that the base URL is an absolute http(s) URL.
    pub fn validate(&self) -> anyhow::Result<()> {
        let url = url::Url::parse(&self.base_url)
            .with_context(|| format!("invalid SGP base URL: {}", self.base_url))?;

        if !matches!(url.scheme(), "http" | "https") {
            anyhow::bail!("SGP base URL must use http or https, got {}", url.scheme());
        }
        Ok(())
    }

    /// Auth mode the client will prefer with these credentials.
    #[must_use]
    pub fn preferred_auth(&self) -> AuthMethod {
        crate::auth::AuthStrategy::new(self.credentials.clone(), self.rate_limits).preferred()
    }
}

fn normalize_base_url(url: String) -> String {
    url.trim().trim_end_matches('/').to_string()
}

fn parse_var<T, F>(lookup: &F, name: &str) -> anyhow::Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
    F: Fn(&str) -> Option<String>,
{
    lookup(name)
        .filter(|v| !v.trim().is_empty())
        .map(|v| v.trim().parse::<T>().with_context(|| format!("invalid value for {name}: {v}")))
        .transpose()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> + use<> {
        let map: HashMap<String, String> =
            vars.iter().map(|(k, v)| ((*k).to_string(), (*v).to_string())).collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_config_defaults() {
        let config = Config::new("https://sgp.example.com/", Credentials::default());
        assert_eq!(config.base_url, "https://sgp.example.com");
        assert_eq!(config.rate_limits, RateLimits::default());
        assert_eq!(config.retry_backoff, Duration::from_millis(1000));
        assert_eq!(config.request_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_from_lookup_requires_url() {
        let err = Config::from_lookup(lookup(&[])).unwrap_err();
        assert!(err.to_string().contains("SGP_URL"));
    }

    #[test]
    fn test_from_lookup_reads_credentials_and_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("SGP_URL", "https://sgp.example.com"),
            ("SGP_TOKEN", "tok"),
            ("SGP_APP", "erp"),
            ("SGP_RATE_LIMIT_TOKEN", "120"),
            ("SGP_CACHE_TTL_SECS", "60"),
            ("SGP_RETRY_BACKOFF_MS", "250"),
        ]))
        .unwrap();

        assert_eq!(config.credentials.token.as_deref(), Some("tok"));
        assert_eq!(config.credentials.app.as_deref(), Some("erp"));
        assert_eq!(config.rate_limits.token, 120);
        assert_eq!(config.rate_limits.basic, 100);
        assert_eq!(config.cache_ttl, Duration::from_secs(60));
        assert_eq!(config.retry_backoff, Duration::from_millis(250));
        assert_eq!(config.preferred_auth(), AuthMethod::Token);
    }

    #[test]
    fn test_from_lookup_rejects_bad_numbers() {
        let err = Config::from_lookup(lookup(&[
            ("SGP_URL", "https://sgp.example.com"),
            ("SGP_RATE_LIMIT_BASIC", "lots"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("SGP_RATE_LIMIT_BASIC"));
    }

    #[test]
    fn test_validate_rejects_non_http() {
        let config = Config::new("ftp://sgp.example.com", Credentials::default());
        assert!(config.validate().is_err());

        let config = Config::new("not a url", Credentials::default());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rate_limits_per_method() {
        let limits = RateLimits { basic: 1, token: 2, cpf_cnpj: 3 };
        assert_eq!(limits.for_method(AuthMethod::Basic), 1);
        assert_eq!(limits.for_method(AuthMethod::Token), 2);
        assert_eq!(limits.for_method(AuthMethod::CpfCnpj), 3);
    }
}
