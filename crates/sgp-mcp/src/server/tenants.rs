//! Per-tenant client registry.
//!
//! A tenant is an SGP deployment plus the credentials used against it. Each
//! distinct tenant gets its own [`SgpClient`], and with it its own rate limiter
//! and cache, so quotas and cached responses never leak between tenants.

use std::collections::HashMap;
use std::sync::Arc;

use axum::http::HeaderMap;
use parking_lot::Mutex;
use sha2::{Digest, Sha256};

use crate::auth::Credentials;
use crate::client::SgpClient;
use crate::config::Config;

/// Request headers that select a tenant.
pub mod headers {
    pub const URL: &str = "x-sgp-url";
    pub const TOKEN: &str = "x-sgp-token";
    pub const APP: &str = "x-sgp-app";
    pub const USERNAME: &str = "x-sgp-username";
    pub const PASSWORD: &str = "x-sgp-password";
}

/// Tenant selection carried by request headers.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct TenantOverrides {
    pub url: Option<String>,
    pub token: Option<String>,
    pub app: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl TenantOverrides {
    /// Read the `x-sgp-*` headers. Blank or non-UTF-8 values are ignored.
    #[must_use]
    pub fn from_headers(map: &HeaderMap) -> Self {
        let get = |name: &str| {
            map.get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };

        Self {
            url: get(headers::URL),
            token: get(headers::TOKEN),
            app: get(headers::APP),
            username: get(headers::USERNAME),
            password: get(headers::PASSWORD),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Apply the overrides on top of `base`.
    ///
    /// A different URL starts from empty credentials: the default tenant's
    /// secrets are never sent to a caller-chosen host.
    #[must_use]
    pub fn apply(&self, base: &Config) -> Config {
        let mut config = base.clone();

        if let Some(url) = &self.url {
            let url = url.trim_end_matches('/');
            if url != base.base_url {
                config.credentials = Credentials::default();
                config.base_url = url.to_string();
            }
        }

        let creds = &mut config.credentials;
        for (slot, value) in [
            (&mut creds.token, &self.token),
            (&mut creds.app, &self.app),
            (&mut creds.username, &self.username),
            (&mut creds.password, &self.password),
        ] {
            if value.is_some() {
                slot.clone_from(value);
            }
        }

        config
    }
}

impl std::fmt::Debug for TenantOverrides {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TenantOverrides")
            .field("url", &self.url)
            .field("has_token", &self.token.is_some())
            .field("app", &self.app)
            .field("username", &self.username)
            .field("has_password", &self.password.is_some())
            .finish()
    }
}

/// Stable SHA-256 fingerprint of the tenant-identifying part of a config.
#[must_use]
pub fn fingerprint(config: &Config) -> String {
    let creds = &config.credentials;
    let mut hasher = Sha256::new();

    for part in [
        Some(&config.base_url),
        creds.username.as_ref(),
        creds.password.as_ref(),
        creds.token.as_ref(),
        creds.app.as_ref(),
        creds.cpfcnpj.as_ref(),
        creds.senha.as_ref(),
    ] {
        hasher.update(part.map_or("", String::as_str).as_bytes());
        hasher.update([0u8]);
    }

    hasher.finalize().iter().map(|b| format!("{b:02x}")).collect()
}

/// Fingerprint-keyed client registry. Clients are created lazily and kept for
/// the life of the process.
pub struct ClientRegistry {
    base: Config,
    clients: Mutex<HashMap<String, Arc<SgpClient>>>,
}

impl ClientRegistry {
    /// Registry whose default tenant is `base`, with its client pre-built.
    ///
    /// # Errors
    ///
    /// Returns error if the default client cannot be built.
    pub fn new(base: Config) -> anyhow::Result<Self> {
        let client = Arc::new(SgpClient::new(base.clone())?);
        let mut clients = HashMap::new();
        clients.insert(fingerprint(&base), client);

        Ok(Self { base, clients: Mutex::new(clients) })
    }

    /// Registry seeded with an existing client for the default tenant.
    #[must_use]
    pub fn with_client(base: Config, client: Arc<SgpClient>) -> Self {
        let mut clients = HashMap::new();
        clients.insert(fingerprint(&base), client);

        Self { base, clients: Mutex::new(clients) }
    }

    /// Client for the tenant the overrides select.
    ///
    /// # Errors
    ///
    /// Returns error if a new tenant's configuration is invalid.
    pub fn resolve(&self, overrides: &TenantOverrides) -> anyhow::Result<Arc<SgpClient>> {
        let config = overrides.apply(&self.base);
        let key = fingerprint(&config);

        let mut clients = self.clients.lock();
        if let Some(client) = clients.get(&key) {
            return Ok(Arc::clone(client));
        }

        let client = Arc::new(SgpClient::new(config)?);
        tracing::info!(
            tenant = %&key[..12],
            base_url = %client.base_url(),
            tenants = clients.len() + 1,
            "Created client for new tenant"
        );
        clients.insert(key, Arc::clone(&client));
        Ok(client)
    }

    /// The default tenant's client.
    ///
    /// # Errors
    ///
    /// Returns error only if the default client could not be rebuilt.
    pub fn default_client(&self) -> anyhow::Result<Arc<SgpClient>> {
        self.resolve(&TenantOverrides::default())
    }

    /// Number of tenants seen so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.clients.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for ClientRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientRegistry")
            .field("base_url", &self.base.base_url)
            .field("tenants", &self.len())
            .finish()
    }
}
