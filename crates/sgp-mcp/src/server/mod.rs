//! HTTP server exposing the SGP tools.
//!
//! One [`SgpClient`] per tenant (see [`tenants`]); the default tenant comes
//! from the process configuration.

pub mod router;
pub mod tenants;

use std::net::SocketAddr;
use std::sync::Arc;

use crate::client::SgpClient;
use crate::config::Config;
use crate::tools::ToolRegistry;

pub use router::{AppState, create_router};
pub use tenants::{ClientRegistry, TenantOverrides};

/// Tool server for SGP.
pub struct SgpServer {
    state: Arc<AppState>,
}

impl SgpServer {
    /// Create a server whose default tenant is `config`.
    ///
    /// # Errors
    ///
    /// Returns error if the default client cannot be built.
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let tenants = ClientRegistry::new(config)?;
        Ok(Self::from_parts(ToolRegistry::new(), tenants))
    }

    /// Create a server around an existing default client.
    #[must_use]
    pub fn with_client(config: Config, client: SgpClient) -> Self {
        let tenants = ClientRegistry::with_client(config, Arc::new(client));
        Self::from_parts(ToolRegistry::new(), tenants)
    }

    fn from_parts(tools: ToolRegistry, tenants: ClientRegistry) -> Self {
        Self { state: Arc::new(AppState::new(tools, tenants)) }
    }

    /// The axum router serving this server's state.
    #[must_use]
    pub fn router(&self) -> axum::Router {
        create_router(Arc::clone(&self.state))
    }

    /// Run the server in HTTP mode until Ctrl+C.
    ///
    /// # Errors
    ///
    /// Returns error on server failure.
    pub async fn run_http(self, port: u16) -> anyhow::Result<()> {
        tracing::info!("Starting SGP tool server on port {}", port);
        tracing::info!("Registered {} tools", self.state.tools.len());

        let router = self.router();
        let addr = SocketAddr::from(([0, 0, 0, 0], port));

        let listener = tokio::net::TcpListener::bind(addr).await?;
        tracing::info!("HTTP server listening on http://{}", addr);

        axum::serve(listener, router).with_graceful_shutdown(shutdown_signal()).await?;

        tracing::info!("HTTP server shut down");
        Ok(())
    }

    #[must_use]
    pub fn tools(&self) -> &ToolRegistry {
        &self.state.tools
    }

    #[must_use]
    pub fn tenants(&self) -> &ClientRegistry {
        &self.state.tenants
    }
}

impl std::fmt::Debug for SgpServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SgpServer").field("state", &self.state).finish()
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Received shutdown signal");
}
