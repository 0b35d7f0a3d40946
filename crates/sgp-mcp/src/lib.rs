//! SGP MCP Server
//!
//! Tool server for the SGP ISP-management REST API. Every outbound call goes
//! through one orchestration path: response cache, local sliding-window quota,
//! credential injection for the selected auth mode, then the HTTP exchange with
//! a single retry when SGP answers 429.
//!
//! # Features
//!
//! - **Three auth modes**: operator basic auth, API token, customer CPF/CNPJ
//! - **Rate-limited**: per-mode quotas over a rolling 60 s window
//! - **Cached**: 5-minute TTL cache for operator-wide reads
//! - **Uniform results**: every upstream outcome is a `{status, message, data}` envelope
//!
//! # Example
//!
//! ```no_run
//! use sgp_mcp::{client::RequestOptions, config::Config, SgpClient};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env()?;
//!     let client = SgpClient::new(config)?;
//!
//!     let onus = client.list_onus(1, 20, RequestOptions::default()).await?;
//!     println!("{}", onus.message);
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod models;
pub mod rate_limit;
pub mod server;
pub mod tools;

pub use auth::{AuthMethod, AuthStrategy, Credentials};
pub use cache::ResponseCache;
pub use client::{RequestOptions, SgpClient};
pub use config::Config;
pub use error::{ClientError, ToolError};
pub use models::ResponseEnvelope;
pub use rate_limit::RateLimiter;
