//! Middleware for the outbound HTTP client.
//!
//! Composed into the `reqwest-middleware` stack so every exchange with SGP,
//! including the retry after a 429, is logged once.

use std::time::Instant;

use http::Extensions;
use reqwest::{Request, Response};
use reqwest_middleware::{Middleware, Next, Result};

/// Logs method, path, status and latency of each outbound request.
///
/// Only the URL path is logged: token auth puts credentials in the query
/// string.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingMiddleware;

#[async_trait::async_trait]
impl Middleware for TracingMiddleware {
    async fn handle(
        &self,
        req: Request,
        extensions: &mut Extensions,
        next: Next<'_>,
    ) -> Result<Response> {
        let method = req.method().clone();
        let path = req.url().path().to_string();
        let started = Instant::now();

        let result = next.run(req, extensions).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        match &result {
            Ok(response) => tracing::debug!(
                %method,
                path = %path,
                status = response.status().as_u16(),
                elapsed_ms,
                "SGP exchange"
            ),
            Err(err) => tracing::warn!(
                %method,
                path = %path,
                error = %err,
                elapsed_ms,
                "SGP exchange failed"
            ),
        }

        result
    }
}
