//! libcurl-backed transport. Each request runs on tokio's blocking pool.

use super::{HttpResponse, Transport};
use crate::retry::TransportError;
use std::time::Duration;

/// Per-request curl settings.
#[derive(Debug, Clone)]
pub struct CurlOptions {
    /// Hard wall-clock limit for one request (connect + transfer).
    pub timeout: Duration,
    /// Optional `User-Agent` header.
    pub user_agent: Option<String>,
}

impl Default for CurlOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            user_agent: None,
        }
    }
}

/// [`Transport`] implementation using one curl `Easy` handle per request.
#[derive(Debug, Clone, Default)]
pub struct CurlTransport {
    options: CurlOptions,
}

impl CurlTransport {
    pub fn new(options: CurlOptions) -> Self {
        Self { options }
    }
}

impl Transport for CurlTransport {
    async fn get(&self, url: &str) -> Result<HttpResponse, TransportError> {
        let url = url.to_owned();
        let options = self.options.clone();
        tokio::task::spawn_blocking(move || perform_get(&url, &options))
            .await
            .map_err(|e| TransportError::Task(e.to_string()))?
    }
}

/// Blocking GET. Follows redirects; buffers the whole body in memory.
fn perform_get(url: &str, options: &CurlOptions) -> Result<HttpResponse, TransportError> {
    let mut body = Vec::new();

    let mut easy = curl::easy::Easy::new();
    easy.url(url)?;
    easy.follow_location(true)?;
    easy.connect_timeout(options.timeout)?;
    easy.timeout(options.timeout)?;
    // Empty string enables every encoding curl was built with.
    easy.accept_encoding("")?;
    if let Some(ua) = &options.user_agent {
        easy.useragent(ua)?;
    }

    {
        let mut transfer = easy.transfer();
        transfer.write_function(|data| {
            body.extend_from_slice(data);
            Ok(data.len())
        })?;
        transfer.perform()?;
    }

    let status = easy.response_code()?;
    tracing::trace!(url, status, len = body.len(), "GET complete");
    Ok(HttpResponse { status, body })
}
