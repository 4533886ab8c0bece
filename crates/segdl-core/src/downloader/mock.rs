//! Scripted in-process transport for fetcher and pipeline tests.

use crate::retry::TransportError;
use crate::transport::{HttpResponse, Transport};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

type Script = dyn Fn(u64, usize) -> Result<HttpResponse, TransportError> + Send + Sync;
type Latency = dyn Fn(u64) -> Duration + Send + Sync;

/// Answers each request with `script(id, attempt)`, where `attempt` is 1-based
/// per id. Records every requested id in order.
pub(crate) struct ScriptedTransport {
    script: Box<Script>,
    latency: Box<Latency>,
    attempts: Mutex<HashMap<u64, usize>>,
    requested: Mutex<Vec<u64>>,
}

impl ScriptedTransport {
    pub(crate) const TEMPLATE: &'static str = "mock://segments/{seg}";

    pub(crate) fn new(
        script: impl Fn(u64, usize) -> Result<HttpResponse, TransportError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            script: Box::new(script),
            latency: Box::new(|_| Duration::ZERO),
            attempts: Mutex::new(HashMap::new()),
            requested: Mutex::new(Vec::new()),
        }
    }

    /// Delay each response by `latency(id)` (virtual time in paused tests).
    pub(crate) fn with_latency(
        mut self,
        latency: impl Fn(u64) -> Duration + Send + Sync + 'static,
    ) -> Self {
        self.latency = Box::new(latency);
        self
    }

    pub(crate) fn requested(&self) -> Vec<u64> {
        self.requested.lock().unwrap().clone()
    }
}

impl Transport for ScriptedTransport {
    async fn get(&self, url: &str) -> Result<HttpResponse, TransportError> {
        let id: u64 = url
            .rsplit('/')
            .next()
            .and_then(|s| s.parse().ok())
            .unwrap_or_else(|| panic!("unexpected url {url}"));
        let attempt = {
            let mut attempts = self.attempts.lock().unwrap();
            let n = attempts.entry(id).or_insert(0);
            *n += 1;
            *n
        };
        self.requested.lock().unwrap().push(id);

        let latency = (self.latency)(id);
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
        (self.script)(id, attempt)
    }
}

/// Deterministic payload for `id`, 640 bytes, distinct per id.
pub(crate) fn payload(id: u64) -> Vec<u8> {
    let mut body = vec![(id % 251) as u8; 640];
    body[..8].copy_from_slice(&id.to_be_bytes());
    body
}

pub(crate) fn body_for(id: u64) -> Result<HttpResponse, TransportError> {
    Ok(HttpResponse {
        status: 200,
        body: payload(id),
    })
}

pub(crate) fn not_found() -> Result<HttpResponse, TransportError> {
    Ok(HttpResponse {
        status: 404,
        body: b"<html><body>404 Not Found</body></html>".to_vec(),
    })
}

pub(crate) fn status(code: u32) -> Result<HttpResponse, TransportError> {
    Ok(HttpResponse {
        status: code,
        body: b"error".to_vec(),
    })
}

pub(crate) fn timeout() -> Result<HttpResponse, TransportError> {
    // CURLE_OPERATION_TIMEDOUT
    Err(TransportError::Curl(curl::Error::new(28)))
}
