//! HTTP transport seam.
//!
//! Fetchers and the resolver only see the [`Transport`] trait: one GET that
//! yields a status and a fully buffered body, or a [`TransportError`] when no
//! response arrived. Production code uses [`CurlTransport`]; tests script
//! responses in-process.

mod easy;

pub use easy::{CurlOptions, CurlTransport};

use crate::retry::TransportError;
use std::future::Future;

/// A complete HTTP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u32,
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Body decoded as UTF-8, lossily.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Something that can perform a GET request.
pub trait Transport: Send + Sync + 'static {
    fn get(&self, url: &str) -> impl Future<Output = Result<HttpResponse, TransportError>> + Send;
}
