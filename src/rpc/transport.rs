use anyhow::Result;
use async_trait::async_trait;
use bytes::Bytes;
use tonic::{Code, Status};

use super::method::Metadata;

/// Everything a completed unary call produced.
#[derive(Debug, Clone)]
pub struct UnaryOutput {
    pub status: Status,
    pub headers: Metadata,
    /// Encoded response message; `None` when the server sent no data frame.
    pub message: Option<Bytes>,
    pub trailers: Metadata,
}

impl UnaryOutput {
    /// Successful output carrying `message`.
    pub fn ok(message: Bytes) -> Self {
        Self {
            status: Status::new(Code::Ok, ""),
            headers: Metadata::new(),
            message: Some(message),
            trailers: Metadata::new(),
        }
    }

    /// Failed output without a message.
    pub fn failed(code: Code, message: impl Into<String>) -> Self {
        Self {
            status: Status::new(code, message),
            headers: Metadata::new(),
            message: None,
            trailers: Metadata::new(),
        }
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.to_string());
        self
    }
}

/// Carries a unary request to the API.
///
/// `Err` is reserved for transport failures (connection refused, malformed
/// framing). RPC errors come back as an `UnaryOutput` with a non-OK status.
#[async_trait]
pub trait UnaryTransport: Send + Sync {
    async fn unary(&self, path: &str, request: Bytes, metadata: &Metadata) -> Result<UnaryOutput>;
}
