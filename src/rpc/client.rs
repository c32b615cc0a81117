// Unary RPC client — opt-in response memoization and authorization token propagation.

use std::sync::Arc;

use anyhow::Result;
use bytes::Bytes;
use prost::Message;
use tonic::{Code, Status};
use tracing::debug;

use super::cache::ResponseCache;
use super::method::{Metadata, Method};
use super::transport::UnaryTransport;
use crate::auth::TokenStore;
use crate::config::AUTHORIZATION_HEADER;

#[derive(Debug, Clone, Copy, Default)]
pub struct CallOptions {
    /// Serve from and store into the response cache.
    pub cache: bool,
}

impl CallOptions {
    pub fn cached() -> Self {
        Self { cache: true }
    }
}

/// Outcome of a completed call.
#[derive(Debug, Clone)]
pub enum RpcResult<M> {
    Success(M),
    Failure(Status),
}

impl<M> RpcResult<M> {
    pub fn is_success(&self) -> bool {
        matches!(self, RpcResult::Success(_))
    }

    pub fn message(&self) -> Option<&M> {
        match self {
            RpcResult::Success(m) => Some(m),
            RpcResult::Failure(_) => None,
        }
    }

    pub fn into_result(self) -> Result<M, Status> {
        match self {
            RpcResult::Success(m) => Ok(m),
            RpcResult::Failure(status) => Err(status),
        }
    }
}

pub struct RpcClient {
    transport: Arc<dyn UnaryTransport>,
    cache: ResponseCache,
    tokens: TokenStore,
}

impl RpcClient {
    pub fn new(transport: Arc<dyn UnaryTransport>, tokens: TokenStore) -> Self {
        Self {
            transport,
            cache: ResponseCache::new(),
            tokens,
        }
    }

    pub fn cache(&self) -> &ResponseCache {
        &self.cache
    }

    pub fn tokens(&self) -> &TokenStore {
        &self.tokens
    }

    /// Perform a unary call.
    ///
    /// RPC errors are returned as `RpcResult::Failure`. `Err` means the call
    /// itself failed: transport errors and undecodable responses.
    pub async fn call<Req, Resp>(
        &self,
        method: &Method<Req, Resp>,
        request: &Req,
        options: CallOptions,
    ) -> Result<RpcResult<Resp>>
    where
        Req: Message,
        Resp: Message + Default,
    {
        let path = method.path();
        let body = Bytes::from(request.encode_to_vec());

        if options.cache {
            if let Some(hit) = self.cache.get(&path, &body) {
                debug!("rpc cache hit {}", path);
                return Ok(RpcResult::Success(Resp::decode(hit)?));
            }
            debug!("rpc cache miss {}", path);
        }

        let mut metadata = Metadata::new();
        if let Some(token) = self.tokens.token() {
            metadata.insert(AUTHORIZATION_HEADER.to_string(), token);
        }

        let output = self.transport.unary(&path, body.clone(), &metadata).await?;

        match output.headers.get(AUTHORIZATION_HEADER) {
            Some(token) => self.tokens.set_token(token),
            None => self.tokens.clear_token(),
        }

        if output.status.code() != Code::Ok {
            debug!(
                "rpc {} returned {:?}: {}",
                path,
                output.status.code(),
                output.status.message()
            );
            return Ok(RpcResult::Failure(output.status));
        }

        let raw = output.message.unwrap_or_default();
        let message = Resp::decode(raw.clone())?;
        if options.cache {
            self.cache.insert(&path, body, raw);
        }
        Ok(RpcResult::Success(message))
    }
}
