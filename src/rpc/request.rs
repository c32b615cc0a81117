// Request lifecycle projection for UI code: loading, then a message or an error.

use std::sync::Arc;

use prost::Message;
use tokio::sync::watch;
use tonic::Status;
use tracing::error;

use super::client::{CallOptions, RpcClient, RpcResult};
use super::method::Method;

#[derive(Debug, Clone)]
pub enum RequestState<M> {
    Loading,
    Loaded(M),
    Failed(Status),
    /// The call itself failed before producing a status.
    TransportFailed(String),
}

impl<M> RequestState<M> {
    pub fn is_loading(&self) -> bool {
        matches!(self, RequestState::Loading)
    }
}

/// Run a call and project its outcome onto a `RequestState`.
pub async fn request<Req, Resp>(
    client: &RpcClient,
    method: &Method<Req, Resp>,
    request: &Req,
    options: CallOptions,
) -> RequestState<Resp>
where
    Req: Message,
    Resp: Message + Default,
{
    match client.call(method, request, options).await {
        Ok(RpcResult::Success(message)) => RequestState::Loaded(message),
        Ok(RpcResult::Failure(status)) => RequestState::Failed(status),
        Err(e) => {
            error!("rpc {:?} failed: {:#}", method, e);
            RequestState::TransportFailed(e.to_string())
        }
    }
}

/// Start a call in the background. The receiver starts at `Loading` and sees
/// exactly one further state.
pub fn watch_request<Req, Resp>(
    client: Arc<RpcClient>,
    method: Method<Req, Resp>,
    req: Req,
    options: CallOptions,
) -> watch::Receiver<RequestState<Resp>>
where
    Req: Message + 'static,
    Resp: Message + Default + 'static,
{
    let (tx, rx) = watch::channel(RequestState::Loading);
    tokio::spawn(async move {
        let state = request(&client, &method, &req, options).await;
        let _ = tx.send(state);
    });
    rx
}
