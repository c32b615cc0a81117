// RpcClient behavior against a scripted in-process transport.

use std::sync::Arc;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use prost::Message;
use tokio::sync::Barrier;

use contest_client::auth::TokenStore;
use contest_client::rpc::{
    watch_request, CallOptions, Code, Metadata, Method, RequestState, RpcClient, RpcResult,
    UnaryOutput, UnaryTransport,
};
use contest_client::storage::MemoryStore;

#[derive(Clone, PartialEq, Message)]
struct GetProblemRequest {
    #[prost(string, tag = "1")]
    short_name: String,
}

#[derive(Clone, PartialEq, Message)]
struct GetProblemResponse {
    #[prost(string, tag = "1")]
    statement: String,
}

const GET_PROBLEM: Method<GetProblemRequest, GetProblemResponse> =
    Method::new("omogenjudge.problems.ProblemService", "GetProblem");
const GET_STATEMENT: Method<GetProblemRequest, GetProblemResponse> =
    Method::new("omogenjudge.problems.ProblemService", "GetStatement");

struct Call {
    path: String,
    request: Bytes,
    metadata: Metadata,
}

type Responder = Box<dyn Fn(&str, &GetProblemRequest) -> Result<UnaryOutput> + Send + Sync>;

fn responder<F>(f: F) -> Responder
where
    F: Fn(&str, &GetProblemRequest) -> Result<UnaryOutput> + Send + Sync + 'static,
{
    Box::new(f)
}

/// Records every call and answers through `respond`.
struct ScriptedTransport {
    calls: Mutex<Vec<Call>>,
    respond: Responder,
    gate: Option<Arc<Barrier>>,
}

impl ScriptedTransport {
    fn new(respond: Responder) -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            respond,
            gate: None,
        })
    }

    fn gated(respond: Responder, gate: Arc<Barrier>) -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            respond,
            gate: Some(gate),
        })
    }

    fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    fn last_authorization(&self) -> Option<String> {
        self.calls.lock().last()?.metadata.get("authorization").cloned()
    }
}

#[async_trait]
impl UnaryTransport for ScriptedTransport {
    async fn unary(&self, path: &str, request: Bytes, metadata: &Metadata) -> Result<UnaryOutput> {
        self.calls.lock().push(Call {
            path: path.to_string(),
            request: request.clone(),
            metadata: metadata.clone(),
        });
        if let Some(gate) = &self.gate {
            gate.wait().await;
        }
        let decoded = GetProblemRequest::decode(request)?;
        (self.respond)(path, &decoded)
    }
}

fn statement_for(req: &GetProblemRequest) -> UnaryOutput {
    let resp = GetProblemResponse {
        statement: format!("statement of {}", req.short_name),
    };
    UnaryOutput::ok(Bytes::from(resp.encode_to_vec()))
}

fn client(transport: Arc<ScriptedTransport>) -> RpcClient {
    RpcClient::new(transport, TokenStore::new(Arc::new(MemoryStore::new())))
}

fn req(name: &str) -> GetProblemRequest {
    GetProblemRequest {
        short_name: name.to_string(),
    }
}

#[tokio::test]
async fn test_success_returns_decoded_message() {
    let transport = ScriptedTransport::new(responder(|_, r| Ok(statement_for(r))));
    let client = client(transport.clone());

    let result = client
        .call(&GET_PROBLEM, &req("hello"), CallOptions::default())
        .await
        .unwrap();
    assert_eq!(
        result.message().map(|m| m.statement.as_str()),
        Some("statement of hello")
    );

    let calls = transport.calls.lock();
    assert_eq!(calls[0].path, "/omogenjudge.problems.ProblemService/GetProblem");
    assert_eq!(calls[0].request, Bytes::from(req("hello").encode_to_vec()));
}

#[tokio::test]
async fn test_cached_calls_hit_network_once() {
    let transport = ScriptedTransport::new(responder(|_, r| Ok(statement_for(r))));
    let client = client(transport.clone());

    let first = client
        .call(&GET_PROBLEM, &req("hello"), CallOptions::cached())
        .await
        .unwrap();
    let second = client
        .call(&GET_PROBLEM, &req("hello"), CallOptions::cached())
        .await
        .unwrap();

    assert_eq!(first.message(), second.message());
    assert_eq!(transport.call_count(), 1);
    assert_eq!(client.cache().len(), 1);
}

#[tokio::test]
async fn test_uncached_calls_always_hit_network() {
    let transport = ScriptedTransport::new(responder(|_, r| Ok(statement_for(r))));
    let client = client(transport.clone());

    for _ in 0..3 {
        client
            .call(&GET_PROBLEM, &req("hello"), CallOptions::default())
            .await
            .unwrap();
    }
    assert_eq!(transport.call_count(), 3);
    assert!(client.cache().is_empty());

    // An uncached call never populates the cache for a later cached call.
    client
        .call(&GET_PROBLEM, &req("hello"), CallOptions::cached())
        .await
        .unwrap();
    assert_eq!(transport.call_count(), 4);
}

#[tokio::test]
async fn test_cache_keyed_by_request_and_method() {
    let transport = ScriptedTransport::new(responder(|_, r| Ok(statement_for(r))));
    let client = client(transport.clone());

    client.call(&GET_PROBLEM, &req("a"), CallOptions::cached()).await.unwrap();
    client.call(&GET_PROBLEM, &req("b"), CallOptions::cached()).await.unwrap();
    client.call(&GET_STATEMENT, &req("a"), CallOptions::cached()).await.unwrap();
    assert_eq!(transport.call_count(), 3);

    let hit = client
        .call(&GET_PROBLEM, &req("b"), CallOptions::cached())
        .await
        .unwrap();
    assert_eq!(hit.message().unwrap().statement, "statement of b");
    assert_eq!(transport.call_count(), 3);
    assert_eq!(client.cache().method_len(&GET_PROBLEM.path()), 2);
}

#[tokio::test]
async fn test_failures_are_values_and_not_cached() {
    let transport = ScriptedTransport::new(responder(|_, _| {
        Ok(UnaryOutput::failed(Code::NotFound, "no such problem"))
    }));
    let client = client(transport.clone());

    for _ in 0..2 {
        let result = client
            .call(&GET_PROBLEM, &req("missing"), CallOptions::cached())
            .await
            .unwrap();
        match result {
            RpcResult::Failure(status) => {
                assert_eq!(status.code(), Code::NotFound);
                assert_eq!(status.message(), "no such problem");
            }
            RpcResult::Success(_) => panic!("expected failure"),
        }
    }
    assert_eq!(transport.call_count(), 2);
    assert!(client.cache().is_empty());
}

#[tokio::test]
async fn test_transport_errors_propagate() {
    let transport = ScriptedTransport::new(responder(|_, _| Err(anyhow!("connection refused"))));
    let client = client(transport);

    let err = client
        .call(&GET_PROBLEM, &req("hello"), CallOptions::cached())
        .await
        .unwrap_err();
    assert!(err.to_string().contains("connection refused"));
    assert!(client.cache().is_empty());
}

#[tokio::test]
async fn test_undecodable_response_is_an_error() {
    let transport = ScriptedTransport::new(responder(|_, _| {
        Ok(UnaryOutput::ok(Bytes::from_static(&[0x0a, 0x05, b'a'])))
    }));
    let client = client(transport);

    assert!(client
        .call(&GET_PROBLEM, &req("hello"), CallOptions::cached())
        .await
        .is_err());
    assert!(client.cache().is_empty());
}

#[tokio::test]
async fn test_empty_ok_body_decodes_default() {
    let transport = ScriptedTransport::new(responder(|_, _| {
        let mut out = UnaryOutput::ok(Bytes::new());
        out.message = None;
        Ok(out)
    }));
    let client = client(transport);

    let result = client
        .call(&GET_PROBLEM, &req("hello"), CallOptions::default())
        .await
        .unwrap();
    assert_eq!(result.message(), Some(&GetProblemResponse::default()));
}

#[tokio::test]
async fn test_authorization_token_propagates() {
    let transport = ScriptedTransport::new(responder(|_, r| {
        let out = statement_for(r);
        Ok(match r.short_name.as_str() {
            "login" => out.with_header("Authorization", "X"),
            "keep" => out.with_header("authorization", "X"),
            _ => out,
        })
    }));
    let client = client(transport.clone());

    client.call(&GET_PROBLEM, &req("login"), CallOptions::default()).await.unwrap();
    assert_eq!(transport.last_authorization(), None);
    assert_eq!(client.tokens().token().as_deref(), Some("X"));

    // Any method carries the token on the next call.
    client.call(&GET_STATEMENT, &req("keep"), CallOptions::default()).await.unwrap();
    assert_eq!(transport.last_authorization().as_deref(), Some("X"));

    // "keep" answered with the token again, so the next call still carries it;
    // that call's response has no header and clears it.
    client.call(&GET_PROBLEM, &req("other"), CallOptions::default()).await.unwrap();
    assert_eq!(transport.last_authorization().as_deref(), Some("X"));
    assert_eq!(client.tokens().token(), None);

    client.call(&GET_PROBLEM, &req("other"), CallOptions::default()).await.unwrap();
    assert_eq!(transport.last_authorization(), None);
}

#[tokio::test]
async fn test_failed_response_still_updates_token() {
    let transport = ScriptedTransport::new(responder(|_, _| {
        Ok(UnaryOutput::failed(Code::Unauthenticated, "bad password").with_header("authorization", "anon"))
    }));
    let client = client(transport);

    client.call(&GET_PROBLEM, &req("x"), CallOptions::default()).await.unwrap();
    assert_eq!(client.tokens().token().as_deref(), Some("anon"));
}

#[tokio::test]
async fn test_cache_hit_leaves_token_untouched() {
    let transport = ScriptedTransport::new(responder(|_, r| Ok(statement_for(r).with_header("authorization", "T"))));
    let client = client(transport.clone());

    client.call(&GET_PROBLEM, &req("a"), CallOptions::cached()).await.unwrap();
    client.tokens().clear_token();
    client.call(&GET_PROBLEM, &req("a"), CallOptions::cached()).await.unwrap();
    assert_eq!(transport.call_count(), 1);
    assert_eq!(client.tokens().token(), None);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_concurrent_identical_calls_both_miss() {
    let gate = Arc::new(Barrier::new(2));
    let transport = ScriptedTransport::gated(responder(|_, r| Ok(statement_for(r))), gate);
    let client = Arc::new(client(transport.clone()));

    let a = {
        let client = client.clone();
        tokio::spawn(async move { client.call(&GET_PROBLEM, &req("hello"), CallOptions::cached()).await })
    };
    let b = {
        let client = client.clone();
        tokio::spawn(async move { client.call(&GET_PROBLEM, &req("hello"), CallOptions::cached()).await })
    };
    let a = a.await.unwrap().unwrap();
    let b = b.await.unwrap().unwrap();

    assert_eq!(a.message(), b.message());
    assert_eq!(transport.call_count(), 2);
    assert_eq!(client.cache().len(), 1);
}

#[tokio::test]
async fn test_watch_request_projects_outcome() {
    let transport = ScriptedTransport::new(responder(|_, r| {
        if r.short_name == "missing" {
            Ok(UnaryOutput::failed(Code::NotFound, "gone"))
        } else if r.short_name == "offline" {
            Err(anyhow!("network down"))
        } else {
            Ok(statement_for(r))
        }
    }));
    let client = Arc::new(client(transport));

    let mut rx = watch_request(client.clone(), GET_PROBLEM, req("hello"), CallOptions::default());
    let state = rx.wait_for(|s| !s.is_loading()).await.unwrap().clone();
    assert!(matches!(state, RequestState::Loaded(ref m) if m.statement == "statement of hello"));

    let mut rx = watch_request(client.clone(), GET_PROBLEM, req("missing"), CallOptions::default());
    let state = rx.wait_for(|s| !s.is_loading()).await.unwrap().clone();
    assert!(matches!(state, RequestState::Failed(ref status) if status.code() == Code::NotFound));

    let mut rx = watch_request(client, GET_PROBLEM, req("offline"), CallOptions::default());
    let state = rx.wait_for(|s| !s.is_loading()).await.unwrap().clone();
    assert!(matches!(state, RequestState::TransportFailed(msg) if msg.contains("network down")));
}
