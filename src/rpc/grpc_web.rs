// gRPC-web transport over reqwest — frames unary requests and parses responses.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use bytes::{Buf, BufMut, Bytes, BytesMut};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::{Client, RequestBuilder, StatusCode};
use tonic::{Code, Status};
use tracing::{debug, warn};

use super::method::Metadata;
use super::transport::{UnaryOutput, UnaryTransport};
use crate::config::ClientConfig;

pub const GRPC_WEB_CONTENT_TYPE: &str = "application/grpc-web+proto";

const FRAME_HEADER_LEN: usize = 5;
const FLAG_COMPRESSED: u8 = 0x01;
const FLAG_TRAILERS: u8 = 0x80;

pub struct GrpcWebTransport {
    client: Client,
    base: String,
}

impl GrpcWebTransport {
    pub fn new(base: String) -> Self {
        Self {
            client: Client::new(),
            base: base.trim_end_matches('/').to_string(),
        }
    }

    /// Transport for the API next to a page served from `hostname`.
    pub fn for_host(config: &ClientConfig, hostname: &str) -> Self {
        let base = config.api_address(hostname);
        debug!("api address {}", base);
        Self::new(base)
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    fn build_request(&self, path: &str, request: &[u8], metadata: &Metadata) -> RequestBuilder {
        let mut req = self
            .client
            .post(format!("{}{}", self.base, path))
            .header(CONTENT_TYPE, GRPC_WEB_CONTENT_TYPE)
            .header(ACCEPT, GRPC_WEB_CONTENT_TYPE)
            .header("x-grpc-web", "1");
        for (k, v) in metadata {
            req = req.header(k.as_str(), v.as_str());
        }
        req.body(encode_frame(request))
    }
}

#[async_trait]
impl UnaryTransport for GrpcWebTransport {
    async fn unary(&self, path: &str, request: Bytes, metadata: &Metadata) -> Result<UnaryOutput> {
        let resp = self.build_request(path, &request, metadata).send().await?;

        let http_status = resp.status();
        let headers = resp.headers().clone();
        if !http_status.is_success() {
            warn!("rpc {} failed: HTTP {}", path, http_status.as_u16());
            return Ok(UnaryOutput {
                status: Status::new(
                    code_for_http(http_status),
                    format!("HTTP {}", http_status.as_u16()),
                ),
                headers: collect_headers(&headers),
                message: None,
                trailers: Metadata::new(),
            });
        }

        let body = resp.bytes().await?;
        let (message, trailers) = decode_body(body)?;
        let status = response_status(&trailers, &headers);
        debug!("rpc {} completed status={:?}", path, status.code());

        Ok(UnaryOutput {
            status,
            headers: collect_headers(&headers),
            message,
            trailers: collect_headers(&trailers),
        })
    }
}

/// Status of a 2xx response. Trailers-only responses carry it in the headers.
pub fn response_status(trailers: &HeaderMap, headers: &HeaderMap) -> Status {
    Status::from_header_map(trailers)
        .or_else(|| Status::from_header_map(headers))
        .unwrap_or_else(|| {
            warn!("response has no grpc-status");
            Status::new(Code::Unknown, "missing grpc-status")
        })
}

/// Code implied by a failed HTTP response that carried no gRPC status.
pub fn code_for_http(status: StatusCode) -> Code {
    match status {
        StatusCode::BAD_REQUEST => Code::Internal,
        StatusCode::UNAUTHORIZED => Code::Unauthenticated,
        StatusCode::FORBIDDEN => Code::PermissionDenied,
        StatusCode::NOT_FOUND => Code::Unimplemented,
        StatusCode::TOO_MANY_REQUESTS
        | StatusCode::BAD_GATEWAY
        | StatusCode::SERVICE_UNAVAILABLE
        | StatusCode::GATEWAY_TIMEOUT => Code::Unavailable,
        _ => Code::Unknown,
    }
}

fn collect_headers(headers: &HeaderMap) -> Metadata {
    headers
        .iter()
        .filter_map(|(k, v)| Some((k.as_str().to_string(), v.to_str().ok()?.to_string())))
        .collect()
}

/// Wrap an encoded message in a gRPC-web data frame.
pub fn encode_frame(message: &[u8]) -> Bytes {
    let mut buf = BytesMut::with_capacity(FRAME_HEADER_LEN + message.len());
    buf.put_u8(0);
    buf.put_u32(message.len() as u32);
    buf.put_slice(message);
    buf.freeze()
}

/// Split a response body into its first data frame and the trailer block.
pub fn decode_body(mut body: Bytes) -> Result<(Option<Bytes>, HeaderMap)> {
    let mut message = None;
    let mut trailers = HeaderMap::new();

    while body.has_remaining() {
        if body.remaining() < FRAME_HEADER_LEN {
            return Err(anyhow!("truncated frame header ({} bytes)", body.remaining()));
        }
        let flags = body.get_u8();
        let len = body.get_u32() as usize;
        if body.remaining() < len {
            return Err(anyhow!(
                "truncated frame: want {} bytes, have {}",
                len,
                body.remaining()
            ));
        }
        let payload = body.split_to(len);

        if flags & FLAG_TRAILERS != 0 {
            parse_trailers(&payload, &mut trailers);
        } else if flags & FLAG_COMPRESSED != 0 {
            return Err(anyhow!("compressed frames are not supported"));
        } else if message.is_none() {
            message = Some(payload);
        }
    }

    Ok((message, trailers))
}

// Trailer lines that are not valid headers are skipped.
fn parse_trailers(block: &[u8], trailers: &mut HeaderMap) {
    for line in String::from_utf8_lossy(block).split("\r\n") {
        let Some((k, v)) = line.split_once(':') else {
            continue;
        };
        let name = HeaderName::from_bytes(k.trim().to_ascii_lowercase().as_bytes());
        let value = HeaderValue::from_str(v.trim());
        if let (Ok(name), Ok(value)) = (name, value) {
            trailers.append(name, value);
        }
    }
}
