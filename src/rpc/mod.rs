// RPC layer — gRPC-web transport, response cache and the unary call wrapper.

pub mod cache;
pub mod client;
pub mod grpc_web;
pub mod method;
pub mod request;
pub mod transport;

pub use cache::ResponseCache;
pub use client::{CallOptions, RpcClient, RpcResult};
pub use grpc_web::GrpcWebTransport;
pub use method::{Metadata, Method};
pub use tonic::{Code, Status};
pub use request::{request, watch_request, RequestState};
pub use transport::{UnaryOutput, UnaryTransport};
