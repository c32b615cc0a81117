// Client engine for the contest judging site: page context, contest countdown,
// cached gRPC-web calls and the persisted client session.

pub mod auth;
pub mod config;
pub mod context;
pub mod countdown;
pub mod page;
pub mod rpc;
pub mod storage;
pub mod telemetry;
pub mod times;
