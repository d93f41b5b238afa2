//! The RPC engine: call framing, reply header validation, and status
//! dispatch. Payload-agnostic — marshalling a particular procedure's
//! arguments and return value is the caller's job (see `virtdriver-client`).

pub mod engine;
pub mod error;

pub use engine::RpcEngine;
pub use error::RpcError;
