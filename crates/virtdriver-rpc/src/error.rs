use thiserror::Error;
use virtdriver_wire::{StructuredError, WireError};

/// Errors raised by a single [`crate::RpcEngine::call`].
#[derive(Debug, Error)]
pub enum RpcError {
    #[error("i/o error talking to the daemon: {0}")]
    Io(#[from] std::io::Error),

    #[error("socket closed unexpectedly")]
    UnexpectedEof,

    #[error(transparent)]
    Wire(#[from] WireError),

    #[error("reply header mismatch: {field} (expected {expected}, received {received})")]
    HeaderMismatch {
        field: &'static str,
        expected: u32,
        received: u32,
    },

    #[error("unmarshalling {0} failed")]
    UnmarshalFailed(&'static str),

    #[error("unknown status {0} in reply header")]
    UnknownStatus(u32),

    #[error("remote call failed: {}", .0.message.as_deref().unwrap_or("no message"))]
    Server(StructuredError),
}
