use thiserror::Error;
use virtdriver_wire::StructuredError;

/// The stable error taxonomy exposed across this crate's boundary. Every
/// lower-layer error (URI, transport, TLS, RPC, wire) is converted into one
/// of these variants; the underlying cause is still logged at
/// `tracing::debug!` on conversion so a `RUST_LOG=debug` run shows it.
#[derive(Debug, Error)]
pub enum DriverError {
    #[error("invalid argument: {0}")]
    InvalidArg(String),

    /// Surfaced only where a fallible allocation genuinely occurs. Rust's
    /// global allocator aborts the process on OOM everywhere else, so this
    /// variant exists for protocol parity but is rarely constructed.
    #[error("out of memory")]
    NoMemory,

    #[error("system error: {0}")]
    SystemError(String),

    #[error("TLS error: {0}")]
    TlsError(String),

    /// A protocol-level fault with no associated server-side structured
    /// record: framing, a header mismatch, an oversize frame, unexpected
    /// EOF, an unmarshalling failure, or a TLS-layer failure that the
    /// upstream driver itself classifies as RPC rather than TLS (peer
    /// certificate rejected, server verification ack missing/wrong).
    #[error("RPC error: {0}")]
    Rpc(String),

    /// A `status = Error` reply from the server, carried with full fidelity
    /// — subsystem, code, level, free-form strings, and any domain/network
    /// reference it names — rather than collapsed to its message string.
    #[error("remote call failed: {}", .0.message.as_deref().unwrap_or("no message"))]
    Server(Box<StructuredError>),
}

impl From<virtdriver_uri::UriError> for DriverError {
    fn from(e: virtdriver_uri::UriError) -> Self {
        tracing::debug!(error = %e, "uri parse failure");
        DriverError::InvalidArg(e.to_string())
    }
}

impl From<virtdriver_tls::TlsError> for DriverError {
    fn from(e: virtdriver_tls::TlsError) -> Self {
        tracing::debug!(error = %e, "tls failure");
        match e {
            // The upstream driver tags certificate-verification and
            // post-handshake ack failures VIR_ERR_RPC, reserving its TLS
            // error class for raw library/transport mechanics.
            virtdriver_tls::TlsError::Verification(msg) => DriverError::Rpc(msg),
            virtdriver_tls::TlsError::ServerAck(msg) => DriverError::Rpc(msg),
            other => DriverError::TlsError(other.to_string()),
        }
    }
}

impl From<virtdriver_transport::TransportError> for DriverError {
    fn from(e: virtdriver_transport::TransportError) -> Self {
        tracing::debug!(error = %e, "transport dial failure");
        match e {
            virtdriver_transport::TransportError::Tls(tls) => DriverError::from(tls),
            other => DriverError::SystemError(other.to_string()),
        }
    }
}

impl From<virtdriver_wire::WireError> for DriverError {
    fn from(e: virtdriver_wire::WireError) -> Self {
        tracing::debug!(error = %e, "wire encode/decode failure");
        DriverError::Rpc(e.to_string())
    }
}

impl From<virtdriver_rpc::RpcError> for DriverError {
    fn from(e: virtdriver_rpc::RpcError) -> Self {
        tracing::debug!(error = %e, "rpc failure");
        match e {
            virtdriver_rpc::RpcError::Server(structured) => DriverError::Server(Box::new(structured)),
            virtdriver_rpc::RpcError::Io(io_err) => DriverError::SystemError(io_err.to_string()),
            other => DriverError::Rpc(other.to_string()),
        }
    }
}

/// True for faults that leave the wire in an unknown state: the connection
/// must be closed rather than reused. A server-side structured error does
/// not corrupt the stream, so it is excluded.
pub(crate) fn is_framing_fault(e: &virtdriver_rpc::RpcError) -> bool {
    !matches!(e, virtdriver_rpc::RpcError::Server(_))
}
