//! Process-wide TLS credential state, handshake, and peer verification.
//!
//! Credential loading is gated by a lazy, idempotent, thread-safe one-shot
//! initialiser so the cost (and the chance of a misconfigured path) is paid
//! at most once per process, and only on the first TLS connect attempt.

mod credentials;
mod handshake;
mod paths;
mod verify;

pub use credentials::{credentials, TlsCredentials};
pub use handshake::{connect, read_server_ack};
pub use paths::TlsPaths;
pub use verify::{translate_verification_error, SoftVerifier};

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TlsError {
    #[error("failed to load TLS credential {path}: {source}")]
    CredentialLoad {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("TLS configuration error: {0}")]
    Rustls(String),

    #[error("invalid hostname for TLS handshake: {0}")]
    InvalidHostname(String),

    #[error("TLS handshake failed: {0}")]
    Handshake(#[source] std::io::Error),

    /// The peer's certificate was rejected by [`crate::verify::SoftVerifier`]
    /// (and `no_verify` was not set). Distinct from [`TlsError::Handshake`]:
    /// this is a protocol-level rejection, not a library/transport failure,
    /// so it is classified as `Rpc` rather than `TlsError` at the driver
    /// boundary, matching the upstream driver's own `VIR_ERR_RPC` tagging of
    /// certificate and ack failures.
    #[error("{0}")]
    Verification(String),

    #[error("{0}")]
    ServerAck(String),
}
