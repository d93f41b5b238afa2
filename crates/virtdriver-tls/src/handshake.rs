//! Client handshake plus the one-byte application-level server acknowledgement.

use crate::credentials::credentials;
use crate::paths::TlsPaths;
use crate::verify::SoftVerifier;
use crate::TlsError;
use rustls::pki_types::ServerName;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite};
use tokio_rustls::client::TlsStream;
use tokio_rustls::TlsConnector;

/// Perform the TLS handshake over an already-connected byte stream.
///
/// Certificate type is always X.509 here: rustls has no OpenPGP certificate
/// support, so the upstream driver's X.509-then-OpenPGP priority collapses
/// to X.509-only in this implementation.
pub async fn connect<S>(
    stream: S,
    hostname: &str,
    paths: &TlsPaths,
    no_verify: bool,
) -> Result<TlsStream<S>, TlsError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let creds = credentials(paths)?;
    let verifier = Arc::new(SoftVerifier::new(creds.root_store.clone(), no_verify)?);

    let config = rustls::ClientConfig::builder()
        .dangerous()
        .with_custom_certificate_verifier(verifier)
        .with_client_auth_cert(creds.client_cert_chain.clone(), creds.client_key.clone_key())
        .map_err(|e| TlsError::Rustls(e.to_string()))?;

    let connector = TlsConnector::from(Arc::new(config));
    let server_name = ServerName::try_from(hostname.to_string())
        .map_err(|_| TlsError::InvalidHostname(hostname.to_string()))?;

    connector
        .connect(server_name, stream)
        .await
        .map_err(classify_connect_error)
}

/// `tokio_rustls::TlsConnector::connect` folds every failure — a TCP reset
/// mid-handshake, a protocol version mismatch, `SoftVerifier` rejecting the
/// peer's certificate — into one `std::io::Error`. Pull the `rustls::Error`
/// back out (tokio-rustls wraps it via `io::Error::new(_, rustls_error)`) to
/// tell "our verifier said no" apart from genuine handshake mechanics.
fn classify_connect_error(e: std::io::Error) -> TlsError {
    let is_verification_failure = e
        .get_ref()
        .and_then(|inner| inner.downcast_ref::<rustls::Error>())
        .is_some_and(|rustls_err| matches!(rustls_err, rustls::Error::InvalidCertificate(_)));

    if is_verification_failure {
        TlsError::Verification(format!("server certificate verification failed: {e}"))
    } else {
        TlsError::Handshake(e)
    }
}

/// Read the single `0x01` byte the server sends once it has accepted our
/// certificate. Retries on `Interrupted`; any other error, including a
/// zero-length read, is fatal.
pub async fn read_server_ack<S>(stream: &mut TlsStream<S>) -> Result<(), TlsError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut byte = [0u8; 1];
    loop {
        match stream.read_exact(&mut byte).await {
            Ok(_) => break,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => {
                return Err(TlsError::ServerAck(format!(
                    "server verification (of our certificate or IP address) failed: {e}"
                )))
            }
        }
    }

    if byte[0] != 0x01 {
        return Err(TlsError::ServerAck(format!(
            "server verification (of our certificate or IP address) failed: unexpected byte {:#x}",
            byte[0]
        )));
    }

    Ok(())
}
