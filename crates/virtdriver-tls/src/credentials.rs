//! Process-wide, idempotent credential init.
//!
//! A failed load does not poison the process: [`once_cell::sync::OnceCell`]
//! only remembers success, so the next TLS connect attempt retries the load
//! from scratch. This is the exact property the upstream driver's one-shot
//! `initialise_gnutls` gate relies on.

use crate::paths::TlsPaths;
use crate::TlsError;
use once_cell::sync::OnceCell;
use rustls::pki_types::{CertificateDer, PrivateKeyDer};
use rustls::RootCertStore;
use std::fs::File;
use std::io::BufReader;
use std::sync::Arc;

static CRYPTO_PROVIDER_INIT: std::sync::Once = std::sync::Once::new();
static CREDENTIALS: OnceCell<Arc<TlsCredentials>> = OnceCell::new();

/// The loaded CA bundle plus client certificate chain and key.
pub struct TlsCredentials {
    pub root_store: Arc<RootCertStore>,
    pub client_cert_chain: Vec<CertificateDer<'static>>,
    pub client_key: PrivateKeyDer<'static>,
}

fn ensure_crypto_provider() {
    CRYPTO_PROVIDER_INIT.call_once(|| {
        let _ = rustls::crypto::ring::default_provider().install_default();
    });
}

fn load_certs(path: &std::path::Path) -> Result<Vec<CertificateDer<'static>>, TlsError> {
    let file = File::open(path).map_err(|e| TlsError::CredentialLoad {
        path: path.to_path_buf(),
        source: e,
    })?;
    let mut reader = BufReader::new(file);
    rustls_pemfile::certs(&mut reader)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| TlsError::CredentialLoad {
            path: path.to_path_buf(),
            source: e,
        })
}

fn load_key(path: &std::path::Path) -> Result<PrivateKeyDer<'static>, TlsError> {
    let file = File::open(path).map_err(|e| TlsError::CredentialLoad {
        path: path.to_path_buf(),
        source: e,
    })?;
    let mut reader = BufReader::new(file);
    rustls_pemfile::private_key(&mut reader)
        .map_err(|e| TlsError::CredentialLoad {
            path: path.to_path_buf(),
            source: e,
        })?
        .ok_or_else(|| TlsError::CredentialLoad {
            path: path.to_path_buf(),
            source: std::io::Error::new(std::io::ErrorKind::InvalidData, "no private key found"),
        })
}

fn load(paths: &TlsPaths) -> Result<Arc<TlsCredentials>, TlsError> {
    ensure_crypto_provider();

    let mut root_store = RootCertStore::empty();
    for cert in load_certs(&paths.ca_bundle)? {
        root_store
            .add(cert)
            .map_err(|e| TlsError::Rustls(e.to_string()))?;
    }

    let client_cert_chain = load_certs(&paths.client_cert)?;
    let client_key = load_key(&paths.client_key)?;

    Ok(Arc::new(TlsCredentials {
        root_store: Arc::new(root_store),
        client_cert_chain,
        client_key,
    }))
}

/// Fetch the process-wide credential set, loading it on first use.
pub fn credentials(paths: &TlsPaths) -> Result<Arc<TlsCredentials>, TlsError> {
    CREDENTIALS.get_or_try_init(|| load(paths)).cloned()
}
