//! Fixed filesystem locations for the process-wide TLS credential set.

use std::path::PathBuf;

/// Overridable only for tests; production callers use [`TlsPaths::default`].
#[derive(Debug, Clone)]
pub struct TlsPaths {
    pub ca_bundle: PathBuf,
    pub client_cert: PathBuf,
    pub client_key: PathBuf,
}

impl Default for TlsPaths {
    fn default() -> Self {
        TlsPaths {
            ca_bundle: PathBuf::from("/etc/pki/CA/cacert.pem"),
            client_cert: PathBuf::from("/etc/pki/virt-client/clientcert.pem"),
            client_key: PathBuf::from("/etc/pki/virt-client/private/clientkey.pem"),
        }
    }
}
