//! Peer certificate verification with a soft bypass (`no_verify`).
//!
//! Wraps rustls's own WebPKI chain/hostname verifier and translates a
//! failure into one of the fixed diagnostic messages the upstream driver
//! produces from GnuTLS status flags. When `no_verify` is set the failure is
//! logged rather than propagated, matching the "log and continue" contract.

use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::client::WebPkiServerVerifier;
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{CertificateError, DigitallySignedStruct, Error as RustlsError, RootCertStore, SignatureScheme};
use std::sync::Arc;

#[derive(Debug)]
pub struct SoftVerifier {
    inner: Arc<WebPkiServerVerifier>,
    no_verify: bool,
}

impl SoftVerifier {
    pub fn new(roots: Arc<RootCertStore>, no_verify: bool) -> Result<Self, crate::TlsError> {
        let inner = WebPkiServerVerifier::builder(roots)
            .build()
            .map_err(|e| crate::TlsError::Rustls(e.to_string()))?;
        Ok(SoftVerifier { inner, no_verify })
    }
}

/// Translate a chain/hostname verification failure into the fixed diagnostic
/// vocabulary: "not trusted", "hasn't got a known issuer", "has been
/// revoked", "insecure algorithm", or the generic fallback.
pub fn translate_verification_error(err: &RustlsError) -> &'static str {
    match err {
        RustlsError::InvalidCertificate(cert_err) => match cert_err {
            CertificateError::UnknownIssuer => "hasn't got a known issuer",
            CertificateError::Revoked => "has been revoked",
            CertificateError::BadSignature
            | CertificateError::UnsupportedSignatureAlgorithm
            | CertificateError::UnsupportedSignatureAlgorithmContext { .. }
            | CertificateError::UnsupportedSignatureAlgorithmForPublicKeyContext { .. } => {
                "insecure algorithm"
            }
            CertificateError::Expired | CertificateError::NotValidYet => "not trusted",
            _ => "invalid certificate",
        },
        _ => "invalid certificate",
    }
}

impl ServerCertVerifier for SoftVerifier {
    fn verify_server_cert(
        &self,
        end_entity: &CertificateDer<'_>,
        intermediates: &[CertificateDer<'_>],
        server_name: &ServerName<'_>,
        ocsp_response: &[u8],
        now: UnixTime,
    ) -> Result<ServerCertVerified, RustlsError> {
        match self
            .inner
            .verify_server_cert(end_entity, intermediates, server_name, ocsp_response, now)
        {
            Ok(verified) => Ok(verified),
            Err(e) => {
                let message = translate_verification_error(&e);
                if self.no_verify {
                    tracing::warn!(
                        reason = message,
                        "TLS peer verification failed; continuing because no_verify was set"
                    );
                    Ok(ServerCertVerified::assertion())
                } else {
                    tracing::debug!(reason = message, "TLS peer verification failed");
                    Err(e)
                }
            }
        }
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, RustlsError> {
        self.inner.verify_tls12_signature(message, cert, dss)
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, RustlsError> {
        self.inner.verify_tls13_signature(message, cert, dss)
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.inner.supported_verify_schemes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_known_issuer_failure() {
        let err = RustlsError::InvalidCertificate(CertificateError::UnknownIssuer);
        assert_eq!(translate_verification_error(&err), "hasn't got a known issuer");
    }

    #[test]
    fn maps_revoked_failure() {
        let err = RustlsError::InvalidCertificate(CertificateError::Revoked);
        assert_eq!(translate_verification_error(&err), "has been revoked");
    }

    #[test]
    fn falls_back_to_generic_message() {
        let err = RustlsError::General("boom".into());
        assert_eq!(translate_verification_error(&err), "invalid certificate");
    }
}
