//! Handshake signer

use super::certificate::CertificateResponse;
use certload_crypto::{DetachedSignature, KeyMaterial};

/// Sign the issued certificate, proving possession of the private key.
///
/// Covers exactly the `cert` bytes the certificate service returned.
pub fn sign_certificate(certificate: &CertificateResponse, key: &KeyMaterial) -> DetachedSignature {
    key.sign_detached(certificate.signing_bytes())
}
