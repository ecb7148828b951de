//! Certificate requester

use super::certificate::{CertificateRequest, CertificateResponse};
use super::headers::AuthHeaders;
use crate::error::{Error, Result};
use crate::transport::{endpoint, Transport, TransportRequest};
use certload_crypto::KeyMaterial;
use std::sync::Arc;
use tracing::debug;

/// Longest body excerpt carried in an error.
const MAX_ERROR_BODY: usize = 256;

/// Registers public keys with the certificate service.
#[derive(Clone)]
pub struct CertificateRequester {
    transport: Arc<dyn Transport>,
    url: String,
}

impl CertificateRequester {
    /// Create a requester for the given certificate service base URL.
    pub fn new(transport: Arc<dyn Transport>, cert_service: &str) -> Self {
        Self {
            transport,
            url: endpoint(cert_service, "/cert/sign"),
        }
    }

    /// Request a certificate for the keypair's public key.
    ///
    /// The certificate service only registers the key, so the signature
    /// header carries the unsigned sentinel.
    pub async fn request(&self, key: &KeyMaterial) -> Result<CertificateResponse> {
        let body = CertificateRequest::for_key(key).to_body()?;

        let response = self
            .transport
            .post(TransportRequest {
                url: self.url.clone(),
                headers: AuthHeaders::unsigned().to_pairs(),
                body,
            })
            .await?;

        if !response.is_success() {
            let mut text = response.text();
            if text.len() > MAX_ERROR_BODY {
                let mut cut = MAX_ERROR_BODY;
                while !text.is_char_boundary(cut) {
                    cut -= 1;
                }
                text.truncate(cut);
            }
            return Err(Error::Protocol(format!(
                "certificate service returned {}: {}",
                response.status, text
            )));
        }

        let certificate = CertificateResponse::parse(response.body)?;
        debug!(fingerprint = %key.fingerprint(), "Certificate issued");
        Ok(certificate)
    }
}
