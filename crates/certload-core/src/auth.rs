//! Certificate login handshake
//!
//! One handshake per simulated user:
//! 1. Generate a fresh Ed25519 keypair
//! 2. Register the public key with the certificate service (`/cert/sign`)
//! 3. Sign the issued certificate with the private key
//! 4. Submit certificate and detached signature to the gateway (`/auth/login`)
//!
//! The keypair is moved into the handshake and dropped once the signature
//! exists, so it can never be reused by another iteration.

#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};

mod certificate;
mod handshake;
mod headers;
mod requester;
mod session;
mod signer;
mod submitter;

pub use certificate::{CertificateRequest, CertificateResponse};
pub use handshake::{Handshake, HandshakeClient, HandshakeFailure, HandshakeState};
pub use headers::{AuthHeaders, SignatureHeader, CONTENT_TYPE_JSON, UNSIGNED_SENTINEL};
pub use requester::CertificateRequester;
pub use session::Session;
pub use signer::sign_certificate;
pub use submitter::{LoginOutcome, LoginSubmitter};

/// Base URLs of the two collaborators.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Endpoints {
    /// Certificate service, e.g. `http://localhost:7999`
    #[serde(default = "default_cert_service")]
    pub cert_service: String,
    /// Auth gateway, e.g. `http://localhost:8080`
    #[serde(default = "default_gateway")]
    pub gateway: String,
}

fn default_cert_service() -> String {
    "http://localhost:7999".to_string()
}

fn default_gateway() -> String {
    "http://localhost:8080".to_string()
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            cert_service: default_cert_service(),
            gateway: default_gateway(),
        }
    }
}

impl Endpoints {
    /// Check that both URLs look like HTTP(S) base URLs.
    pub fn validate(&self) -> crate::Result<()> {
        for (field, url) in [
            ("endpoints.cert_service", &self.cert_service),
            ("endpoints.gateway", &self.gateway),
        ] {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(crate::Error::config(
                    field,
                    format!("'{}' is not an http(s) URL", url),
                ));
            }
        }
        Ok(())
    }
}
