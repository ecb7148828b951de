//! Login submitter

use super::certificate::CertificateResponse;
use super::headers::{AuthHeaders, CONTENT_TYPE_JSON};
use super::session::Session;
use crate::error::{Error, Result};
use crate::transport::{endpoint, Transport, TransportRequest, TransportResponse};
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

/// Terminal result of one login submission.
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    /// HTTP status code
    pub status: u16,
    /// Response body
    pub body: Vec<u8>,
    /// Session cookies, present only on a successful login
    pub session: Option<Session>,
}

impl LoginOutcome {
    fn from_response(response: TransportResponse) -> Self {
        let session = if response.is_success() {
            Session::from_set_cookie(response.header_values("set-cookie"))
        } else {
            None
        };
        Self {
            status: response.status,
            body: response.body,
            session,
        }
    }

    /// Body parsed as JSON, if it is JSON.
    pub fn json(&self) -> Option<Value> {
        serde_json::from_slice(&self.body).ok()
    }

    /// Wallet identity reported by the gateway.
    pub fn wallet(&self) -> Option<String> {
        self.json()?
            .get("wallet")
            .and_then(Value::as_str)
            .map(str::to_string)
    }
}

/// Submits certificates and signatures to the auth gateway.
#[derive(Clone)]
pub struct LoginSubmitter {
    transport: Arc<dyn Transport>,
    url: String,
}

impl LoginSubmitter {
    /// Create a submitter for the given gateway base URL.
    pub fn new(transport: Arc<dyn Transport>, gateway: &str) -> Self {
        Self {
            transport,
            url: endpoint(gateway, "/auth/login"),
        }
    }

    /// Submit the certificate response with its signature.
    ///
    /// The body is the certificate service response exactly as received. No
    /// retries; any status is returned to the caller for checking.
    pub async fn submit(
        &self,
        certificate: &CertificateResponse,
        headers: &AuthHeaders,
    ) -> Result<LoginOutcome> {
        if !headers.signature().is_signed() {
            return Err(Error::Protocol(
                "login requires a signed certificate".to_string(),
            ));
        }

        let response = self
            .transport
            .post(TransportRequest {
                url: self.url.clone(),
                headers: headers.to_pairs(),
                body: certificate.raw_body().to_vec(),
            })
            .await?;

        debug!(status = response.status, "Login submitted");
        Ok(LoginOutcome::from_response(response))
    }

    /// Submit an arbitrary body with only a content type and no signature.
    pub async fn submit_raw(&self, body: Vec<u8>) -> Result<LoginOutcome> {
        let response = self
            .transport
            .post(TransportRequest {
                url: self.url.clone(),
                headers: vec![("content-type".to_string(), CONTENT_TYPE_JSON.to_string())],
                body,
            })
            .await?;

        debug!(status = response.status, "Unsigned login submitted");
        Ok(LoginOutcome::from_response(response))
    }
}
