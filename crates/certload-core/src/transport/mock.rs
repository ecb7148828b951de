//! In-process certificate service and gateway for testing
//!
//! Issues PEM-looking certificates that embed the registered public key,
//! verifies login signatures with real Ed25519 checks and hands out session
//! cookies, so the whole handshake can be exercised without a network.

use super::{Transport, TransportRequest, TransportResponse};
use crate::error::{Error, Result};
use async_trait::async_trait;
use certload_crypto::{decode_public_key, fingerprint, verify_detached, DetachedSignature};
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Knobs for misbehaving collaborators.
#[derive(Debug, Clone, Default)]
pub struct MockBehavior {
    /// Delay applied to every request
    pub latency: Duration,
    /// Leave the `cert` field out of certificate responses
    pub omit_cert: bool,
    /// Return this status from `/cert/sign` instead of 200
    pub cert_status: Option<u16>,
    /// Fail every request with a network error
    pub unreachable: bool,
}

/// A mock transport simulating the certificate service and the gateway.
///
/// Issued certificates and sessions are kept for the lifetime of the mock so
/// a certificate can be replayed; memory grows with every handshake. Use one
/// mock per test or per short run.
#[derive(Default)]
pub struct MockTransport {
    behavior: MockBehavior,
    issued: Mutex<HashMap<String, [u8; 32]>>,
    sessions: Mutex<HashSet<String>>,
    paths: Mutex<Vec<String>>,
    serial: AtomicU64,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

impl MockTransport {
    /// Create a well-behaved mock.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock with the given behavior.
    #[must_use]
    pub fn with_behavior(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            ..Self::default()
        }
    }

    /// Paths of every request received, in arrival order.
    pub fn paths(&self) -> Vec<String> {
        self.paths.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Number of requests received for a path.
    pub fn count(&self, path: &str) -> usize {
        self.paths
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .filter(|p| p.as_str() == path)
            .count()
    }

    /// Highest number of requests observed in flight at once.
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    fn sign_cert(&self, request: &TransportRequest) -> TransportResponse {
        if let Some(status) = self.behavior.cert_status {
            return respond(status, json!({ "code": "C1001", "message": "unavailable" }));
        }
        if request.header("signature").is_none() {
            return respond(400, json!({ "code": "S1002", "message": "signature missing" }));
        }

        let public_key = serde_json::from_slice::<Value>(&request.body)
            .ok()
            .and_then(|v| v.get("pub").and_then(Value::as_str).map(str::to_string))
            .and_then(|encoded| decode_public_key(&encoded).ok().map(|k| (encoded, k)));
        let Some((encoded, key)) = public_key else {
            return respond(400, json!({ "code": "C1002", "message": "bad public key" }));
        };

        let serial = self.serial.fetch_add(1, Ordering::SeqCst);
        let cert = format!(
            "-----BEGIN CERTIFICATE-----\n{}\nserial:{}\n-----END CERTIFICATE-----\n",
            encoded, serial
        );
        self.issued
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(cert.clone(), key);

        if self.behavior.omit_cert {
            respond(200, json!({ "serial": serial }))
        } else {
            respond(200, json!({ "cert": cert, "serial": serial }))
        }
    }

    fn login(&self, request: &TransportRequest) -> TransportResponse {
        let cert = serde_json::from_slice::<Value>(&request.body)
            .ok()
            .and_then(|v| v.get("cert").and_then(Value::as_str).map(str::to_string));
        let Some(cert) = cert else {
            return respond(400, json!({ "code": "C1003", "message": "cert missing" }));
        };
        let Some(signature) = request.header("signature") else {
            return respond(400, json!({ "code": "S1002", "message": "signature missing" }));
        };
        let Ok(signature) = DetachedSignature::from_base64(signature) else {
            return respond(400, json!({ "code": "S1001", "message": "signature decode" }));
        };

        let key = self
            .issued
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(&cert)
            .copied();
        let Some(key) = key else {
            return respond(401, json!({ "code": "A0240", "message": "unknown certificate" }));
        };

        if verify_detached(&key, cert.as_bytes(), &signature.to_bytes()).is_err() {
            return respond(400, json!({ "code": "S1002", "message": "verification failed" }));
        }

        let session = format!("s{}", self.serial.fetch_add(1, Ordering::SeqCst));
        self.sessions
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(session.clone());

        let mut response = respond(200, json!({ "wallet": fingerprint(&key) }));
        response.headers.push((
            "set-cookie".to_string(),
            format!("session={session}; Path=/; Max-Age=3600; HttpOnly"),
        ));
        response
    }

    fn create_topic(&self, request: &TransportRequest) -> TransportResponse {
        let authorized = request
            .header("cookie")
            .and_then(|c| {
                c.split(';')
                    .filter_map(|pair| pair.trim().strip_prefix("session="))
                    .next()
            })
            .map(|id| {
                self.sessions
                    .lock()
                    .unwrap_or_else(|e| e.into_inner())
                    .contains(id)
            })
            .unwrap_or(false);
        if !authorized {
            return respond(401, json!({ "code": "A0240", "message": "no session" }));
        }

        let title = serde_json::from_slice::<Value>(&request.body)
            .ok()
            .and_then(|v| v.get("title").and_then(Value::as_str).map(str::to_string));
        match title {
            Some(_) => respond(200, json!({ "hash": self.serial.fetch_add(1, Ordering::SeqCst) })),
            None => respond(400, json!({ "code": "T1001", "message": "bad topic" })),
        }
    }
}

fn respond(status: u16, body: Value) -> TransportResponse {
    TransportResponse {
        status,
        headers: vec![("content-type".to_string(), "application/json".to_string())],
        body: body.to_string().into_bytes(),
    }
}

fn path_of(url: &str) -> &str {
    let rest = url.split_once("://").map(|(_, r)| r).unwrap_or(url);
    rest.find('/').map(|i| &rest[i..]).unwrap_or("/")
}

/// Tracks in-flight requests for the lifetime of one call.
struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn post(&self, request: TransportRequest) -> Result<TransportResponse> {
        let path = path_of(&request.url).to_string();
        self.paths
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(path.clone());

        if self.behavior.unreachable {
            return Err(Error::Network(format!("{}: connection refused", request.url)));
        }

        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        let _guard = InFlight(&self.in_flight);
        self.peak_in_flight.fetch_max(current, Ordering::SeqCst);

        if !self.behavior.latency.is_zero() {
            tokio::time::sleep(self.behavior.latency).await;
        }

        let response = match path.as_str() {
            "/cert/sign" => self.sign_cert(&request),
            "/auth/login" => self.login(&request),
            "/api/topic/create" => self.create_topic(&request),
            _ => respond(404, json!({ "message": "not found" })),
        };
        Ok(response)
    }
}
