//! Integration tests for Certload
//!
//! These tests run the real reqwest transport against an axum stub of the
//! certificate service and the auth gateway:
//! - certload-crypto: key generation, detached signatures, verification
//! - certload-core: handshake client, login submitter, scenario driver

use axum::{
    body::Bytes,
    extract::State,
    http::{header::SET_COOKIE, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use certload_core::{
    Endpoints, Handshake, HandshakeClient, HttpConfig, HttpTransport, ScenarioConfig,
    ScenarioDriver, ScenarioKind, Transport,
};
use certload_crypto::{decode_public_key, fingerprint, verify_detached, DetachedSignature};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

// ============================================================================
// Stub services
// ============================================================================

#[derive(Default)]
struct Stub {
    issued: Mutex<HashMap<String, [u8; 32]>>,
    serial: AtomicU64,
}

type Shared = Arc<Stub>;

async fn cert_sign(State(stub): State<Shared>, headers: HeaderMap, body: Bytes) -> Response {
    if headers.get("signature").is_none() {
        return (StatusCode::BAD_REQUEST, "signature missing").into_response();
    }
    let key = serde_json::from_slice::<Value>(&body)
        .ok()
        .and_then(|v| v.get("pub").and_then(Value::as_str).map(str::to_string))
        .and_then(|encoded| decode_public_key(&encoded).ok());
    let Some(key) = key else {
        return (StatusCode::BAD_REQUEST, "pub missing").into_response();
    };

    let serial = stub.serial.fetch_add(1, Ordering::SeqCst);
    let cert = format!("-----BEGIN CERTIFICATE-----\nstub-{serial}\n-----END CERTIFICATE-----\n");
    stub.issued.lock().unwrap().insert(cert.clone(), key);
    Json(json!({ "cert": cert, "serial": serial })).into_response()
}

async fn auth_login(State(stub): State<Shared>, headers: HeaderMap, body: Bytes) -> Response {
    let cert = serde_json::from_slice::<Value>(&body)
        .ok()
        .and_then(|v| v.get("cert").and_then(Value::as_str).map(str::to_string));
    let Some(cert) = cert else {
        return (StatusCode::BAD_REQUEST, Json(json!({ "message": "cert missing" })))
            .into_response();
    };
    let signature = headers
        .get("signature")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| DetachedSignature::from_base64(v).ok());
    let Some(signature) = signature else {
        return (StatusCode::BAD_REQUEST, "signature missing").into_response();
    };
    let Some(key) = stub.issued.lock().unwrap().get(&cert).copied() else {
        return (StatusCode::UNAUTHORIZED, "unknown certificate").into_response();
    };
    if verify_detached(&key, cert.as_bytes(), &signature.to_bytes()).is_err() {
        return (StatusCode::BAD_REQUEST, "verification failed").into_response();
    }

    (
        [(SET_COOKIE, "session=stub; Path=/; HttpOnly")],
        Json(json!({ "wallet": fingerprint(&key) })),
    )
        .into_response()
}

async fn spawn_stub() -> Endpoints {
    let app = Router::new()
        .route("/cert/sign", post(cert_sign))
        .route("/auth/login", post(auth_login))
        .with_state(Shared::default());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.ok();
    });

    let base = format!("http://{addr}");
    Endpoints {
        cert_service: base.clone(),
        gateway: base,
    }
}

fn http() -> Arc<dyn Transport> {
    Arc::new(HttpTransport::new(&HttpConfig::default()).unwrap())
}

// ============================================================================
// Handshake over HTTP
// ============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_handshake_over_http() {
    let endpoints = spawn_stub().await;
    let client = HandshakeClient::new(http(), &endpoints);

    let mut handshake = Handshake::new();
    let outcome = client.login(&mut handshake).await.unwrap();

    assert_eq!(outcome.status, 200);
    assert_eq!(outcome.wallet().map(|w| w.len()), Some(16));
    let session = outcome.session.expect("session cookie");
    assert_eq!(session.get("session"), Some("stub"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_empty_login_rejected_over_http() {
    let endpoints = spawn_stub().await;
    let client = HandshakeClient::new(http(), &endpoints);

    let outcome = client.submitter().submit_raw(b"{}".to_vec()).await.unwrap();

    assert_eq!(outcome.status, 400);
    assert!(outcome.session.is_none());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_unreachable_gateway_is_network_error() {
    let endpoints = Endpoints {
        cert_service: "http://127.0.0.1:1".to_string(),
        gateway: "http://127.0.0.1:1".to_string(),
    };
    let client = HandshakeClient::new(http(), &endpoints);

    let mut handshake = Handshake::new();
    let failure = client.login(&mut handshake).await.unwrap_err();

    assert_eq!(failure.error.kind(), certload_core::ErrorKind::Network);
}

// ============================================================================
// Scenario driver over HTTP
// ============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_short_login_run_over_http() {
    let endpoints = spawn_stub().await;
    let config = ScenarioConfig::new("stub", ScenarioKind::Login)
        .with_rate(20)
        .with_duration_secs(1)
        .with_vus(10);

    let driver = ScenarioDriver::new(config, http(), &endpoints).unwrap();
    let report = driver.run().await;

    assert!(report.started >= 15, "started {}", report.started);
    assert_eq!(report.passed, report.started);
    assert!(report.errors.is_empty(), "{:?}", report.errors);
    assert!(report.meets(&driver.config().thresholds));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_short_negative_run_over_http() {
    let endpoints = spawn_stub().await;
    let config = ScenarioConfig::new("failed", ScenarioKind::LoginWithoutCert)
        .with_rate(20)
        .with_duration_secs(1)
        .with_vus(5);

    let driver = ScenarioDriver::new(config, http(), &endpoints).unwrap();
    let report = driver.run().await;

    assert!(report.started > 0);
    assert_eq!(report.failed, 0);
    assert_eq!(report.errored, 0);
}
