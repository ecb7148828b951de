//! Certload Core - Handshake and Scenario Engine
//!
//! This crate provides the certificate login handshake and the load driver
//! that exercises it, including:
//! - Auth: key registration, certificate signing and login submission
//! - Transport: the request/response seam, over reqwest or an in-process mock
//! - Api: business endpoints reached with a logged-in session
//! - Scenario: constant-arrival-rate scheduling, checks and reports

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod api;
pub mod auth;
pub mod error;
pub mod scenario;
pub mod transport;

pub use api::{TopicClient, TopicPayload};
pub use auth::{
    sign_certificate, AuthHeaders, CertificateRequest, CertificateRequester, CertificateResponse,
    Endpoints, Handshake, HandshakeClient, HandshakeFailure, HandshakeState, LoginOutcome,
    LoginSubmitter, Session, SignatureHeader,
};
pub use error::{format_error_for_cli, Error, ErrorKind, Result, UserFriendlyError};
pub use scenario::{
    IterationContext, IterationOutcome, LatencySummary, Recorder, ScenarioConfig, ScenarioDriver,
    ScenarioKind, ScenarioReport, ThresholdResult, Thresholds,
};
pub use transport::{
    HttpConfig, HttpTransport, MockBehavior, MockTransport, Transport, TransportRequest,
    TransportResponse,
};
