//! Handshake state machine and client

use super::headers::AuthHeaders;
use super::requester::CertificateRequester;
use super::signer::sign_certificate;
use super::submitter::{LoginOutcome, LoginSubmitter};
use super::Endpoints;
use crate::error::Error;
use crate::transport::Transport;
use certload_crypto::KeyMaterial;
use std::sync::Arc;
use tracing::trace;

/// Progress of one iteration.
///
/// `Failed` is absorbing and reachable from every other state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum HandshakeState {
    /// Nothing done yet
    Init,
    /// Keypair generated
    KeyGenerated,
    /// Certificate issued
    CertRequested,
    /// Certificate signed
    Signed,
    /// Login response received
    LoggedIn,
    /// Response checked against the expected status
    Checked,
    /// Iteration complete
    Done,
    /// Iteration aborted
    Failed,
}

impl HandshakeState {
    /// The state that follows on success.
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Init => Some(Self::KeyGenerated),
            Self::KeyGenerated => Some(Self::CertRequested),
            Self::CertRequested => Some(Self::Signed),
            Self::Signed => Some(Self::LoggedIn),
            Self::LoggedIn => Some(Self::Checked),
            Self::Checked => Some(Self::Done),
            Self::Done | Self::Failed => None,
        }
    }

    /// Whether no further transition is possible.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }
}

impl std::fmt::Display for HandshakeState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Init => "init",
            Self::KeyGenerated => "key_generated",
            Self::CertRequested => "cert_requested",
            Self::Signed => "signed",
            Self::LoggedIn => "logged_in",
            Self::Checked => "checked",
            Self::Done => "done",
            Self::Failed => "failed",
        };
        write!(f, "{}", name)
    }
}

/// An iteration that entered `Failed`.
#[derive(Debug)]
pub struct HandshakeFailure {
    /// The transition that was being attempted
    pub at: HandshakeState,
    /// What went wrong
    pub error: Error,
}

impl std::fmt::Display for HandshakeFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "failed entering {}: {}", self.at, self.error)
    }
}

impl std::error::Error for HandshakeFailure {}

/// State tracker for one iteration.
#[derive(Debug)]
pub struct Handshake {
    state: HandshakeState,
}

impl Default for Handshake {
    fn default() -> Self {
        Self::new()
    }
}

impl Handshake {
    /// Start in `Init`.
    pub fn new() -> Self {
        Self {
            state: HandshakeState::Init,
        }
    }

    /// Current state.
    pub fn state(&self) -> HandshakeState {
        self.state
    }

    /// Move forward to `to`.
    ///
    /// States only move forward; paths that skip steps (the certificate-less
    /// login) jump directly.
    pub fn advance(&mut self, to: HandshakeState) {
        debug_assert!(to > self.state && to != HandshakeState::Failed);
        trace!(from = %self.state, %to, "Handshake transition");
        self.state = to;
    }

    /// Enter `Failed` while attempting the next transition.
    pub fn fail(&mut self, error: Error) -> HandshakeFailure {
        self.fail_at(self.state.next().unwrap_or(self.state), error)
    }

    /// Enter `Failed` while attempting the transition into `at`.
    pub fn fail_at(&mut self, at: HandshakeState, error: Error) -> HandshakeFailure {
        trace!(from = %self.state, %at, %error, "Handshake failed");
        self.state = HandshakeState::Failed;
        HandshakeFailure { at, error }
    }

    /// Check a status code, moving to `Checked` on a match.
    pub fn check(&mut self, expected: u16, actual: u16) -> Result<(), HandshakeFailure> {
        if expected == actual {
            self.advance(HandshakeState::Checked);
            Ok(())
        } else {
            Err(self.fail_at(
                HandshakeState::Checked,
                Error::Assertion { expected, actual },
            ))
        }
    }
}

/// Runs full handshakes against a certificate service and gateway.
#[derive(Clone)]
pub struct HandshakeClient {
    requester: CertificateRequester,
    submitter: LoginSubmitter,
}

impl HandshakeClient {
    /// Create a client sharing one transport for both collaborators.
    pub fn new(transport: Arc<dyn Transport>, endpoints: &Endpoints) -> Self {
        Self {
            requester: CertificateRequester::new(transport.clone(), &endpoints.cert_service),
            submitter: LoginSubmitter::new(transport, &endpoints.gateway),
        }
    }

    /// The login submitter, for certificate-less submissions.
    pub fn submitter(&self) -> &LoginSubmitter {
        &self.submitter
    }

    /// Run a handshake with a freshly generated keypair.
    pub async fn login(&self, handshake: &mut Handshake) -> Result<LoginOutcome, HandshakeFailure> {
        let key = KeyMaterial::generate().map_err(|e| handshake.fail(e.into()))?;
        self.login_with_key(key, handshake).await
    }

    /// Run a handshake with the given keypair, consuming it.
    pub async fn login_with_key(
        &self,
        key: KeyMaterial,
        handshake: &mut Handshake,
    ) -> Result<LoginOutcome, HandshakeFailure> {
        handshake.advance(HandshakeState::KeyGenerated);

        let certificate = self
            .requester
            .request(&key)
            .await
            .map_err(|e| handshake.fail(e))?;
        handshake.advance(HandshakeState::CertRequested);

        let signature = sign_certificate(&certificate, &key);
        drop(key);
        handshake.advance(HandshakeState::Signed);

        let outcome = self
            .submitter
            .submit(&certificate, &AuthHeaders::signed(signature))
            .await
            .map_err(|e| handshake.fail(e))?;
        handshake.advance(HandshakeState::LoggedIn);

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests;
