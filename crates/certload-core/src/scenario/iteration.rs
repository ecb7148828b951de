//! One scenario iteration

use super::config::ScenarioKind;
use crate::api::{TopicClient, TopicPayload};
use crate::auth::{Endpoints, Handshake, HandshakeClient, HandshakeFailure, HandshakeState};
use crate::transport::Transport;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

/// Empty JSON object sent by the certificate-less login.
const EMPTY_PAYLOAD: &[u8] = b"{}";

/// Result of one iteration.
#[derive(Debug)]
pub struct IterationOutcome {
    /// Iteration sequence number within the run
    pub id: u64,
    /// Handshake duration, up to the checked login response. Business
    /// calls after login are not included; a failed iteration records the
    /// time until it failed.
    pub latency: Duration,
    /// `Done` or `Failed`
    pub state: HandshakeState,
    /// Set when `state` is `Failed`
    pub failure: Option<HandshakeFailure>,
}

impl IterationOutcome {
    /// Whether the iteration reached `Done`.
    pub fn is_passed(&self) -> bool {
        self.failure.is_none()
    }
}

/// Everything an iteration needs, shared read-only by all iterations.
#[derive(Clone)]
pub struct IterationContext {
    kind: ScenarioKind,
    expected_status: u16,
    handshake: HandshakeClient,
    topics: TopicClient,
}

impl IterationContext {
    /// Build the context for a scenario.
    pub fn new(
        kind: ScenarioKind,
        expected_status: u16,
        transport: Arc<dyn Transport>,
        endpoints: &Endpoints,
    ) -> Self {
        Self {
            kind,
            expected_status,
            handshake: HandshakeClient::new(transport.clone(), endpoints),
            topics: TopicClient::new(transport, &endpoints.gateway),
        }
    }

    /// Run one iteration to `Done` or `Failed`.
    pub async fn run(&self, id: u64) -> IterationOutcome {
        let start = Instant::now();
        let mut handshake = Handshake::new();

        let result = match self.kind {
            ScenarioKind::Login => self.login(&mut handshake, start).await,
            ScenarioKind::LoginWithoutCert => self.login_without_cert(&mut handshake, start).await,
            ScenarioKind::CreateTopic => self.create_topic(&mut handshake, start).await,
        };

        let (latency, failure) = match result {
            Ok(latency) => {
                handshake.advance(HandshakeState::Done);
                (latency, None)
            }
            Err(failure) => {
                let kind = failure.error.kind();
                if kind == crate::ErrorKind::Assertion {
                    debug!(id, at = %failure.at, error = %failure.error, "Check failed");
                } else {
                    warn!(id, at = %failure.at, %kind, error = %failure.error, "Iteration failed");
                }
                (start.elapsed(), Some(failure))
            }
        };

        IterationOutcome {
            id,
            latency,
            state: handshake.state(),
            failure,
        }
    }

    // Each flow returns the time from `start` until the login response was checked.
    async fn login(
        &self,
        handshake: &mut Handshake,
        start: Instant,
    ) -> Result<Duration, HandshakeFailure> {
        let outcome = self.handshake.login(handshake).await?;
        handshake.check(self.expected_status, outcome.status)?;
        Ok(start.elapsed())
    }

    async fn login_without_cert(
        &self,
        handshake: &mut Handshake,
        start: Instant,
    ) -> Result<Duration, HandshakeFailure> {
        let outcome = self
            .handshake
            .submitter()
            .submit_raw(EMPTY_PAYLOAD.to_vec())
            .await
            .map_err(|e| handshake.fail_at(HandshakeState::LoggedIn, e))?;
        handshake.advance(HandshakeState::LoggedIn);
        handshake.check(self.expected_status, outcome.status)?;
        Ok(start.elapsed())
    }

    async fn create_topic(
        &self,
        handshake: &mut Handshake,
        start: Instant,
    ) -> Result<Duration, HandshakeFailure> {
        let outcome = self.handshake.login(handshake).await?;
        handshake.check(200, outcome.status)?;
        let latency = start.elapsed();

        let response = self
            .topics
            .create(outcome.session.as_ref(), &TopicPayload::random())
            .await
            .map_err(|e| handshake.fail(e))?;

        if response.status != self.expected_status {
            return Err(handshake.fail(crate::Error::Assertion {
                expected: self.expected_status,
                actual: response.status,
            }));
        }
        Ok(latency)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{MockBehavior, MockTransport};

    fn context(kind: ScenarioKind, mock: Arc<MockTransport>) -> IterationContext {
        IterationContext::new(
            kind,
            kind.default_expected_status(),
            mock,
            &Endpoints::default(),
        )
    }

    #[tokio::test]
    async fn test_login_iteration_done() {
        let mock = Arc::new(MockTransport::new());
        let outcome = context(ScenarioKind::Login, mock).run(1).await;

        assert!(outcome.is_passed());
        assert_eq!(outcome.state, HandshakeState::Done);
    }

    #[tokio::test]
    async fn test_login_without_cert_done() {
        let mock = Arc::new(MockTransport::new());
        let outcome = context(ScenarioKind::LoginWithoutCert, mock.clone())
            .run(1)
            .await;

        assert!(outcome.is_passed());
        assert_eq!(mock.paths(), vec!["/auth/login"]);
    }

    #[tokio::test]
    async fn test_create_topic_done() {
        let mock = Arc::new(MockTransport::new());
        let outcome = context(ScenarioKind::CreateTopic, mock.clone()).run(1).await;

        assert!(outcome.is_passed(), "{:?}", outcome.failure);
        assert_eq!(mock.count("/api/topic/create"), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_create_topic_latency_covers_handshake_only() {
        let mock = Arc::new(MockTransport::with_behavior(MockBehavior {
            latency: Duration::from_millis(20),
            ..MockBehavior::default()
        }));
        let outcome = context(ScenarioKind::CreateTopic, mock.clone()).run(1).await;

        assert!(outcome.is_passed(), "{:?}", outcome.failure);
        assert_eq!(mock.count("/api/topic/create"), 1);
        // cert/sign and auth/login, not the topic call
        assert!(outcome.latency >= Duration::from_millis(40));
        assert!(outcome.latency < Duration::from_millis(60), "{:?}", outcome.latency);
    }

    #[tokio::test]
    async fn test_wrong_expected_status_is_assertion() {
        let mock = Arc::new(MockTransport::new());
        let ctx = IterationContext::new(ScenarioKind::Login, 201, mock, &Endpoints::default());
        let outcome = ctx.run(7).await;

        let failure = outcome.failure.unwrap();
        assert_eq!(outcome.state, HandshakeState::Failed);
        assert_eq!(failure.at, HandshakeState::Checked);
        assert_eq!(failure.error.kind(), crate::ErrorKind::Assertion);
    }

    #[tokio::test]
    async fn test_missing_cert_fails_early() {
        let mock = Arc::new(MockTransport::with_behavior(MockBehavior {
            omit_cert: true,
            ..MockBehavior::default()
        }));
        let outcome = context(ScenarioKind::CreateTopic, mock.clone()).run(1).await;

        assert_eq!(outcome.failure.unwrap().at, HandshakeState::CertRequested);
        assert_eq!(mock.count("/auth/login"), 0);
        assert_eq!(mock.count("/api/topic/create"), 0);
    }
}
