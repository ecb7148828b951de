use super::*;
use crate::transport::{MockBehavior, MockTransport};

fn client(mock: Arc<MockTransport>) -> HandshakeClient {
    HandshakeClient::new(mock, &Endpoints::default())
}

#[test]
fn test_state_sequence() {
    let mut state = HandshakeState::Init;
    let mut seen = vec![state];
    while let Some(next) = state.next() {
        state = next;
        seen.push(state);
    }

    assert_eq!(
        seen,
        vec![
            HandshakeState::Init,
            HandshakeState::KeyGenerated,
            HandshakeState::CertRequested,
            HandshakeState::Signed,
            HandshakeState::LoggedIn,
            HandshakeState::Checked,
            HandshakeState::Done,
        ]
    );
    assert!(HandshakeState::Done.is_terminal());
    assert!(HandshakeState::Failed.is_terminal());
    assert_eq!(HandshakeState::Failed.next(), None);
}

#[test]
fn test_check_mismatch_fails() {
    let mut handshake = Handshake::new();
    handshake.advance(HandshakeState::LoggedIn);

    let failure = handshake.check(200, 400).unwrap_err();
    assert_eq!(failure.at, HandshakeState::Checked);
    assert!(matches!(
        failure.error,
        Error::Assertion {
            expected: 200,
            actual: 400
        }
    ));
    assert_eq!(handshake.state(), HandshakeState::Failed);
}

#[tokio::test]
async fn test_login_succeeds() {
    let mock = Arc::new(MockTransport::new());
    let client = client(mock.clone());
    let mut handshake = Handshake::new();

    let outcome = client.login(&mut handshake).await.unwrap();

    assert_eq!(outcome.status, 200);
    assert_eq!(handshake.state(), HandshakeState::LoggedIn);
    assert!(outcome.session.is_some());
    assert!(outcome.wallet().is_some());
    assert_eq!(mock.paths(), vec!["/cert/sign", "/auth/login"]);
}

#[tokio::test]
async fn test_wallet_matches_key() {
    let mock = Arc::new(MockTransport::new());
    let client = client(mock);
    let key = KeyMaterial::from_seed(&[21u8; 32]);
    let expected = key.fingerprint();

    let outcome = client
        .login_with_key(key, &mut Handshake::new())
        .await
        .unwrap();
    assert_eq!(outcome.wallet().as_deref(), Some(expected.as_str()));
}

#[tokio::test]
async fn test_missing_cert_skips_login() {
    let mock = Arc::new(MockTransport::with_behavior(MockBehavior {
        omit_cert: true,
        ..MockBehavior::default()
    }));
    let client = client(mock.clone());
    let mut handshake = Handshake::new();

    let failure = client.login(&mut handshake).await.unwrap_err();

    assert_eq!(failure.at, HandshakeState::CertRequested);
    assert_eq!(failure.error.kind(), crate::ErrorKind::Protocol);
    assert_eq!(handshake.state(), HandshakeState::Failed);
    assert_eq!(mock.count("/auth/login"), 0);
}

#[tokio::test]
async fn test_cert_service_error_status() {
    let mock = Arc::new(MockTransport::with_behavior(MockBehavior {
        cert_status: Some(500),
        ..MockBehavior::default()
    }));
    let client = client(mock.clone());

    let failure = client.login(&mut Handshake::new()).await.unwrap_err();
    assert_eq!(failure.at, HandshakeState::CertRequested);
    let message = failure.error.to_string();
    assert!(message.contains("500"));
    assert!(message.contains("unavailable"), "{message}");
    assert_eq!(mock.count("/auth/login"), 0);
}

#[tokio::test]
async fn test_network_failure() {
    let mock = Arc::new(MockTransport::with_behavior(MockBehavior {
        unreachable: true,
        ..MockBehavior::default()
    }));
    let client = client(mock);

    let failure = client.login(&mut Handshake::new()).await.unwrap_err();
    assert_eq!(failure.at, HandshakeState::CertRequested);
    assert_eq!(failure.error.kind(), crate::ErrorKind::Network);
}

#[tokio::test]
async fn test_stale_signature_is_rejected() {
    let mock = Arc::new(MockTransport::new());
    let requester = CertificateRequester::new(mock.clone(), "http://ca");
    let submitter = LoginSubmitter::new(mock.clone(), "http://gw");

    let first = KeyMaterial::generate().unwrap();
    let second = KeyMaterial::generate().unwrap();
    let cert_a = requester.request(&first).await.unwrap();
    let cert_b = requester.request(&second).await.unwrap();

    // Signature from another certificate does not carry over
    let stale = sign_certificate(&cert_a, &first);
    let outcome = submitter
        .submit(&cert_b, &AuthHeaders::signed(stale))
        .await
        .unwrap();
    assert_eq!(outcome.status, 400);
    assert!(outcome.session.is_none());

    let fresh = sign_certificate(&cert_b, &second);
    let outcome = submitter
        .submit(&cert_b, &AuthHeaders::signed(fresh))
        .await
        .unwrap();
    assert_eq!(outcome.status, 200);
}

#[tokio::test]
async fn test_unsigned_login_refused_locally() {
    let mock = Arc::new(MockTransport::new());
    let requester = CertificateRequester::new(mock.clone(), "http://ca");
    let submitter = LoginSubmitter::new(mock.clone(), "http://gw");

    let key = KeyMaterial::generate().unwrap();
    let cert = requester.request(&key).await.unwrap();
    let result = submitter.submit(&cert, &AuthHeaders::unsigned()).await;

    assert!(matches!(result, Err(Error::Protocol(_))));
    assert_eq!(mock.count("/auth/login"), 0);
}

#[tokio::test]
async fn test_empty_payload_rejected() {
    let mock = Arc::new(MockTransport::new());
    let submitter = LoginSubmitter::new(mock, "http://gw");

    let outcome = submitter.submit_raw(b"{}".to_vec()).await.unwrap();
    assert_eq!(outcome.status, 400);
    assert!(outcome.session.is_none());
}
