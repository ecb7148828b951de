//! Request/response transport
//!
//! The handshake only needs one primitive: POST some bytes with some headers
//! and get back a status, headers and body. `HttpTransport` does this over
//! reqwest; `MockTransport` simulates the certificate service and gateway
//! in-process for tests.

use crate::error::Result;
use async_trait::async_trait;

mod http;
mod mock;

pub use http::{HttpConfig, HttpTransport};
pub use mock::{MockBehavior, MockTransport};

/// An outbound POST request.
#[derive(Debug, Clone)]
pub struct TransportRequest {
    /// Absolute URL
    pub url: String,
    /// Header name/value pairs
    pub headers: Vec<(String, String)>,
    /// Raw body bytes
    pub body: Vec<u8>,
}

impl TransportRequest {
    /// Get the first header value with the given name (case-insensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }
}

/// A response from a collaborator.
#[derive(Debug, Clone)]
pub struct TransportResponse {
    /// HTTP status code
    pub status: u16,
    /// Header name/value pairs, in order received
    pub headers: Vec<(String, String)>,
    /// Raw body bytes
    pub body: Vec<u8>,
}

impl TransportResponse {
    /// Whether the status is 2xx.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Get the first header value with the given name (case-insensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    /// All values of a repeated header (e.g. `set-cookie`).
    pub fn header_values<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.headers
            .iter()
            .filter(move |(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Body as text, lossy.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

fn find_header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}

/// Black-box request/response primitive.
///
/// Implementations must be shareable across concurrent iterations and must
/// map connection failures to `Error::Network` and timeouts to
/// `Error::Timeout`.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send a POST request.
    async fn post(&self, request: TransportRequest) -> Result<TransportResponse>;
}

/// Join a base URL and an absolute path.
pub fn endpoint(base: &str, path: &str) -> String {
    format!("{}{}", base.trim_end_matches('/'), path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_join() {
        assert_eq!(
            endpoint("http://localhost:7999/", "/cert/sign"),
            "http://localhost:7999/cert/sign"
        );
        assert_eq!(
            endpoint("http://localhost:8080", "/auth/login"),
            "http://localhost:8080/auth/login"
        );
    }

    #[test]
    fn test_header_lookup_is_case_insensitive() {
        let response = TransportResponse {
            status: 200,
            headers: vec![
                ("Set-Cookie".to_string(), "a=1; Path=/".to_string()),
                ("content-type".to_string(), "application/json".to_string()),
                ("set-cookie".to_string(), "b=2".to_string()),
            ],
            body: Vec::new(),
        };

        assert_eq!(response.header("Content-Type"), Some("application/json"));
        let cookies: Vec<&str> = response.header_values("set-cookie").collect();
        assert_eq!(cookies, vec!["a=1; Path=/", "b=2"]);
        assert!(response.is_success());
    }
}
