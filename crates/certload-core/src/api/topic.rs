//! Topic creation

use crate::auth::{Session, CONTENT_TYPE_JSON};
use crate::error::{Error, Result};
use crate::transport::{endpoint, Transport, TransportRequest, TransportResponse};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Body of `POST /api/topic/create`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicPayload {
    /// Topic title
    pub title: String,
    /// Image references
    pub images: Vec<String>,
    /// Tag names
    pub tags: Vec<String>,
    /// Category name
    pub category: String,
    /// Body text
    pub content: String,
}

impl TopicPayload {
    /// A test topic with random content so repeated posts never collide.
    pub fn random() -> Self {
        let mut nonce = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut nonce);
        let nonce: String = nonce.iter().map(|b| format!("{:02x}", b)).collect();

        Self {
            title: "hello world".to_string(),
            images: Vec::new(),
            tags: vec!["abc".to_string()],
            category: "testing".to_string(),
            content: format!("hello world + {nonce}"),
        }
    }
}

/// Client for topic endpoints.
#[derive(Clone)]
pub struct TopicClient {
    transport: Arc<dyn Transport>,
    url: String,
}

impl TopicClient {
    /// Create a client for the given gateway base URL.
    pub fn new(transport: Arc<dyn Transport>, gateway: &str) -> Self {
        Self {
            transport,
            url: endpoint(gateway, "/api/topic/create"),
        }
    }

    /// Create a topic within a session.
    pub async fn create(
        &self,
        session: Option<&Session>,
        payload: &TopicPayload,
    ) -> Result<TransportResponse> {
        let body = serde_json::to_vec(payload)
            .map_err(|e| Error::Protocol(format!("encode topic: {e}")))?;

        let mut headers = vec![("content-type".to_string(), CONTENT_TYPE_JSON.to_string())];
        if let Some(session) = session {
            headers.push(("cookie".to_string(), session.cookie_header()));
        }

        self.transport
            .post(TransportRequest {
                url: self.url.clone(),
                headers,
                body,
            })
            .await
    }
}
