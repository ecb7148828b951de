//! Certificate request and response payloads

use crate::error::{Error, Result};
use certload_crypto::KeyMaterial;
use serde::Serialize;
use serde_json::Value;

/// Body of `POST /cert/sign`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CertificateRequest {
    /// Base64 public key
    #[serde(rename = "pub")]
    pub public_key: String,
}

impl CertificateRequest {
    /// Build the request for a keypair.
    pub fn for_key(key: &KeyMaterial) -> Self {
        Self {
            public_key: key.public_key_base64(),
        }
    }

    /// Serialize to the JSON request body.
    pub fn to_body(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self).map_err(|e| Error::Protocol(format!("encode request: {e}")))
    }
}

/// Certificate issued by the certificate service.
///
/// The response body is kept byte for byte: the login submission forwards it
/// unchanged, and the signature covers the decoded `cert` string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateResponse {
    raw: Vec<u8>,
    cert: String,
}

impl CertificateResponse {
    /// Parse a response body, requiring a string `cert` field.
    pub fn parse(raw: Vec<u8>) -> Result<Self> {
        let value: Value = serde_json::from_slice(&raw)
            .map_err(|e| Error::Protocol(format!("certificate response is not JSON: {e}")))?;

        let cert = match value.get("cert") {
            Some(Value::String(cert)) => cert.clone(),
            Some(_) => return Err(Error::Protocol("`cert` is not a string".to_string())),
            None => {
                return Err(Error::Protocol(
                    "certificate response has no `cert` field".to_string(),
                ))
            }
        };

        Ok(Self { raw, cert })
    }

    /// The certificate text.
    pub fn cert(&self) -> &str {
        &self.cert
    }

    /// Bytes covered by the detached signature.
    pub fn signing_bytes(&self) -> &[u8] {
        self.cert.as_bytes()
    }

    /// Response body exactly as received.
    pub fn raw_body(&self) -> &[u8] {
        &self.raw
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_uses_pub_field() {
        let key = KeyMaterial::from_seed(&[5u8; 32]);
        let body = CertificateRequest::for_key(&key).to_body().unwrap();
        let value: Value = serde_json::from_slice(&body).unwrap();

        assert_eq!(value["pub"], key.public_key_base64());
        assert_eq!(value.as_object().unwrap().len(), 1);
    }

    #[test]
    fn test_parse_keeps_raw_body() {
        let raw = br#"{ "serial": 7,  "cert": "-----BEGIN CERTIFICATE-----\nAAA\n-----END CERTIFICATE-----\n" }"#;
        let parsed = CertificateResponse::parse(raw.to_vec()).unwrap();

        assert_eq!(parsed.raw_body(), raw);
        assert_eq!(
            parsed.cert(),
            "-----BEGIN CERTIFICATE-----\nAAA\n-----END CERTIFICATE-----\n"
        );
        // Escapes are decoded before signing
        assert!(parsed.signing_bytes().contains(&b'\n'));
    }

    #[test]
    fn test_parse_missing_cert() {
        let err = CertificateResponse::parse(br#"{"serial": 1}"#.to_vec()).unwrap_err();
        assert!(matches!(err, Error::Protocol(_)));
        assert!(err.to_string().contains("no `cert`"));
    }

    #[test]
    fn test_parse_non_string_cert() {
        let err = CertificateResponse::parse(br#"{"cert": 42}"#.to_vec()).unwrap_err();
        assert!(err.to_string().contains("not a string"));
    }

    #[test]
    fn test_parse_not_json() {
        let err = CertificateResponse::parse(b"<html>bad gateway</html>".to_vec()).unwrap_err();
        assert!(err.to_string().contains("not JSON"));
    }
}
