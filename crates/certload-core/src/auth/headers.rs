//! Two-phase authentication headers

use certload_crypto::DetachedSignature;

/// Wire value of the signature header before a certificate exists.
pub const UNSIGNED_SENTINEL: &str = "HACK";

/// Content type of every handshake request.
pub const CONTENT_TYPE_JSON: &str = "application/json";

/// State of the `signature` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureHeader {
    /// No certificate yet; only valid for the certificate request
    Unsigned,
    /// Detached signature over the issued certificate
    Signed(DetachedSignature),
}

impl SignatureHeader {
    /// Header value as sent on the wire.
    pub fn header_value(&self) -> String {
        match self {
            Self::Unsigned => UNSIGNED_SENTINEL.to_string(),
            Self::Signed(sig) => sig.to_base64(),
        }
    }

    /// Whether a real signature is present.
    pub fn is_signed(&self) -> bool {
        matches!(self, Self::Signed(_))
    }
}

/// Headers carried by the certificate request and the login submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthHeaders {
    content_type: &'static str,
    signature: SignatureHeader,
}

impl AuthHeaders {
    /// Headers for the certificate request.
    pub fn unsigned() -> Self {
        Self {
            content_type: CONTENT_TYPE_JSON,
            signature: SignatureHeader::Unsigned,
        }
    }

    /// Headers for the login submission.
    pub fn signed(signature: DetachedSignature) -> Self {
        Self {
            content_type: CONTENT_TYPE_JSON,
            signature: SignatureHeader::Signed(signature),
        }
    }

    /// Current signature state.
    pub fn signature(&self) -> &SignatureHeader {
        &self.signature
    }

    /// Render as header pairs.
    pub fn to_pairs(&self) -> Vec<(String, String)> {
        vec![
            ("content-type".to_string(), self.content_type.to_string()),
            ("signature".to_string(), self.signature.header_value()),
        ]
    }
}
