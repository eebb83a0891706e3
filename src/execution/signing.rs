//! Private REST request signing shared by both venues.
//!
//! `signature = hex(HMAC-SHA256(secret, timestamp + METHOD + path + body))`
//! where `timestamp` is epoch milliseconds as a decimal string.

use std::fmt;

use hmac::digest::InvalidLength;
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// API key pair for one venue account.
#[derive(Clone, Default, Deserialize)]
#[serde(default)]
pub struct Credentials {
    pub api_key: String,
    pub secret_key: String,
}

impl Credentials {
    pub fn new(api_key: &str, secret_key: &str) -> Self {
        Self { api_key: api_key.to_string(), secret_key: secret_key.to_string() }
    }

    pub fn is_complete(&self) -> bool {
        !self.api_key.is_empty() && !self.secret_key.is_empty()
    }
}

// keep the secret out of logs
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &self.api_key)
            .field("secret_key", &"<redacted>")
            .finish()
    }
}

/// The three values every signed request carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedRequest {
    pub api_key: String,
    pub timestamp: String,
    pub signature: String,
}

#[derive(Debug, Clone)]
pub struct Signer {
    credentials: Credentials,
}

impl Signer {
    pub fn new(credentials: Credentials) -> Self {
        Self { credentials }
    }

    pub fn api_key(&self) -> &str {
        &self.credentials.api_key
    }

    /// Hex HMAC-SHA256 over `timestamp + method + path + body`.
    pub fn sign(&self, timestamp: &str, method: &str, path: &str, body: &str) -> Result<String, InvalidLength> {
        let mut mac = HmacSha256::new_from_slice(self.credentials.secret_key.as_bytes())?;
        mac.update(timestamp.as_bytes());
        mac.update(method.as_bytes());
        mac.update(path.as_bytes());
        mac.update(body.as_bytes());
        Ok(hex::encode(mac.finalize().into_bytes()))
    }

    /// Sign a request at the current time.
    pub fn sign_now(&self, method: &str, path: &str, body: &str) -> Result<SignedRequest, InvalidLength> {
        let timestamp = timestamp_ms();
        let signature = self.sign(&timestamp, method, path, body)?;
        Ok(SignedRequest { api_key: self.credentials.api_key.clone(), timestamp, signature })
    }
}

/// Current epoch milliseconds as a decimal string.
pub fn timestamp_ms() -> String {
    chrono::Utc::now().timestamp_millis().to_string()
}
