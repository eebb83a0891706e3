// Signed GET/POST helpers. The body string that is signed is the exact body sent.
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, RequestBuilder};
use serde_json::Value;
use tracing::{debug, warn};

use super::signing::Signer;
use super::{ExecutionError, ExecutionResult};

/// Header names a venue expects for the key, timestamp and signature.
#[derive(Debug, Clone, Copy)]
pub struct AuthHeaders {
    pub key: &'static str,
    pub timestamp: &'static str,
    pub signature: &'static str,
    // bitFlyer also sends a content type on GETs
    pub content_type_on_get: bool,
}

pub struct RestClient {
    http: Client,
    base_url: String,
    signer: Signer,
    headers: AuthHeaders,
}

impl RestClient {
    pub fn new(base_url: &str, signer: Signer, headers: AuthHeaders) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            signer,
            headers,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Signed GET. Only `path` is signed; `query` pairs are appended unsigned.
    pub async fn get(&self, path: &str, query: &[(&str, String)]) -> ExecutionResult<Value> {
        let mut request = self.http.get(format!("{}{}", self.base_url, path));
        if !query.is_empty() {
            request = request.query(query);
        }
        let request = self.authorise(request, "GET", path, "")?;
        let request = if self.headers.content_type_on_get {
            request.header(CONTENT_TYPE, "application/json")
        } else {
            request
        };
        self.execute("GET", path, request).await
    }

    /// Signed POST with a JSON body.
    pub async fn post(&self, path: &str, body: &Value) -> ExecutionResult<Value> {
        let body = serde_json::to_string(body)?;
        let request = self
            .http
            .post(format!("{}{}", self.base_url, path))
            .header(CONTENT_TYPE, "application/json");
        let request = self.authorise(request, "POST", path, &body)?;
        self.execute("POST", path, request.body(body)).await
    }

    fn authorise(&self, request: RequestBuilder, method: &str, path: &str, body: &str) -> ExecutionResult<RequestBuilder> {
        let signed = self
            .signer
            .sign_now(method, path, body)
            .map_err(|e| ExecutionError::Signing(e.to_string()))?;
        Ok(request
            .header(self.headers.key, signed.api_key)
            .header(self.headers.timestamp, signed.timestamp)
            .header(self.headers.signature, signed.signature))
    }

    async fn execute(&self, method: &str, path: &str, request: RequestBuilder) -> ExecutionResult<Value> {
        debug!(method, path, "Sending signed request");
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            warn!(method, path, status = status.as_u16(), %body, "Venue rejected request");
            return Err(ExecutionError::RequestFailed { status_code: status.as_u16(), body });
        }
        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&body)?)
    }
}

/// Read an id that a venue may send as a string or a number.
pub fn id_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_id_string() {
        assert_eq!(id_string(&json!("JRF20150707-050237-639234")), Some("JRF20150707-050237-639234".into()));
        assert_eq!(id_string(&json!(637000)), Some("637000".into()));
        assert_eq!(id_string(&json!(null)), None);
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let signer = Signer::new(crate::execution::Credentials::new("k", "s"));
        let headers = AuthHeaders { key: "K", timestamp: "T", signature: "S", content_type_on_get: false };
        let client = RestClient::new("https://api.bitflyer.com/", signer, headers);
        assert_eq!(client.base_url(), "https://api.bitflyer.com");
    }
}
