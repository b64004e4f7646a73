use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("{0}")]
    Network(String),
    #[error("networking is disabled in this build")]
    Disabled,
}

/// What came back over the wire, before any interpretation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    /// Canonical reason phrase for `status`, if any.
    pub status_text: String,
    /// `None` when the body could not be read as text.
    pub body: Option<String>,
}

impl RawResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// One JSON POST. Implementations block the calling thread.
pub trait ChatTransport: Send + Sync {
    fn post_json(&self, url: &str, body: &Value) -> Result<RawResponse, TransportError>;
}

#[cfg(feature = "network")]
pub struct HttpTransport {
    client: reqwest::blocking::Client,
}

#[cfg(feature = "network")]
impl HttpTransport {
    pub fn new(timeout: Option<std::time::Duration>) -> Result<Self, TransportError> {
        // The blocking client defaults to a 30s timeout; `None` disables it.
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::Network(e.to_string()))?;
        Ok(Self { client })
    }
}

#[cfg(feature = "network")]
impl ChatTransport for HttpTransport {
    fn post_json(&self, url: &str, body: &Value) -> Result<RawResponse, TransportError> {
        let payload =
            serde_json::to_vec(body).map_err(|e| TransportError::Network(e.to_string()))?;
        let response = self
            .client
            .post(url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(payload)
            .send()
            .map_err(|e| TransportError::Network(e.to_string()))?;
        let status = response.status();
        Ok(RawResponse {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or("").to_string(),
            body: response.text().ok(),
        })
    }
}

#[cfg(not(feature = "network"))]
pub struct HttpTransport;

#[cfg(not(feature = "network"))]
impl HttpTransport {
    pub fn new(_timeout: Option<std::time::Duration>) -> Result<Self, TransportError> {
        Ok(Self)
    }
}

#[cfg(not(feature = "network"))]
impl ChatTransport for HttpTransport {
    fn post_json(&self, _url: &str, _body: &Value) -> Result<RawResponse, TransportError> {
        Err(TransportError::Disabled)
    }
}
