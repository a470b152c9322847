//! HTTP transport used by the catalog client and the content fetcher.
//!
//! All network access goes through the [`HttpTransport`] trait so the sync
//! pipeline can run against an in-memory transport in tests.

use std::time::Duration;

/// A completed HTTP exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// Numeric status code.
    pub status: u16,
    /// Canonical reason phrase for the status (may be empty).
    pub reason: String,
    /// Raw response body.
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Build a response with the canonical reason phrase for `status`.
    #[must_use]
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            reason: canonical_reason(status).to_string(),
            body: body.into(),
        }
    }

    /// Whether the status is exactly 200 OK.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.status == 200
    }
}

/// Errors below the HTTP layer: timeouts, DNS, TLS, broken connections.
#[derive(thiserror::Error, Debug)]
pub enum TransportError {
    /// The request did not complete within the configured timeout.
    #[error("Request to {url} timed out")]
    Timeout {
        /// Requested URL
        url: String,
    },

    /// The request failed before a response was received.
    #[error("Request to {url} failed: {message}")]
    Request {
        /// Requested URL
        url: String,
        /// Description of the failure
        message: String,
    },
}

/// Blocking HTTP GET.
///
/// Implementations must not retry; a failed request is reported once and the
/// caller decides how to continue.
pub trait HttpTransport {
    /// Perform a GET request with the given extra headers.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] when no HTTP response was obtained. Non-2xx
    /// responses are not errors at this level.
    fn get(&self, url: &str, headers: &[(&str, String)]) -> Result<HttpResponse, TransportError>;
}

impl<T: HttpTransport + ?Sized> HttpTransport for &T {
    fn get(&self, url: &str, headers: &[(&str, String)]) -> Result<HttpResponse, TransportError> {
        (**self).get(url, headers)
    }
}

/// [`HttpTransport`] backed by a blocking `reqwest` client.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::blocking::Client,
}

impl ReqwestTransport {
    /// Create a transport whose requests time out after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Request`] if the TLS backend cannot be
    /// initialized.
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self, TransportError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout.min(Duration::from_secs(10)))
            .user_agent(user_agent)
            .build()
            .map_err(|e| TransportError::Request {
                url: String::new(),
                message: e.to_string(),
            })?;
        Ok(Self { client })
    }

    fn map_error(url: &str, err: reqwest::Error) -> TransportError {
        if err.is_timeout() {
            TransportError::Timeout {
                url: url.to_string(),
            }
        } else {
            TransportError::Request {
                url: url.to_string(),
                message: err.to_string(),
            }
        }
    }
}

impl HttpTransport for ReqwestTransport {
    fn get(&self, url: &str, headers: &[(&str, String)]) -> Result<HttpResponse, TransportError> {
        let mut request = self.client.get(url);
        for (name, value) in headers {
            request = request.header(*name, value.as_str());
        }

        log::trace!("GET {}", url);
        let response = request.send().map_err(|e| Self::map_error(url, e))?;

        let status = response.status();
        let reason = status.canonical_reason().unwrap_or_default().to_string();
        let body = response.bytes().map_err(|e| Self::map_error(url, e))?;

        Ok(HttpResponse {
            status: status.as_u16(),
            reason,
            body: body.to_vec(),
        })
    }
}

/// Reason phrase for a status code, empty if unknown.
#[must_use]
pub fn canonical_reason(status: u16) -> &'static str {
    reqwest::StatusCode::from_u16(status)
        .ok()
        .and_then(|s| s.canonical_reason())
        .unwrap_or("")
}
