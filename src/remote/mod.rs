//! Remote image host access.
//!
//! This module is the read-only network boundary of imgdupe:
//!
//! * [`transport`]: The [`HttpTransport`] seam and its `reqwest` implementation.
//! * [`catalog`]: [`CatalogClient`] for the count, page and per-image
//!   endpoints, plus [`reconcile_catalog`] which merges listings into the
//!   local [`RecordSet`](crate::store::RecordSet).
//!
//! Every endpoint answers with a JSON envelope of the form `{"data": ...}`
//! and is authenticated with an `Authorization: Client-ID <id>` header.

pub mod catalog;
pub mod transport;

pub use catalog::{reconcile_catalog, CatalogClient, CatalogStats, PAGE_SIZE};
pub use transport::{HttpResponse, HttpTransport, ReqwestTransport, TransportError};

/// Default API root of the image host.
pub const DEFAULT_API_BASE: &str = "https://api.imgur.com/3";

/// Errors returned by catalog requests.
#[derive(thiserror::Error, Debug)]
pub enum RemoteError {
    /// The server answered with a non-success status.
    #[error("{endpoint}: HTTP {status} {reason}")]
    Status {
        /// Endpoint description
        endpoint: String,
        /// HTTP status code
        status: u16,
        /// Reason phrase
        reason: String,
    },

    /// No response was received.
    #[error("{endpoint}: {source}")]
    Transport {
        /// Endpoint description
        endpoint: String,
        /// The underlying transport error
        #[source]
        source: TransportError,
    },

    /// The response body was not the expected JSON.
    #[error("{endpoint}: unexpected response body: {source}")]
    Decode {
        /// Endpoint description
        endpoint: String,
        /// The underlying parse error
        #[source]
        source: serde_json::Error,
    },
}
