//! Paginated catalog listing and reconciliation into the local record set.

use serde::de::DeserializeOwned;
use serde::Deserialize;

use super::transport::{HttpResponse, HttpTransport};
use super::RemoteError;
use crate::signal::ShutdownHandler;
use crate::store::{ImageRecord, RecordSet};

/// Items per catalog page. Fixed by the remote API.
pub const PAGE_SIZE: u64 = 50;

/// `{"data": ...}` wrapper used by every API response.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: T,
}

/// Read-only client for an account's image catalog.
pub struct CatalogClient<T> {
    transport: T,
    api_base: String,
    account: String,
    client_id: String,
}

impl<T: HttpTransport> CatalogClient<T> {
    /// Create a client for `account` authenticated with `client_id`.
    pub fn new(
        transport: T,
        api_base: impl Into<String>,
        account: impl Into<String>,
        client_id: impl Into<String>,
    ) -> Self {
        Self {
            transport,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            account: account.into(),
            client_id: client_id.into(),
        }
    }

    /// Account whose catalog is listed.
    #[must_use]
    pub fn account(&self) -> &str {
        &self.account
    }

    /// Number of images the remote reports for the account.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError`] on a transport failure, a non-200 status or an
    /// unexpected body.
    pub fn fetch_total_count(&self) -> Result<u64, RemoteError> {
        let url = format!("{}/account/{}/images/count", self.api_base, self.account);
        self.get_data(&url, "images count")
    }

    /// One page of the account's image listing.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError`] on a transport failure, a non-200 status or an
    /// unexpected body.
    pub fn fetch_page(&self, page: u64) -> Result<Vec<ImageRecord>, RemoteError> {
        let url = format!("{}/account/{}/images/{}", self.api_base, self.account, page);
        self.get_data(&url, &format!("images page {page}"))
    }

    /// Metadata for a single image.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError`] on a transport failure, a non-200 status or an
    /// unexpected body.
    pub fn fetch_image_info(&self, id: &str) -> Result<ImageRecord, RemoteError> {
        let url = format!("{}/image/{}", self.api_base, id);
        self.get_data(&url, &format!("image info for {id}"))
    }

    /// Index of the last page to request for `total` items.
    ///
    /// Pages `0..=page_count(total)` are requested: one page more than the
    /// count strictly needs, so items added between the count and the listing
    /// are still picked up.
    #[must_use]
    pub fn page_count(total: u64) -> u64 {
        total.div_ceil(PAGE_SIZE)
    }

    fn get_data<D: DeserializeOwned>(&self, url: &str, endpoint: &str) -> Result<D, RemoteError> {
        let headers = [("Authorization", format!("Client-ID {}", self.client_id))];
        let response = self
            .transport
            .get(url, &headers)
            .map_err(|source| RemoteError::Transport {
                endpoint: endpoint.to_string(),
                source,
            })?;
        decode_envelope(endpoint, &response)
    }
}

fn decode_envelope<D: DeserializeOwned>(
    endpoint: &str,
    response: &HttpResponse,
) -> Result<D, RemoteError> {
    if !response.is_ok() {
        return Err(RemoteError::Status {
            endpoint: endpoint.to_string(),
            status: response.status,
            reason: response.reason.clone(),
        });
    }
    let envelope: Envelope<D> =
        serde_json::from_slice(&response.body).map_err(|source| RemoteError::Decode {
            endpoint: endpoint.to_string(),
            source,
        })?;
    Ok(envelope.data)
}

/// Outcome of one catalog reconciliation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogStats {
    /// Item count reported by the remote, `None` if the count request failed.
    pub total_reported: Option<u64>,
    /// Pages requested.
    pub pages_requested: u64,
    /// Pages that failed and contributed nothing, not counting the trailing page.
    pub pages_failed: u64,
    /// The page past `ceil(total / PAGE_SIZE)` failed. Logged only.
    pub trailing_page_failed: bool,
    /// Records appended to the local set.
    pub new_records: usize,
    /// Items already known locally and left untouched.
    pub known_records: usize,
}

impl CatalogStats {
    /// Whether any catalog request failed.
    #[must_use]
    pub fn has_failures(&self) -> bool {
        self.total_reported.is_none() || self.pages_failed > 0
    }
}

/// Merge the remote catalog into `records`.
///
/// New ids are appended in listing order; ids already present are left
/// untouched. A failed count request skips the catalog entirely and a failed
/// page is logged and skipped; neither aborts the run. The last requested page
/// lies past the reported count, so its failure is logged and otherwise
/// ignored.
pub fn reconcile_catalog<T: HttpTransport>(
    client: &CatalogClient<T>,
    records: &mut RecordSet,
    shutdown: &ShutdownHandler,
) -> CatalogStats {
    let mut stats = CatalogStats::default();

    log::info!("Fetching images count for {}...", client.account());
    let total = match client.fetch_total_count() {
        Ok(total) => total,
        Err(e) => {
            log::warn!("Could not get images count for {}: {}", client.account(), e);
            return stats;
        }
    };
    log::info!("Found {} images for {}", total, client.account());
    stats.total_reported = Some(total);

    let last_page = CatalogClient::<T>::page_count(total);
    for page in 0..=last_page {
        if shutdown.is_shutdown_requested() {
            log::info!("Shutdown requested, stopping catalog fetch at page {}", page);
            break;
        }

        stats.pages_requested += 1;
        log::debug!("Fetching images page {} of {}", page, last_page);
        match client.fetch_page(page) {
            Ok(items) => {
                for item in items {
                    if records.insert_if_absent(item) {
                        stats.new_records += 1;
                    } else {
                        stats.known_records += 1;
                    }
                }
            }
            Err(e) if page == last_page => {
                stats.trailing_page_failed = true;
                log::info!("Ignoring failure on trailing page {}: {}", page, e);
            }
            Err(e) => {
                stats.pages_failed += 1;
                log::warn!("Failed to get images data on page {}: {}", page, e);
            }
        }
    }

    log::info!(
        "Catalog reconciled: {} new, {} already known, {} of {} pages failed",
        stats.new_records,
        stats.known_records,
        stats.pages_failed,
        stats.pages_requested
    );
    stats
}
