//! Downloading image content into the local content directory.
//!
//! A file's presence under its link-derived name is the only signal that an
//! image has been downloaded. Downloads land in a `.part` file that is renamed
//! into place once the whole body is on disk, so an interrupted run never
//! leaves a truncated file under the final name.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::progress::ProgressCallback;
use crate::remote::HttpTransport;
use crate::signal::ShutdownHandler;
use crate::store::{ImageRecord, RecordSet};

/// Suffix of in-flight download files.
pub const PARTIAL_SUFFIX: &str = "part";

/// Derive the local filename from a content URL.
///
/// Takes the last path segment and cuts it at the first `?` or `#`.
/// Returns `None` when nothing usable is left.
///
/// # Examples
///
/// ```
/// use imgdupe::content::filename_from_link;
///
/// assert_eq!(filename_from_link("https://i.imgur.com/abc.png").as_deref(), Some("abc.png"));
/// assert_eq!(filename_from_link("https://i.imgur.com/abc.jpg?1").as_deref(), Some("abc.jpg"));
/// assert_eq!(filename_from_link("https://i.imgur.com/"), None);
/// ```
#[must_use]
pub fn filename_from_link(link: &str) -> Option<String> {
    let segment = link.rsplit('/').next().unwrap_or_default();
    let name = segment
        .split(['?', '#'])
        .next()
        .unwrap_or_default()
        .trim();
    if name.is_empty() || name == "." || name == ".." {
        None
    } else {
        Some(name.to_string())
    }
}

/// Result of [`ContentFetcher::ensure_downloaded`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadOutcome {
    /// The file already existed; no request was made.
    AlreadyPresent,
    /// The file was downloaded.
    Downloaded {
        /// Bytes written
        bytes: u64,
    },
    /// The download failed and the file is still absent.
    Failed,
    /// No filename could be derived from the record's link.
    Skipped,
}

/// Downloads record content into a directory.
pub struct ContentFetcher<T> {
    transport: T,
    directory: PathBuf,
}

impl<T: HttpTransport> ContentFetcher<T> {
    /// Create a fetcher writing into `directory`.
    pub fn new(transport: T, directory: impl Into<PathBuf>) -> Self {
        Self {
            transport,
            directory: directory.into(),
        }
    }

    /// Directory downloads are written to.
    #[must_use]
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Local path for a record, if a filename can be derived from its link.
    #[must_use]
    pub fn local_path(&self, record: &ImageRecord) -> Option<PathBuf> {
        filename_from_link(&record.link).map(|name| self.directory.join(name))
    }

    /// Download the record's content unless it is already on disk.
    ///
    /// Failures are logged and reported as [`DownloadOutcome::Failed`]; a
    /// later run will try again. The record itself is never modified.
    pub fn ensure_downloaded(&self, record: &ImageRecord) -> DownloadOutcome {
        let Some(target) = self.local_path(record) else {
            log::warn!(
                "Cannot derive a filename for {} from link '{}'",
                record.id,
                record.link
            );
            return DownloadOutcome::Skipped;
        };

        if target.exists() {
            log::trace!("Skipping {} - already downloaded", target.display());
            return DownloadOutcome::AlreadyPresent;
        }

        let response = match self.transport.get(&record.link, &[]) {
            Ok(response) => response,
            Err(e) => {
                log::warn!("Could not open image url '{}': {}", record.link, e);
                return DownloadOutcome::Failed;
            }
        };

        if !response.is_ok() {
            log::warn!(
                "Could not open image url '{}' ({} - {})",
                record.link,
                response.status,
                response.reason
            );
            return DownloadOutcome::Failed;
        }

        match self.write_atomically(&target, &response.body) {
            Ok(()) => {
                log::debug!(
                    "Downloaded {} ({})",
                    target.display(),
                    bytesize::ByteSize::b(response.body.len() as u64)
                );
                DownloadOutcome::Downloaded {
                    bytes: response.body.len() as u64,
                }
            }
            Err(e) => {
                log::warn!("Could not write {}: {}", target.display(), e);
                DownloadOutcome::Failed
            }
        }
    }

    fn write_atomically(&self, target: &Path, body: &[u8]) -> std::io::Result<()> {
        fs::create_dir_all(&self.directory)?;
        let partial = partial_path(target);

        let result = (|| {
            let mut file = fs::File::create(&partial)?;
            file.write_all(body)?;
            file.sync_all()?;
            fs::rename(&partial, target)
        })();

        if result.is_err() {
            let _ = fs::remove_file(&partial);
        }
        result
    }
}

fn partial_path(target: &Path) -> PathBuf {
    let mut name = target.as_os_str().to_owned();
    name.push(".");
    name.push(PARTIAL_SUFFIX);
    PathBuf::from(name)
}

/// Counters for a download pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DownloadStats {
    /// Files already on disk.
    pub already_present: usize,
    /// Files downloaded in this pass.
    pub downloaded: usize,
    /// Downloads that failed.
    pub failed: usize,
    /// Records without a usable link.
    pub skipped: usize,
    /// Total bytes downloaded.
    pub bytes: u64,
}

/// Ensure every record's content is on disk.
///
/// Records are processed in collection order; a failure only affects its own
/// record.
pub fn download_all<T: HttpTransport>(
    fetcher: &ContentFetcher<T>,
    records: &RecordSet,
    progress: &dyn ProgressCallback,
    shutdown: &ShutdownHandler,
) -> DownloadStats {
    let mut stats = DownloadStats::default();
    if records.is_empty() {
        return stats;
    }

    log::info!("Checking {} images for missing downloads...", records.len());
    progress.on_phase_start("download", records.len());

    for (i, record) in records.iter().enumerate() {
        if shutdown.is_shutdown_requested() {
            log::info!("Shutdown requested, stopping downloads");
            break;
        }

        match fetcher.ensure_downloaded(record) {
            DownloadOutcome::AlreadyPresent => stats.already_present += 1,
            DownloadOutcome::Downloaded { bytes } => {
                stats.downloaded += 1;
                stats.bytes += bytes;
                progress.on_item_completed(bytes);
            }
            DownloadOutcome::Failed => stats.failed += 1,
            DownloadOutcome::Skipped => stats.skipped += 1,
        }
        progress.on_progress(i + 1, &record.id);
    }

    progress.on_phase_end("download");
    if stats.downloaded > 0 || stats.failed > 0 {
        log::info!(
            "Downloaded {} images ({}), {} failed",
            stats.downloaded,
            bytesize::ByteSize::b(stats.bytes),
            stats.failed
        );
    }
    stats
}
