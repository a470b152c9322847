//! Lazy hashing of downloaded content.
//!
//! Every file in the content directory is matched to its record by the id in
//! its file name. A record is hashed only if it has no hash yet; a stored hash
//! is trusted and never recomputed, even if the file changed on disk.

use std::path::Path;

use crate::progress::ProgressCallback;
use crate::scanner::{list_content_files, Hasher, ScanError};
use crate::signal::ShutdownHandler;
use crate::store::RecordSet;

/// Counters for a hashing pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HashStats {
    /// Files found in the content directory.
    pub files_seen: usize,
    /// Files hashed in this pass.
    pub hashed: usize,
    /// Files whose record already had a hash.
    pub already_hashed: usize,
    /// Files with no matching record.
    pub orphaned: usize,
    /// Files that could not be read.
    pub failed: usize,
    /// Bytes read while hashing.
    pub bytes_hashed: u64,
}

/// Compute and store hashes for downloaded files whose record lacks one.
///
/// Files without a matching record are skipped silently. A file that cannot
/// be read is logged and counted; its record stays unhashed and will be
/// retried on the next run.
///
/// # Errors
///
/// Returns [`ScanError`] only if the content directory itself cannot be
/// listed.
pub fn hash_local_files(
    records: &mut RecordSet,
    content_dir: &Path,
    hasher: &Hasher,
    progress: &dyn ProgressCallback,
    shutdown: &ShutdownHandler,
) -> Result<HashStats, ScanError> {
    let files = list_content_files(content_dir)?;
    let mut stats = HashStats {
        files_seen: files.len(),
        ..HashStats::default()
    };
    if files.is_empty() {
        return Ok(stats);
    }

    log::info!("Computing hashes...");
    progress.on_phase_start("hash", files.len());

    for (i, file) in files.iter().enumerate() {
        if shutdown.is_shutdown_requested() {
            log::info!("Shutdown requested, stopping hashing");
            break;
        }
        progress.on_progress(i + 1, &file.record_id);

        let Some(record) = records.find_by_id_mut(&file.record_id) else {
            log::trace!("No record for {}, skipping", file.path.display());
            stats.orphaned += 1;
            continue;
        };
        if record.has_hash() {
            stats.already_hashed += 1;
            continue;
        }

        match hasher.compute_file_hash(&file.path) {
            Ok(hash) => {
                log::trace!("{} -> {}", file.path.display(), hash);
                record.set_hash(hash);
                stats.hashed += 1;
                stats.bytes_hashed += file.size;
                progress.on_item_completed(file.size);
            }
            Err(e) => {
                log::warn!("Could not hash {}: {}", file.path.display(), e);
                stats.failed += 1;
            }
        }
    }

    progress.on_phase_end("hash");
    log::debug!(
        "Hashed {} files, {} already hashed, {} without a record",
        stats.hashed,
        stats.already_hashed,
        stats.orphaned
    );
    Ok(stats)
}
