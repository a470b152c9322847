//! The sync pipeline: load, reconcile, download, hash, detect, save.
//!
//! Each step works on the one in-memory [`RecordSet`]. Remote and per-item
//! failures are logged and counted but never abort the run; only the store
//! load and save are fatal. The store is saved last, after everything else,
//! even when the run was interrupted.

use std::path::PathBuf;

use crate::config::{Config, ConfigError};
use crate::content::{download_all, ContentFetcher, DownloadStats};
use crate::duplicates::{
    find_duplicate_pairs, group_by_hash, hash_local_files, DuplicateGroup, DuplicatePair,
    HashStats,
};
use crate::error::ExitCode;
use crate::progress::ProgressCallback;
use crate::remote::{reconcile_catalog, CatalogClient, CatalogStats, HttpTransport};
use crate::scanner::Hasher;
use crate::signal::ShutdownHandler;
use crate::store::{MetadataStore, StoreError};

/// Fatal pipeline errors.
#[derive(thiserror::Error, Debug)]
pub enum PipelineError {
    /// The metadata store could not be loaded or saved.
    #[error("Metadata store error: {0}")]
    Store(#[from] StoreError),

    /// The configuration does not yield usable paths.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Everything a run did, for reporting.
#[derive(Debug, Clone, Default)]
pub struct SyncReport {
    /// Records in the store after the run.
    pub total_records: usize,
    /// Records carrying a hash after the run.
    pub hashed_records: usize,
    /// Catalog reconciliation, `None` when run offline.
    pub catalog: Option<CatalogStats>,
    /// Download pass, `None` when run offline.
    pub downloads: Option<DownloadStats>,
    /// Hashing pass.
    pub hashing: HashStats,
    /// Whether the content directory could not be listed.
    pub content_dir_unreadable: bool,
    /// Duplicate pairs in collection order.
    pub pairs: Vec<DuplicatePair>,
    /// Duplicate groups, one per shared hash.
    pub groups: Vec<DuplicateGroup>,
    /// Whether Ctrl+C stopped the run early.
    pub interrupted: bool,
}

impl SyncReport {
    /// Whether any recoverable failure happened.
    #[must_use]
    pub fn has_failures(&self) -> bool {
        self.catalog.as_ref().is_some_and(CatalogStats::has_failures)
            || self.downloads.as_ref().is_some_and(|d| d.failed > 0)
            || self.hashing.failed > 0
            || self.content_dir_unreadable
    }

    /// Exit code describing this run.
    #[must_use]
    pub fn exit_code(&self) -> ExitCode {
        ExitCode::for_run(self.interrupted, self.has_failures(), !self.pairs.is_empty())
    }
}

/// Catalog client and content fetcher sharing one transport.
struct Remote<T> {
    catalog: CatalogClient<T>,
    fetcher: ContentFetcher<T>,
}

/// Sequences the sync steps for one account.
pub struct Pipeline<T> {
    store: MetadataStore,
    content_dir: PathBuf,
    hasher: Hasher,
    remote: Option<Remote<T>>,
}

impl<T: HttpTransport> Pipeline<T> {
    /// Pipeline that only hashes local files and reports duplicates.
    pub fn offline(store: MetadataStore, content_dir: impl Into<PathBuf>) -> Self {
        Self {
            store,
            content_dir: content_dir.into(),
            hasher: Hasher::new(),
            remote: None,
        }
    }

    /// Pipeline that also reconciles the catalog and downloads content.
    pub fn online(
        store: MetadataStore,
        content_dir: impl Into<PathBuf>,
        catalog: CatalogClient<T>,
        fetcher: ContentFetcher<T>,
    ) -> Self {
        Self {
            remote: Some(Remote { catalog, fetcher }),
            ..Self::offline(store, content_dir)
        }
    }

    /// Build an online pipeline from the configuration.
    ///
    /// `transport` must be cheap to clone; it is shared by the catalog client
    /// and the content fetcher.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Config`] if the data paths cannot be determined.
    pub fn from_config(config: &Config, transport: T, client_id: &str) -> Result<Self, PipelineError>
    where
        T: Clone,
    {
        let images_dir = config.images_dir()?;
        let catalog = CatalogClient::new(
            transport.clone(),
            config.api_base_url.clone(),
            config.account_name.clone(),
            client_id,
        );
        let fetcher = ContentFetcher::new(transport, images_dir.clone());
        Ok(Self::online(
            MetadataStore::new(config.store_path()?),
            images_dir,
            catalog,
            fetcher,
        ))
    }

    /// Run every step once.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Store`] if the store cannot be loaded or saved.
    pub fn run(
        &self,
        progress: &dyn ProgressCallback,
        shutdown: &ShutdownHandler,
    ) -> Result<SyncReport, PipelineError> {
        let mut records = self.store.load()?;
        let mut report = SyncReport::default();
        log::info!("Loaded {} known images", records.len());

        if let Some(remote) = &self.remote {
            report.catalog = Some(reconcile_catalog(&remote.catalog, &mut records, shutdown));
            if !shutdown.is_shutdown_requested() {
                report.downloads = Some(download_all(&remote.fetcher, &records, progress, shutdown));
            }
        }

        if !shutdown.is_shutdown_requested() {
            match hash_local_files(
                &mut records,
                &self.content_dir,
                &self.hasher,
                progress,
                shutdown,
            ) {
                Ok(stats) => report.hashing = stats,
                Err(e) => {
                    log::error!("Could not scan {}: {}", self.content_dir.display(), e);
                    report.content_dir_unreadable = true;
                }
            }
        }

        log::info!("Checking for duplicates...");
        report.pairs = find_duplicate_pairs(&records);
        report.groups = group_by_hash(&records);
        report.total_records = records.len();
        report.hashed_records = records.hashed_count();
        report.interrupted = shutdown.is_shutdown_requested();

        self.store.save(&records)?;
        Ok(report)
    }
}
