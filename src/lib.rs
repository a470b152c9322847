//! imgdupe - hosted image mirror and duplicate upload finder
//!
//! imgdupe keeps a local copy of every image in a hosted account, remembers
//! their metadata between runs and reports uploads whose content is
//! byte-for-byte identical.
//!
//! A run is incremental: known images are not fetched again, and a file is
//! hashed only once, ever. See [`pipeline`] for the order of steps.

pub mod cli;
pub mod config;
pub mod content;
pub mod duplicates;
pub mod error;
pub mod logging;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod remote;
pub mod scanner;
pub mod signal;
pub mod store;

use std::io::{self, IsTerminal, Write};

use anyhow::{Context, Result};

use crate::cli::{Cli, Commands, OutputFormat};
use crate::config::Config;
use crate::error::ExitCode;
use crate::output::{CsvOutput, JsonOutput, TextOutput};
use crate::pipeline::{Pipeline, SyncReport};
use crate::progress::Progress;
use crate::remote::{CatalogClient, ReqwestTransport};
use crate::store::MetadataStore;

/// Run the application for parsed command-line arguments.
///
/// # Errors
///
/// Returns an error for fatal conditions: invalid configuration, a missing
/// client id, or a metadata store that cannot be read or written.
pub fn run_app(cli: Cli) -> Result<ExitCode> {
    logging::init_logging(cli.verbose, cli.quiet, cli.no_color);
    if cli.no_color {
        yansi::disable();
    }

    let config = Config::load(cli.config.as_deref())
        .context("Failed to load configuration")?
        .with_overrides(cli.command.overrides());
    let color = !cli.no_color && io::stdout().is_terminal();

    match cli.command {
        Commands::Sync(args) => {
            config.validate()?;
            let client_id = config.load_client_id()?;
            config.ensure_dirs()?;
            let transport = ReqwestTransport::new(config.request_timeout(), &config.user_agent)
                .context("Failed to create HTTP client")?;
            let pipeline = Pipeline::from_config(&config, transport, &client_id)?;
            let report = run_pipeline(&pipeline, cli.quiet || args.output != OutputFormat::Text)?;
            print_report(&report, args.output, color)?;
            Ok(report.exit_code())
        }
        Commands::Check(args) => {
            config.validate()?;
            let pipeline: Pipeline<ReqwestTransport> = Pipeline::offline(
                MetadataStore::new(config.store_path()?),
                config.images_dir()?,
            );
            let report = run_pipeline(&pipeline, cli.quiet || args.output != OutputFormat::Text)?;
            print_report(&report, args.output, color)?;
            Ok(report.exit_code())
        }
        Commands::Info(args) => {
            config.validate_request_timeout()?;
            let client_id = config.load_client_id()?;
            let transport = ReqwestTransport::new(config.request_timeout(), &config.user_agent)
                .context("Failed to create HTTP client")?;
            let client = CatalogClient::new(
                transport,
                config.api_base_url.clone(),
                config.account_name.clone(),
                client_id,
            );
            let record = client
                .fetch_image_info(&args.id)
                .with_context(|| format!("Failed to fetch image info for {}", args.id))?;
            let json = serde_json::to_string_pretty(&record)?;
            writeln!(io::stdout(), "{json}")?;
            Ok(ExitCode::Success)
        }
    }
}

fn run_pipeline(pipeline: &Pipeline<ReqwestTransport>, quiet: bool) -> Result<SyncReport> {
    let shutdown = signal::install_handler()?;
    let progress = Progress::new(quiet);
    let report = pipeline
        .run(&progress, &shutdown)
        .context("Sync failed")?;
    Ok(report)
}

fn print_report(report: &SyncReport, format: OutputFormat, color: bool) -> Result<()> {
    let stdout = io::stdout();
    let handle = stdout.lock();
    match format {
        OutputFormat::Text => TextOutput::new(report, color).write_to(handle)?,
        OutputFormat::Json => JsonOutput::new(report).write_to(handle)?,
        OutputFormat::Csv => CsvOutput::new(&report.groups).write_to(handle)?,
    }
    Ok(())
}
