//! Command-line interface definitions for imgdupe.
//!
//! # Example
//!
//! ```bash
//! # Mirror an account and report duplicate uploads
//! imgdupe sync --account someone
//!
//! # Re-check already downloaded images without touching the network
//! imgdupe check --account someone --output json
//!
//! # Show the remote metadata of one image
//! imgdupe info a1B2c3d
//! ```

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::config::Overrides;

/// Mirror a hosted image account locally and report duplicate uploads.
#[derive(Debug, Parser)]
#[command(name = "imgdupe")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity level (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(
        long,
        global = true,
        env = "NO_COLOR",
        value_parser = clap::builder::FalseyValueParser::new()
    )]
    pub no_color: bool,

    /// Print fatal errors as JSON on stderr
    #[arg(long, global = true)]
    pub json_errors: bool,

    /// Configuration file (TOML)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Fetch the catalog, download missing images, hash them and report duplicates
    Sync(SyncArgs),
    /// Hash local images and report duplicates without any network access
    Check(CheckArgs),
    /// Print the remote metadata of a single image
    Info(InfoArgs),
}

/// Options shared by every subcommand that touches the account data.
#[derive(Debug, Clone, Args)]
pub struct AccountArgs {
    /// Account whose images are mirrored
    #[arg(short, long, value_name = "NAME")]
    pub account: Option<String>,

    /// Root directory for per-account data
    #[arg(long, value_name = "PATH")]
    pub data_dir: Option<PathBuf>,
}

/// Options for subcommands that call the remote API.
#[derive(Debug, Clone, Args)]
pub struct RemoteArgs {
    /// File containing the API client id
    #[arg(long, value_name = "PATH")]
    pub client_id_file: Option<PathBuf>,

    /// Per-request timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,
}

/// Arguments for the sync subcommand.
#[derive(Debug, Args)]
pub struct SyncArgs {
    #[command(flatten)]
    pub account: AccountArgs,

    #[command(flatten)]
    pub remote: RemoteArgs,

    /// Report format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,
}

/// Arguments for the check subcommand.
#[derive(Debug, Args)]
pub struct CheckArgs {
    #[command(flatten)]
    pub account: AccountArgs,

    /// Report format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,
}

/// Arguments for the info subcommand.
#[derive(Debug, Args)]
pub struct InfoArgs {
    /// Image id
    #[arg(value_name = "ID")]
    pub id: String,

    #[command(flatten)]
    pub remote: RemoteArgs,
}

/// Report format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text
    Text,
    /// JSON for scripting
    Json,
    /// CSV for spreadsheets
    Csv,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Csv => write!(f, "csv"),
        }
    }
}

impl Commands {
    /// Configuration overrides given on the command line for this subcommand.
    #[must_use]
    pub fn overrides(&self) -> Overrides {
        let (account, remote) = match self {
            Commands::Sync(args) => (Some(&args.account), Some(&args.remote)),
            Commands::Check(args) => (Some(&args.account), None),
            Commands::Info(args) => (None, Some(&args.remote)),
        };
        Overrides {
            account_name: account.and_then(|a| a.account.clone()),
            data_dir: account.and_then(|a| a.data_dir.clone()),
            client_id_file: remote.and_then(|r| r.client_id_file.clone()),
            request_timeout_secs: remote.and_then(|r| r.timeout),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    /// Parse `args` with `NO_COLOR` set to `value`, restoring it afterwards.
    fn parse_with_no_color(value: &str, args: &[&str]) -> Cli {
        let _lock = ENV_MUTEX.lock().unwrap();
        let previous = std::env::var_os("NO_COLOR");
        std::env::set_var("NO_COLOR", value);
        let result = Cli::try_parse_from(args);
        match previous {
            Some(v) => std::env::set_var("NO_COLOR", v),
            None => std::env::remove_var("NO_COLOR"),
        }
        result.unwrap()
    }

    #[test]
    fn test_no_color_env_accepts_any_value() {
        let cli = parse_with_no_color("1", &["imgdupe", "check", "--account", "x"]);
        assert!(cli.no_color);
        let cli = parse_with_no_color("yes", &["imgdupe", "check", "--account", "x"]);
        assert!(cli.no_color);
    }

    #[test]
    fn test_no_color_env_falsey_values() {
        let cli = parse_with_no_color("0", &["imgdupe", "check", "--account", "x"]);
        assert!(!cli.no_color);
        let cli = parse_with_no_color("false", &["imgdupe", "check", "--account", "x"]);
        assert!(!cli.no_color);
    }

    #[test]
    fn test_no_color_flag() {
        let _lock = ENV_MUTEX.lock().unwrap();
        let cli = Cli::try_parse_from(["imgdupe", "--no-color", "check"]).unwrap();
        assert!(cli.no_color);
    }

    #[test]
    fn test_cli_parse_help() {
        let result = Cli::try_parse_from(["imgdupe", "--help"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_parse_sync_basic() {
        let cli = Cli::try_parse_from(["imgdupe", "sync", "--account", "someone"]).unwrap();
        assert_eq!(cli.verbose, 0);
        match cli.command {
            Commands::Sync(args) => {
                assert_eq!(args.account.account.as_deref(), Some("someone"));
                assert_eq!(args.output, OutputFormat::Text);
            }
            _ => panic!("Expected Sync command"),
        }
    }

    #[test]
    fn test_cli_parse_sync_with_options() {
        let cli = Cli::try_parse_from([
            "imgdupe",
            "-v",
            "--config",
            "imgdupe.toml",
            "sync",
            "-a",
            "someone",
            "--data-dir",
            "/data",
            "--client-id-file",
            "/secrets/cid",
            "--timeout",
            "12",
            "--output",
            "json",
        ])
        .unwrap();

        assert_eq!(cli.verbose, 1);
        assert_eq!(cli.config, Some(PathBuf::from("imgdupe.toml")));
        let overrides = cli.command.overrides();
        assert_eq!(overrides.account_name.as_deref(), Some("someone"));
        assert_eq!(overrides.data_dir, Some(PathBuf::from("/data")));
        assert_eq!(overrides.client_id_file, Some(PathBuf::from("/secrets/cid")));
        assert_eq!(overrides.request_timeout_secs, Some(12));
        match cli.command {
            Commands::Sync(args) => assert_eq!(args.output, OutputFormat::Json),
            _ => panic!("Expected Sync command"),
        }
    }

    #[test]
    fn test_cli_parse_check() {
        let cli = Cli::try_parse_from(["imgdupe", "check", "--output", "csv"]).unwrap();
        match &cli.command {
            Commands::Check(args) => assert_eq!(args.output, OutputFormat::Csv),
            _ => panic!("Expected Check command"),
        }
        let overrides = cli.command.overrides();
        assert!(overrides.client_id_file.is_none());
        assert!(overrides.request_timeout_secs.is_none());
    }

    #[test]
    fn test_cli_parse_info() {
        let cli = Cli::try_parse_from(["imgdupe", "info", "a1B2c3d"]).unwrap();
        match cli.command {
            Commands::Info(args) => assert_eq!(args.id, "a1B2c3d"),
            _ => panic!("Expected Info command"),
        }
    }

    #[test]
    fn test_cli_info_requires_id() {
        assert!(Cli::try_parse_from(["imgdupe", "info"]).is_err());
    }

    #[test]
    fn test_cli_quiet_conflicts_with_verbose() {
        let result = Cli::try_parse_from(["imgdupe", "-v", "-q", "sync"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_invalid_output() {
        let result = Cli::try_parse_from(["imgdupe", "sync", "--output", "html"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_invalid_subcommand() {
        let result = Cli::try_parse_from(["imgdupe", "scan", "/path"]);
        assert!(result.is_err());
    }
}
