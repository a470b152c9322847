//! Application configuration management.
//!
//! Settings are layered, lowest priority first:
//!
//! 1. Built-in defaults
//! 2. TOML config file (`--config`, or `config.toml` in the platform config dir)
//! 3. `IMGDUPE_*` environment variables
//! 4. Command-line flags (applied by the caller through [`Overrides`])
//!
//! The resulting [`Config`] is built once at startup and passed by reference
//! to every component.

use std::fs;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::remote::DEFAULT_API_BASE;

/// Prefix for configuration environment variables.
pub const ENV_PREFIX: &str = "IMGDUPE_";

/// Name of the metadata store file inside the account directory.
pub const STORE_FILE_NAME: &str = "images_data.json";

/// Name of the content directory inside the account directory.
pub const IMAGES_DIR_NAME: &str = "images";

/// Where to register an application to obtain a client id.
pub const REGISTER_URL: &str = "https://api.imgur.com/oauth2/addclient";

/// Errors raised while building the configuration.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// The config file or environment could not be parsed.
    #[error("Invalid configuration: {0}")]
    Invalid(#[from] Box<figment::Error>),

    /// No account name was configured.
    #[error("No account name configured. Pass --account or set account_name in the config file.")]
    MissingAccount,

    /// The account name would not stay inside the data directory.
    #[error("Invalid account name {0:?}: it must be a single path component")]
    InvalidAccount(String),

    /// The request timeout is zero.
    #[error("request_timeout_secs must be greater than zero")]
    InvalidTimeout,

    /// No data directory was configured and none could be determined.
    #[error("Could not determine a data directory. Pass --data-dir.")]
    NoDataDir,

    /// The client id file is missing or empty.
    #[error(
        "No client id found in {path}.\nRegister an application at {url} and save its Client ID in \"{path}\"."
    )]
    MissingCredential {
        /// Expected location of the client id
        path: PathBuf,
        /// Registration page
        url: &'static str,
    },

    /// A configured path could not be read or created.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Account whose images are mirrored.
    pub account_name: String,
    /// Root directory for per-account data. `None` uses the platform data dir.
    pub data_dir: Option<PathBuf>,
    /// File holding the API client id.
    pub client_id_file: PathBuf,
    /// API root URL.
    pub api_base_url: String,
    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
    /// User-Agent sent with every request.
    pub user_agent: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            account_name: String::new(),
            data_dir: None,
            client_id_file: PathBuf::from("client-id.txt"),
            api_base_url: DEFAULT_API_BASE.to_string(),
            request_timeout_secs: 30,
            user_agent: format!("imgdupe/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Values given on the command line. `None` leaves the layered value alone.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    /// `--account`
    pub account_name: Option<String>,
    /// `--data-dir`
    pub data_dir: Option<PathBuf>,
    /// `--client-id-file`
    pub client_id_file: Option<PathBuf>,
    /// `--timeout`
    pub request_timeout_secs: Option<u64>,
}

impl Config {
    /// Build the figment for defaults, the config file and the environment.
    ///
    /// If `path` is `None` the default platform config file is used when it
    /// exists.
    #[must_use]
    pub fn figment(path: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        let file = path.map(Path::to_path_buf).or_else(Self::default_config_path);
        if let Some(file) = file {
            figment = figment.merge(Toml::file(file));
        }
        figment.merge(Env::prefixed(ENV_PREFIX))
    }

    /// Load the layered configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if the file or environment holds
    /// values of the wrong type.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config: Config = Self::figment(path).extract().map_err(Box::new)?;
        log::debug!("Configuration loaded: {:?}", config);
        Ok(config)
    }

    /// Apply command-line overrides on top of the loaded values.
    #[must_use]
    pub fn with_overrides(mut self, overrides: Overrides) -> Self {
        if let Some(account) = overrides.account_name {
            self.account_name = account;
        }
        if let Some(dir) = overrides.data_dir {
            self.data_dir = Some(dir);
        }
        if let Some(file) = overrides.client_id_file {
            self.client_id_file = file;
        }
        if let Some(timeout) = overrides.request_timeout_secs {
            self.request_timeout_secs = timeout;
        }
        self
    }

    /// Check the values that have no usable default.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingAccount`], [`ConfigError::InvalidAccount`]
    /// or [`ConfigError::InvalidTimeout`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        let name = self.account_name.trim();
        if name.is_empty() {
            return Err(ConfigError::MissingAccount);
        }
        let mut components = Path::new(name).components();
        let single_normal = matches!(components.next(), Some(Component::Normal(_)))
            && components.next().is_none();
        if !single_normal || name.contains(['/', '\\']) {
            return Err(ConfigError::InvalidAccount(self.account_name.clone()));
        }
        self.validate_request_timeout()
    }

    /// Check only the settings used by API requests.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidTimeout`] for a zero timeout.
    pub fn validate_request_timeout(&self) -> Result<(), ConfigError> {
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::InvalidTimeout);
        }
        Ok(())
    }

    /// Per-request timeout.
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Directory holding the store and content for the configured account.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NoDataDir`] if no data directory is configured
    /// and the platform has none.
    pub fn account_dir(&self) -> Result<PathBuf, ConfigError> {
        let root = match &self.data_dir {
            Some(dir) => dir.clone(),
            None => ProjectDirs::from("com", "imgdupe", "imgdupe")
                .map(|dirs| dirs.data_dir().to_path_buf())
                .ok_or(ConfigError::NoDataDir)?,
        };
        Ok(root.join(&self.account_name))
    }

    /// Content directory for the configured account.
    ///
    /// # Errors
    ///
    /// See [`account_dir`](Self::account_dir).
    pub fn images_dir(&self) -> Result<PathBuf, ConfigError> {
        Ok(self.account_dir()?.join(IMAGES_DIR_NAME))
    }

    /// Metadata store path for the configured account.
    ///
    /// # Errors
    ///
    /// See [`account_dir`](Self::account_dir).
    pub fn store_path(&self) -> Result<PathBuf, ConfigError> {
        Ok(self.account_dir()?.join(STORE_FILE_NAME))
    }

    /// Create the account and content directories if needed.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the directories cannot be determined or created.
    pub fn ensure_dirs(&self) -> Result<(), ConfigError> {
        let images = self.images_dir()?;
        fs::create_dir_all(&images).map_err(|source| ConfigError::Io {
            path: images,
            source,
        })
    }

    /// Read the API client id from [`client_id_file`](Self::client_id_file).
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingCredential`] if the file is missing or
    /// blank, and [`ConfigError::Io`] if it exists but cannot be read.
    pub fn load_client_id(&self) -> Result<String, ConfigError> {
        let missing = || ConfigError::MissingCredential {
            path: self.client_id_file.clone(),
            url: REGISTER_URL,
        };
        match fs::read_to_string(&self.client_id_file) {
            Ok(content) => {
                let id = content.trim();
                if id.is_empty() {
                    Err(missing())
                } else {
                    Ok(id.to_string())
                }
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Err(missing()),
            Err(source) => Err(ConfigError::Io {
                path: self.client_id_file.clone(),
                source,
            }),
        }
    }

    /// Default platform-specific configuration file, if it exists.
    fn default_config_path() -> Option<PathBuf> {
        let dirs = ProjectDirs::from("com", "imgdupe", "imgdupe")?;
        let path = dirs.config_dir().join("config.toml");
        path.exists().then_some(path)
    }
}
