use crate::error::{ClimaFetchError, Result};
use crate::remote::RemoteUrl;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_URL_PREFIX: &str =
    "ftp://ftp-cdc.dwd.de/pub/CDC/observations_germany/climate/hourly/air_temperature/historical/";
pub const DEFAULT_DIRECTORY: &str = "../";
pub const DEFAULT_MANIFEST: &str = "../data.txt";

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub source: SourceConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SourceConfig {
    pub url_prefix: String,
    /// Connect timeout in seconds
    pub timeout: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    pub directory: PathBuf,
    pub manifest: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source: SourceConfig::default(),
            storage: StorageConfig::default(),
        }
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            url_prefix: DEFAULT_URL_PREFIX.to_string(),
            timeout: 60,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from(DEFAULT_DIRECTORY),
            manifest: PathBuf::from(DEFAULT_MANIFEST),
        }
    }
}

impl Config {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ClimaFetchError::Config {
                message: format!("Configuration file not found: {}", path.display()),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| ClimaFetchError::Config {
            message: format!("Failed to read config file {}: {}", path.display(), e),
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| ClimaFetchError::Config {
            message: format!("Failed to parse config file {}: {}", path.display(), e),
        })?;

        Ok(config)
    }

    pub fn load_with_defaults<P: AsRef<Path>>(config_path: Option<P>) -> Result<Self> {
        match config_path {
            Some(path) => Self::load_from_file(path),
            None => {
                let default_paths = ["climafetch.toml", ".climafetch.toml"];

                for default_path in &default_paths {
                    if Path::new(default_path).exists() {
                        return Self::load_from_file(default_path);
                    }
                }

                Ok(Self::default())
            }
        }
    }

    pub fn merge_with_cli_args(&mut self, cli_args: &CliOverrides) {
        if let Some(ref url_prefix) = cli_args.url_prefix {
            self.source.url_prefix = url_prefix.clone();
        }

        if let Some(timeout) = cli_args.timeout {
            self.source.timeout = timeout;
        }

        if let Some(ref directory) = cli_args.directory {
            self.storage.directory = directory.clone();
        }

        if let Some(ref manifest) = cli_args.manifest {
            self.storage.manifest = manifest.clone();
        }
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let content = toml::to_string_pretty(self).map_err(|e| ClimaFetchError::Config {
            message: format!("Failed to serialize config: {}", e),
        })?;

        std::fs::write(path, content).map_err(|e| ClimaFetchError::Config {
            message: format!("Failed to write config file {}: {}", path.display(), e),
        })?;

        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.source.url_prefix.trim().is_empty() {
            return Err(ClimaFetchError::Config {
                message: "URL prefix must not be empty".to_string(),
            });
        }

        RemoteUrl::parse(&self.source.url_prefix)?;

        if self.source.timeout == 0 {
            return Err(ClimaFetchError::Config {
                message: "Connect timeout must be greater than 0".to_string(),
            });
        }

        if self.storage.manifest.as_os_str().is_empty() {
            return Err(ClimaFetchError::Config {
                message: "Manifest path must not be empty".to_string(),
            });
        }

        Ok(())
    }

    pub fn timeout_duration(&self) -> Duration {
        Duration::from_secs(self.source.timeout)
    }
}

#[derive(Debug, Default)]
pub struct CliOverrides {
    pub url_prefix: Option<String>,
    pub timeout: Option<u64>,
    pub directory: Option<PathBuf>,
    pub manifest: Option<PathBuf>,
}

impl CliOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_url_prefix(mut self, url_prefix: Option<String>) -> Self {
        self.url_prefix = url_prefix;
        self
    }

    pub fn with_timeout(mut self, timeout: Option<u64>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_directory(mut self, directory: Option<PathBuf>) -> Self {
        self.directory = directory;
        self
    }

    pub fn with_manifest(mut self, manifest: Option<PathBuf>) -> Self {
        self.manifest = manifest;
        self
    }
}
