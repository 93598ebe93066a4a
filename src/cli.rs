use crate::config::{CliOverrides, Config};
use crate::error::Result;
use crate::remote::RemoteUrl;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "climafetch")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Mirror historical climate observation files from an FTP archive")]
#[command(
    long_about = "ClimaFetch reads a manifest of file names, compares it against a local \
                  directory and downloads every missing file from the FTP archive, one at a time."
)]
#[command(after_help = "EXAMPLES:\n  \
    climafetch\n  \
    climafetch --directory data/ --manifest data/data.txt\n  \
    climafetch --url-prefix ftp://ftp-cdc.dwd.de/pub/CDC/observations_germany/climate/daily/kl/historical/\n  \
    climafetch --dry-run -v")]
pub struct Cli {
    /// Directory the files are stored in
    #[arg(short, long, env = "CLIMAFETCH_DIRECTORY")]
    pub directory: Option<PathBuf>,

    /// Manifest listing the files to mirror (last token of each line)
    #[arg(short, long, env = "CLIMAFETCH_MANIFEST")]
    pub manifest: Option<PathBuf>,

    /// FTP URL prefix that file names are appended to
    #[arg(short, long, value_parser = validate_ftp_url)]
    pub url_prefix: Option<String>,

    /// Connect timeout in seconds
    #[arg(long, help = "Timeout for connecting to the FTP server (seconds)")]
    pub timeout: Option<u64>,

    /// Configuration file path
    #[arg(short, long, help = "Path to TOML configuration file")]
    pub config: Option<PathBuf>,

    /// Output format for results
    #[arg(long, value_enum, default_value_t = OutputFormat::Human)]
    pub output_format: OutputFormat,

    /// Verbose output level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (only "Saved file N" lines and errors)
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Dry run (list missing files without downloading)
    #[arg(long, help = "Show what would be downloaded without connecting")]
    pub dry_run: bool,

    /// Generate sample configuration file
    #[arg(long, help = "Generate a sample configuration file")]
    pub generate_config: bool,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable colored output
    Human,
    /// JSON formatted output
    Json,
    /// Plain text output
    Plain,
}

impl Cli {
    pub fn load_config(&self) -> Result<Config> {
        let mut config = Config::load_with_defaults(self.config.as_ref())?;

        let overrides = self.create_cli_overrides();
        config.merge_with_cli_args(&overrides);
        config.validate()?;

        Ok(config)
    }

    pub fn create_cli_overrides(&self) -> CliOverrides {
        CliOverrides::new()
            .with_url_prefix(self.url_prefix.clone())
            .with_timeout(self.timeout)
            .with_directory(self.directory.clone())
            .with_manifest(self.manifest.clone())
    }

    pub fn verbosity_level(&self) -> u8 {
        if self.quiet {
            0
        } else {
            self.verbose
        }
    }

    /// Default `tracing` directive for this verbosity when `RUST_LOG` is unset.
    pub fn log_directive(&self) -> &'static str {
        match self.verbosity_level() {
            0 => "climafetch=warn",
            1 => "climafetch=info",
            _ => "climafetch=debug",
        }
    }
}

pub fn validate_ftp_url(s: &str) -> std::result::Result<String, String> {
    RemoteUrl::parse(s)
        .map(|_| s.to_string())
        .map_err(|_| "Expected an ftp:// URL with a host, e.g. ftp://ftp-cdc.dwd.de/pub/CDC/".to_string())
}
