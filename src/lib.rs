pub mod cli;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod manifest;
pub mod remote;
pub mod snapshot;
pub mod ui;

#[cfg(test)]
#[path = "../tests/support/fake_ftp.rs"]
pub(crate) mod fake_ftp;

// Public API re-exports
pub use cli::{Cli, OutputFormat};
pub use config::{CliOverrides, Config, SourceConfig, StorageConfig};
pub use error::{ClimaFetchError, Result, UserFriendlyError};

// Core functionality re-exports
pub use fetcher::{FetchEvent, FetchProgress, FetchReport, Fetcher};
pub use manifest::{parse_filename, ManifestEntry, ManifestReader};
pub use remote::{FtpSource, RemoteSource, RemoteUrl};
pub use snapshot::DirectorySnapshot;
pub use ui::{GracefulShutdown, OutputFormatter, OutputMode, ProgressManager};

use std::path::Path;
use tokio::task;

/// Main library interface for ClimaFetch
pub struct ClimaFetch {
    config: Config,
    output_formatter: OutputFormatter,
    progress_manager: ProgressManager,
    shutdown: GracefulShutdown,
}

impl ClimaFetch {
    /// Create a new ClimaFetch instance with the provided configuration
    pub fn new(config: Config, output_mode: OutputMode, verbose: u8, quiet: bool) -> Result<Self> {
        Ok(Self::with_shutdown(
            config,
            output_mode,
            verbose,
            quiet,
            GracefulShutdown::new()?,
        ))
    }

    /// Create a ClimaFetch instance for testing (no signal handler conflicts)
    #[cfg(test)]
    pub fn new_for_test(config: Config, output_mode: OutputMode, verbose: u8, quiet: bool) -> Self {
        Self::with_shutdown(
            config,
            output_mode,
            verbose,
            quiet,
            GracefulShutdown::new_for_test(),
        )
    }

    fn with_shutdown(
        config: Config,
        output_mode: OutputMode,
        verbose: u8,
        quiet: bool,
        shutdown: GracefulShutdown,
    ) -> Self {
        // JSON consumers read stdout; keep the spinner off it
        let show_progress = !quiet && output_mode == OutputMode::Human;

        Self {
            config,
            output_formatter: OutputFormatter::new(output_mode, verbose, quiet),
            progress_manager: ProgressManager::new(show_progress),
            shutdown,
        }
    }

    /// Create ClimaFetch instance from CLI arguments
    pub fn from_cli(cli_args: &Cli) -> Result<Self> {
        let config = cli_args.load_config()?;
        let output_mode = match cli_args.output_format {
            OutputFormat::Human => OutputMode::Human,
            OutputFormat::Json => OutputMode::Json,
            OutputFormat::Plain => OutputMode::Plain,
        };

        Self::new(config, output_mode, cli_args.verbose, cli_args.quiet)
    }

    /// Download every manifest file missing from the target directory over FTP
    pub async fn mirror(&self) -> Result<FetchReport> {
        let url = RemoteUrl::parse(&self.config.source.url_prefix)?;
        let source = FtpSource::new(url).with_timeout(self.config.timeout_duration());
        self.mirror_from(source).await
    }

    /// Run the manifest pass against any remote source
    pub async fn mirror_from<S>(&self, source: S) -> Result<FetchReport>
    where
        S: RemoteSource + 'static,
    {
        self.shutdown.check_shutdown()?;

        let directory = self.config.storage.directory.clone();
        let manifest = self.config.storage.manifest.clone();

        self.output_formatter.start_operation(&format!(
            "Mirroring {} into {}",
            source.locate(""),
            directory.display()
        ));

        let snapshot = DirectorySnapshot::capture(&directory)?;
        self.output_formatter
            .debug(&format!("{} entries already present", snapshot.len()));

        let spinner = self.progress_manager.create_manifest_spinner();
        let observer = {
            let pb = spinner.clone();
            let formatter = self.output_formatter.clone();
            move |event: &FetchEvent| {
                ui::progress::update_manifest_progress(&pb, event);
                if let FetchEvent::Saved {
                    sequence,
                    filename,
                    bytes,
                } = event
                {
                    pb.suspend(|| formatter.saved_file(*sequence, filename, *bytes));
                }
            }
        };

        let mut fetcher = Fetcher::new(directory, snapshot, source)
            .with_observer(observer)
            .with_shutdown(self.shutdown.clone());

        let result = task::spawn_blocking(move || fetcher.run(&manifest))
            .await
            .map_err(|e| ClimaFetchError::Worker {
                message: e.to_string(),
            })?;

        match result {
            Ok(report) => {
                ui::progress::finish_progress_with_summary(
                    &spinner,
                    &format!("Saved {} files", report.files_saved),
                    report.duration,
                );
                Ok(report)
            }
            Err(e) => {
                spinner.abandon();
                Err(e)
            }
        }
    }

    /// Manifest entries that a mirror run would download
    pub fn plan(&self) -> Result<Vec<ManifestEntry>> {
        let snapshot = DirectorySnapshot::capture(&self.config.storage.directory)?;
        fetcher::plan(&self.config.storage.manifest, &snapshot)
    }

    /// Generate sample configuration file
    pub fn generate_sample_config<P: AsRef<Path>>(output_path: P) -> Result<()> {
        Config::default().save_to_file(output_path)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn output_formatter(&self) -> &OutputFormatter {
        &self.output_formatter
    }

    /// Handle error with user-friendly output
    pub fn handle_error(&self, error: &ClimaFetchError) {
        self.output_formatter.print_user_friendly_error(error);
    }
}
