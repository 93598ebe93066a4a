use crate::error::{ClimaFetchError, Result};
use crate::manifest::{ManifestEntry, ManifestReader};
use crate::remote::RemoteSource;
use crate::snapshot::DirectorySnapshot;
use crate::ui::GracefulShutdown;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// What happened to a single manifest line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchEvent {
    /// The file was already in the directory snapshot.
    Skipped { sequence: usize, filename: String },
    /// A transfer is about to start.
    Fetching { sequence: usize, filename: String },
    /// The body was written to disk.
    Saved {
        sequence: usize,
        filename: String,
        bytes: u64,
    },
}

impl FetchEvent {
    pub fn sequence(&self) -> usize {
        match self {
            FetchEvent::Skipped { sequence, .. }
            | FetchEvent::Fetching { sequence, .. }
            | FetchEvent::Saved { sequence, .. } => *sequence,
        }
    }
}

#[derive(Debug, Clone)]
pub struct FetchProgress {
    pub lines_processed: usize,
    pub files_saved: usize,
    pub files_skipped: usize,
    pub bytes_written: u64,
    pub saved: Vec<ManifestEntry>,
    pub start_time: Instant,
}

impl FetchProgress {
    pub fn new() -> Self {
        Self {
            lines_processed: 0,
            files_saved: 0,
            files_skipped: 0,
            bytes_written: 0,
            saved: Vec::new(),
            start_time: Instant::now(),
        }
    }

    fn record_skipped(&mut self) {
        self.lines_processed += 1;
        self.files_skipped += 1;
    }

    fn record_saved(&mut self, entry: ManifestEntry, bytes: u64) {
        self.lines_processed += 1;
        self.files_saved += 1;
        self.bytes_written += bytes;
        self.saved.push(entry);
    }

    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FetchReport {
    pub manifest: PathBuf,
    pub directory: PathBuf,
    pub source: String,
    pub started_at: DateTime<Utc>,
    pub lines_processed: usize,
    pub files_saved: usize,
    pub files_skipped: usize,
    pub bytes_written: u64,
    pub duration: Duration,
    pub saved: Vec<ManifestEntry>,
}

type EventCallback = Box<dyn Fn(&FetchEvent) + Send + Sync>;

/// Walks the manifest once, downloading every file missing from the snapshot.
pub struct Fetcher<S: RemoteSource> {
    directory: PathBuf,
    snapshot: DirectorySnapshot,
    source: S,
    observer: Option<EventCallback>,
    shutdown: Option<GracefulShutdown>,
}

impl<S: RemoteSource> Fetcher<S> {
    pub fn new<P: Into<PathBuf>>(directory: P, snapshot: DirectorySnapshot, source: S) -> Self {
        Self {
            directory: directory.into(),
            snapshot,
            source,
            observer: None,
            shutdown: None,
        }
    }

    pub fn with_observer<F>(mut self, callback: F) -> Self
    where
        F: Fn(&FetchEvent) + Send + Sync + 'static,
    {
        self.observer = Some(Box::new(callback));
        self
    }

    pub fn with_shutdown(mut self, shutdown: GracefulShutdown) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    /// Processes the manifest and closes the source whether or not the pass
    /// succeeded. A failure to close after an error is logged, and the
    /// original error is returned.
    pub fn run<P: AsRef<Path>>(&mut self, manifest: P) -> Result<FetchReport> {
        let manifest = manifest.as_ref();
        let started_at = Utc::now();

        info!(manifest = %manifest.display(), "reading manifest");

        let progress = match self.process(manifest) {
            Ok(progress) => progress,
            Err(e) => {
                if let Err(close_err) = self.source.finish() {
                    warn!(error = %close_err, "failed to close remote source after error");
                }
                return Err(e);
            }
        };

        self.source.finish()?;

        info!(
            saved = progress.files_saved,
            skipped = progress.files_skipped,
            "manifest complete"
        );

        Ok(FetchReport {
            manifest: manifest.to_path_buf(),
            directory: self.directory.clone(),
            source: self.source.locate(""),
            started_at,
            lines_processed: progress.lines_processed,
            files_saved: progress.files_saved,
            files_skipped: progress.files_skipped,
            bytes_written: progress.bytes_written,
            duration: progress.elapsed(),
            saved: progress.saved,
        })
    }

    fn process(&mut self, manifest: &Path) -> Result<FetchProgress> {
        let mut progress = FetchProgress::new();

        for entry in ManifestReader::open(manifest)? {
            if let Some(ref shutdown) = self.shutdown {
                shutdown.check_shutdown()?;
            }

            let entry = entry?;

            if self.snapshot.contains(&entry.filename) {
                debug!(sequence = entry.sequence, file = %entry.filename, "already present");
                progress.record_skipped();
                self.notify(FetchEvent::Skipped {
                    sequence: entry.sequence,
                    filename: entry.filename,
                });
                continue;
            }

            let bytes = self.fetch_entry(&entry)?;
            progress.record_saved(entry, bytes);
        }

        Ok(progress)
    }

    fn fetch_entry(&mut self, entry: &ManifestEntry) -> Result<u64> {
        validate_filename(&entry.filename)?;

        self.notify(FetchEvent::Fetching {
            sequence: entry.sequence,
            filename: entry.filename.clone(),
        });
        debug!(url = %self.source.locate(&entry.filename), "fetching");

        let body = self.source.fetch(&entry.filename)?;

        // Written only once the whole body is in memory
        let dest = self.directory.join(&entry.filename);
        fs::write(&dest, &body)?;
        let bytes = body.len() as u64;

        info!(sequence = entry.sequence, path = %dest.display(), bytes, "saved");
        self.notify(FetchEvent::Saved {
            sequence: entry.sequence,
            filename: entry.filename.clone(),
            bytes,
        });

        Ok(bytes)
    }

    fn notify(&self, event: FetchEvent) {
        if let Some(ref callback) = self.observer {
            callback(&event);
        }
    }
}

/// Manifest entries that a run would download, without touching the network.
pub fn plan<P: AsRef<Path>>(
    manifest: P,
    snapshot: &DirectorySnapshot,
) -> Result<Vec<ManifestEntry>> {
    let mut pending = Vec::new();

    for entry in ManifestReader::open(manifest)? {
        let entry = entry?;
        if !snapshot.contains(&entry.filename) {
            validate_filename(&entry.filename)?;
            pending.push(entry);
        }
    }

    Ok(pending)
}

/// Manifest tokens become file names inside the target directory, so they
/// must not carry directory components.
pub fn validate_filename(name: &str) -> Result<()> {
    if name == "." || name == ".." {
        return Err(ClimaFetchError::InvalidPath {
            path: format!("Directory traversal not allowed: {}", name),
        });
    }

    if name.contains('/') || name.contains('\\') {
        return Err(ClimaFetchError::InvalidPath {
            path: format!("File name contains a path separator: {}", name),
        });
    }

    if name.chars().any(|c| c.is_control()) {
        return Err(ClimaFetchError::InvalidPath {
            path: format!("File name contains control characters: {:?}", name),
        });
    }

    Ok(())
}
