use crate::error::{ClimaFetchError, Result};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Ctrl+C aware run flag, shared between the CLI and the blocking fetch pass.
///
/// The first interrupt lets the file in flight finish and stops before the
/// next manifest line; a second one exits immediately with status 130.
#[derive(Clone)]
pub struct GracefulShutdown {
    interrupts: Arc<AtomicUsize>,
}

impl GracefulShutdown {
    pub fn new() -> Result<Self> {
        let shutdown = Self::detached();
        let interrupts = shutdown.interrupts.clone();

        ctrlc::set_handler(move || {
            if interrupts.fetch_add(1, Ordering::SeqCst) == 0 {
                eprintln!("\nStopping after the current file... (press Ctrl+C again to force exit)");
            } else {
                eprintln!("\nForce stopping...");
                std::process::exit(130);
            }
        })
        .map_err(|e| ClimaFetchError::Config {
            message: format!("Failed to set signal handler: {}", e),
        })?;

        Ok(shutdown)
    }

    fn detached() -> Self {
        Self {
            interrupts: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// No signal handler is installed, so tests can create as many as they like.
    #[cfg(test)]
    pub fn new_for_test() -> Self {
        Self::detached()
    }

    pub fn is_running(&self) -> bool {
        self.interrupts.load(Ordering::SeqCst) == 0
    }

    pub fn check_shutdown(&self) -> Result<()> {
        if !self.is_running() {
            return Err(ClimaFetchError::Cancelled);
        }
        Ok(())
    }

    #[cfg(test)]
    pub fn request_shutdown(&self) {
        self.interrupts.fetch_add(1, Ordering::SeqCst);
    }
}
