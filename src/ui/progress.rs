use crate::fetcher::FetchEvent;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

pub struct ProgressManager {
    enabled: bool,
}

impl ProgressManager {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    /// Spinner for the manifest pass; the manifest length is not known up front.
    pub fn create_manifest_spinner(&self) -> ProgressBar {
        if !self.enabled {
            return ProgressBar::hidden();
        }

        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::with_template("{spinner:.green} [{elapsed_precise}] line {pos} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        pb.set_message("Reading manifest...");
        pb.enable_steady_tick(Duration::from_millis(100));
        pb
    }
}

pub fn update_manifest_progress(pb: &ProgressBar, event: &FetchEvent) {
    pb.set_position(event.sequence() as u64);

    match event {
        FetchEvent::Skipped { filename, .. } => pb.set_message(format!("{} (present)", filename)),
        FetchEvent::Fetching { filename, .. } => pb.set_message(format!("downloading {}", filename)),
        FetchEvent::Saved { .. } => {}
    }
}

pub fn finish_progress_with_summary(pb: &ProgressBar, message: &str, duration: Duration) {
    let final_message = format!("{} (completed in {})", message, format_duration(duration));
    pb.finish_with_message(final_message);
}

pub(crate) fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs >= 60 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else if secs > 0 {
        format!("{}s", secs)
    } else {
        format!("{}ms", duration.as_millis())
    }
}
