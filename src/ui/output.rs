use crate::error::{ClimaFetchError, UserFriendlyError};
use crate::fetcher::FetchReport;
use crate::manifest::ManifestEntry;
use crate::ui::progress::format_duration;
use console::{style, Emoji, Term};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OutputMode {
    Human,
    Json,
    Plain,
}

static CHECKMARK: Emoji = Emoji("✅ ", "✓ ");
static CROSS: Emoji = Emoji("❌ ", "✗ ");
static INFO: Emoji = Emoji("ℹ️  ", "i ");
static ROCKET: Emoji = Emoji("🚀 ", "> ");

/// The per-download progress line.
pub fn saved_line(sequence: usize) -> String {
    format!("Saved file {}", sequence)
}

/// Terminal reporting for a run.
///
/// Stdout of a default run carries nothing but [`saved_line`]s; everything
/// else on stdout needs `-v` (or `--output-format json`), and errors go to
/// stderr.
#[derive(Clone)]
pub struct OutputFormatter {
    mode: OutputMode,
    use_colors: bool,
    verbose_level: u8,
    quiet: bool,
}

impl OutputFormatter {
    pub fn new(mode: OutputMode, verbose: u8, quiet: bool) -> Self {
        let use_colors = mode == OutputMode::Human
            && !quiet
            && Term::stdout().features().colors_supported();

        Self {
            mode,
            use_colors,
            verbose_level: if quiet { 0 } else { verbose },
            quiet,
        }
    }

    pub fn mode(&self) -> OutputMode {
        self.mode
    }

    pub fn success(&self, message: &str) {
        if self.quiet {
            return;
        }
        match self.mode {
            OutputMode::Human if self.use_colors => {
                println!("{}{}", CHECKMARK, style(message).green().bold())
            }
            OutputMode::Human => println!("✓ {}", message),
            OutputMode::Json => self.print_json_message("success", message),
            OutputMode::Plain => println!("SUCCESS: {}", message),
        }
    }

    pub fn error(&self, message: &str) {
        match self.mode {
            OutputMode::Human if self.use_colors => {
                eprintln!("{}{}", CROSS, style(message).red().bold())
            }
            OutputMode::Human => eprintln!("✗ {}", message),
            OutputMode::Json => self.print_json_message("error", message),
            OutputMode::Plain => eprintln!("ERROR: {}", message),
        }
    }

    pub fn info(&self, message: &str) {
        if !self.should_show_message(1) {
            return;
        }
        match self.mode {
            OutputMode::Human if self.use_colors => {
                println!("{}{}", INFO, style(message).cyan())
            }
            OutputMode::Human => println!("i {}", message),
            OutputMode::Json => self.print_json_message("info", message),
            OutputMode::Plain => println!("INFO: {}", message),
        }
    }

    pub fn debug(&self, message: &str) {
        if !self.should_show_message(2) {
            return;
        }
        match self.mode {
            OutputMode::Human if self.use_colors => println!("  {}", style(message).dim()),
            OutputMode::Human => println!("  DEBUG: {}", message),
            OutputMode::Json => self.print_json_message("debug", message),
            OutputMode::Plain => println!("DEBUG: {}", message),
        }
    }

    pub fn start_operation(&self, operation: &str) {
        if !self.should_show_message(1) {
            return;
        }
        match self.mode {
            OutputMode::Human if self.use_colors => {
                println!("{}{}", ROCKET, style(operation).bold())
            }
            OutputMode::Human => println!("> {}", operation),
            OutputMode::Json => self.print_json_message("operation_start", operation),
            OutputMode::Plain => println!("STARTING: {}", operation),
        }
    }

    /// Announces a finished download. Printed even in quiet mode.
    pub fn saved_file(&self, sequence: usize, filename: &str, bytes: u64) {
        match self.mode {
            OutputMode::Json => self.print_json_object(&serde_json::json!({
                "type": "saved",
                "sequence": sequence,
                "file": filename,
                "bytes": bytes,
                "timestamp": chrono::Utc::now().to_rfc3339()
            })),
            _ => println!("{}", saved_line(sequence)),
        }
    }

    pub fn print_user_friendly_error(&self, error: &ClimaFetchError) {
        self.error(&error.user_message());

        let Some(suggestion) = error.suggestion() else {
            return;
        };
        match self.mode {
            OutputMode::Human if self.use_colors => eprintln!(
                "{}{}",
                INFO,
                style(format!("Suggestion: {}", suggestion)).cyan()
            ),
            OutputMode::Human => eprintln!("Suggestion: {}", suggestion),
            OutputMode::Json => self.print_json_object(&serde_json::json!({
                "type": "suggestion",
                "message": suggestion
            })),
            OutputMode::Plain => eprintln!("SUGGESTION: {}", suggestion),
        }
    }

    /// The end-of-run report. JSON consumers always get it; the text
    /// summaries only appear at `-v`.
    pub fn print_fetch_report(&self, report: &FetchReport) {
        match self.mode {
            OutputMode::Json => {
                let json_output =
                    serde_json::to_string_pretty(report).unwrap_or_else(|_| "{}".to_string());
                println!("{}", json_output);
            }
            _ if !self.should_show_message(1) => {}
            OutputMode::Human => self.print_human_summary(report),
            OutputMode::Plain => self.print_plain_summary(report),
        }
    }

    pub fn print_plan(&self, pending: &[ManifestEntry], locate: impl Fn(&str) -> String) {
        if self.mode == OutputMode::Json {
            let entries: Vec<_> = pending
                .iter()
                .map(|e| {
                    serde_json::json!({
                        "sequence": e.sequence,
                        "file": e.filename,
                        "url": locate(&e.filename)
                    })
                })
                .collect();
            self.print_json_object(&serde_json::json!({
                "type": "plan",
                "pending": entries
            }));
            return;
        }

        for entry in pending {
            println!(
                "  [{}] {} <- {}",
                entry.sequence,
                entry.filename,
                locate(&entry.filename)
            );
        }
    }

    fn should_show_message(&self, min_verbose_level: u8) -> bool {
        !self.quiet && self.verbose_level >= min_verbose_level
    }

    fn print_json_message(&self, level: &str, message: &str) {
        self.print_json_object(&serde_json::json!({
            "type": "message",
            "level": level,
            "message": message,
            "timestamp": chrono::Utc::now().to_rfc3339()
        }));
    }

    fn print_json_object(&self, obj: &serde_json::Value) {
        println!(
            "{}",
            serde_json::to_string(obj).unwrap_or_else(|_| "{}".to_string())
        );
    }

    fn print_human_summary(&self, report: &FetchReport) {
        let rule = if self.use_colors {
            style("─".repeat(60)).dim().to_string()
        } else {
            "-".repeat(60)
        };
        let headline = if report.files_saved == 0 {
            "All manifest files already present"
        } else {
            "Download pass completed"
        };

        println!("{}", rule);
        if self.use_colors {
            println!("{} {}", style(headline).green().bold(), CHECKMARK);
        } else {
            println!("✓ {}", headline);
        }
        for (label, value) in summary_rows(report) {
            let value = if self.use_colors {
                style(value).cyan().bold().to_string()
            } else {
                value
            };
            println!("  {:<17}{}", format!("{}:", label), value);
        }
        println!("{}", rule);
    }

    fn print_plain_summary(&self, report: &FetchReport) {
        println!("COMPLETED: Download pass");
        for (label, value) in summary_rows(report) {
            println!("{}: {}", label, value);
        }
    }
}

fn summary_rows(report: &FetchReport) -> [(&'static str, String); 5] {
    [
        ("Manifest lines", report.lines_processed.to_string()),
        ("Files saved", report.files_saved.to_string()),
        ("Already present", report.files_skipped.to_string()),
        ("Bytes written", format_bytes(report.bytes_written)),
        ("Time taken", format_duration(report.duration)),
    ]
}

fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB"];
    let mut size = bytes as f64;
    let mut unit_index = 0;

    while size >= 1024.0 && unit_index < UNITS.len() - 1 {
        size /= 1024.0;
        unit_index += 1;
    }

    if unit_index == 0 {
        format!("{} {}", bytes, UNITS[unit_index])
    } else {
        format!("{:.1} {}", size, UNITS[unit_index])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::path::PathBuf;
    use std::time::Duration;

    fn report() -> FetchReport {
        FetchReport {
            manifest: PathBuf::from("data.txt"),
            directory: PathBuf::from("store"),
            source: "ftp://test.invalid/pub/".to_string(),
            started_at: Utc::now(),
            lines_processed: 3,
            files_saved: 1,
            files_skipped: 2,
            bytes_written: 1536,
            duration: Duration::from_secs(90),
            saved: vec![ManifestEntry {
                sequence: 2,
                filename: "b.txt".to_string(),
            }],
        }
    }

    #[test]
    fn test_saved_line() {
        assert_eq!(saved_line(2), "Saved file 2");
        assert_eq!(saved_line(1041), "Saved file 1041");
    }

    #[test]
    fn test_quiet_mode() {
        let formatter = OutputFormatter::new(OutputMode::Human, 2, true);
        assert_eq!(formatter.verbose_level, 0);
        assert!(formatter.quiet);
        assert!(!formatter.use_colors);
    }

    #[test]
    fn test_summary_needs_verbose() {
        let default_run = OutputFormatter::new(OutputMode::Plain, 0, false);
        assert!(!default_run.should_show_message(1));

        let verbose_run = OutputFormatter::new(OutputMode::Plain, 1, false);
        assert!(verbose_run.should_show_message(1));
    }

    #[test]
    fn test_summary_rows() {
        let rows = summary_rows(&report());
        assert_eq!(rows[0], ("Manifest lines", "3".to_string()));
        assert_eq!(rows[1], ("Files saved", "1".to_string()));
        assert_eq!(rows[3], ("Bytes written", "1.5 KB".to_string()));
        assert_eq!(rows[4], ("Time taken", "1m 30s".to_string()));
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(1536), "1.5 KB");
        assert_eq!(format_bytes(1048576), "1.0 MB");
    }

    #[test]
    fn test_should_show_message() {
        let formatter = OutputFormatter::new(OutputMode::Plain, 1, false);
        assert!(formatter.should_show_message(0));
        assert!(formatter.should_show_message(1));
        assert!(!formatter.should_show_message(2));

        let quiet_formatter = OutputFormatter::new(OutputMode::Plain, 2, true);
        assert!(!quiet_formatter.should_show_message(0));
    }
}
