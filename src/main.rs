use clap::Parser;
use climafetch::{
    Cli, ClimaFetch, ClimaFetchError, OutputFormatter, OutputMode, RemoteUrl, UserFriendlyError,
};
use std::process;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let exit_code = run().await;
    process::exit(exit_code);
}

async fn run() -> i32 {
    let cli = Cli::parse();

    setup_logging(&cli);

    if cli.generate_config {
        return handle_generate_config(&cli);
    }

    let app = match ClimaFetch::from_cli(&cli) {
        Ok(app) => app,
        Err(e) => {
            print_startup_error(&e);
            return 1;
        }
    };

    if cli.dry_run {
        return handle_dry_run(&app);
    }

    match app.mirror().await {
        Ok(report) => {
            app.output_formatter().print_fetch_report(&report);
            0
        }
        Err(e) => {
            app.handle_error(&e);
            exit_code_for(&e)
        }
    }
}

fn exit_code_for(error: &ClimaFetchError) -> i32 {
    match error {
        ClimaFetchError::Cancelled => 130, // Interrupted (SIGINT)
        ClimaFetchError::InvalidUrl { .. } => 2,
        ClimaFetchError::NetworkError { .. } | ClimaFetchError::Ftp { .. } => 5,
        ClimaFetchError::MalformedEntry { .. } => 6,
        ClimaFetchError::InvalidPath { .. } => 7,
        _ => 1,
    }
}

fn handle_generate_config(cli: &Cli) -> i32 {
    let config_path = cli
        .config
        .as_ref()
        .map(|p| p.to_string_lossy().to_string())
        .unwrap_or_else(|| "climafetch.toml".to_string());

    match ClimaFetch::generate_sample_config(&config_path) {
        Ok(()) => {
            println!("Generated sample configuration file: {}", config_path);
            println!("\nTo use this configuration:");
            println!("  climafetch --config {}", config_path);
            0
        }
        Err(e) => {
            eprintln!("Failed to generate configuration file: {}", e.user_message());
            if let Some(suggestion) = e.suggestion() {
                eprintln!("Suggestion: {}", suggestion);
            }
            1
        }
    }
}

fn handle_dry_run(app: &ClimaFetch) -> i32 {
    let formatter = app.output_formatter();
    let config = app.config();

    formatter.info("DRY RUN MODE - nothing will be downloaded");
    formatter.info(&format!("Manifest:   {}", config.storage.manifest.display()));
    formatter.info(&format!("Directory:  {}", config.storage.directory.display()));
    formatter.info(&format!("URL prefix: {}", config.source.url_prefix));

    let url = match RemoteUrl::parse(&config.source.url_prefix) {
        Ok(url) => url,
        Err(e) => {
            app.handle_error(&e);
            return exit_code_for(&e);
        }
    };

    match app.plan() {
        Ok(pending) => {
            formatter.print_plan(&pending, |name| url.file_url(name));
            if formatter.mode() != OutputMode::Json {
                formatter.success(&format!("{} files would be downloaded", pending.len()));
            }
            0
        }
        Err(e) => {
            app.handle_error(&e);
            exit_code_for(&e)
        }
    }
}

fn print_startup_error(error: &ClimaFetchError) {
    let formatter = OutputFormatter::new(OutputMode::Human, 0, false);
    formatter.print_user_friendly_error(error);
}

fn setup_logging(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_directive()));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
