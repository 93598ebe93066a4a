use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClimaFetchError {
    #[error("FTP operation failed: {message}")]
    Ftp {
        message: String,
        #[source]
        source: suppaftp::FtpError,
    },

    #[error("IO operation failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid FTP URL: {url}")]
    InvalidUrl { url: String },

    #[error("Network error occurred")]
    NetworkError { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Malformed manifest entry on line {line}")]
    MalformedEntry { line: usize },

    #[error("Path validation failed: {path}")]
    InvalidPath { path: String },

    #[error("Download worker stopped unexpectedly: {message}")]
    Worker { message: String },

    #[error("Operation was cancelled by user")]
    Cancelled,
}

pub trait UserFriendlyError {
    fn user_message(&self) -> String;
    fn suggestion(&self) -> Option<String>;
}

impl UserFriendlyError for ClimaFetchError {
    fn user_message(&self) -> String {
        match self {
            ClimaFetchError::Ftp { message, .. } => {
                format!("FTP transfer failed: {}", message)
            }
            ClimaFetchError::Io(e) => {
                format!("File operation failed: {}", e)
            }
            ClimaFetchError::InvalidUrl { url } => {
                format!("Invalid FTP URL: {}", url)
            }
            ClimaFetchError::NetworkError { message } => {
                format!("Network error: {}", message)
            }
            ClimaFetchError::Config { message } => {
                format!("Configuration error: {}", message)
            }
            ClimaFetchError::MalformedEntry { line } => {
                format!("Manifest line {} does not name a file", line)
            }
            ClimaFetchError::InvalidPath { path } => {
                format!("Refusing to write outside the target directory: {}", path)
            }
            ClimaFetchError::Worker { message } => {
                format!("Download worker stopped unexpectedly: {}", message)
            }
            ClimaFetchError::Cancelled => "Operation was cancelled by user".to_string(),
        }
    }

    fn suggestion(&self) -> Option<String> {
        match self {
            ClimaFetchError::InvalidUrl { .. } => Some(
                "The URL prefix must look like ftp://host/path/ and end with a slash.".to_string(),
            ),
            ClimaFetchError::NetworkError { .. } => Some(
                "Check your internet connection and try again. Files saved so far are kept and will be skipped on the next run.".to_string(),
            ),
            ClimaFetchError::Ftp { .. } => Some(
                "Verify that the file still exists on the server. Re-running resumes with the files that are still missing.".to_string(),
            ),
            ClimaFetchError::Io(e) if e.kind() == std::io::ErrorKind::NotFound => Some(
                "Check that the storage directory and the manifest exist, or point at them with --directory and --manifest.".to_string(),
            ),
            ClimaFetchError::Config { .. } => Some(
                "Check your configuration file syntax or regenerate one with --generate-config.".to_string(),
            ),
            ClimaFetchError::MalformedEntry { .. } => Some(
                "Remove blank lines from the manifest; every line must end with a file name.".to_string(),
            ),
            ClimaFetchError::InvalidPath { .. } => Some(
                "Manifest entries must be plain file names without directory components.".to_string(),
            ),
            _ => None,
        }
    }
}

impl From<suppaftp::FtpError> for ClimaFetchError {
    fn from(error: suppaftp::FtpError) -> Self {
        match error {
            suppaftp::FtpError::ConnectionError(e) => ClimaFetchError::NetworkError {
                message: e.to_string(),
            },
            other => ClimaFetchError::Ftp {
                message: other.to_string(),
                source: other,
            },
        }
    }
}

pub type Result<T> = std::result::Result<T, ClimaFetchError>;
