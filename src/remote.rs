use crate::error::{ClimaFetchError, Result};
use std::net::{SocketAddr, ToSocketAddrs};
use std::time::Duration;
use suppaftp::types::FileType;
use suppaftp::FtpStream;
use tracing::{debug, info};
use url::Url;

const DEFAULT_FTP_PORT: u16 = 21;
const ANONYMOUS_USER: &str = "anonymous";
const ANONYMOUS_PASSWORD: &str = "anonymous@";

/// Somewhere manifest files can be pulled from.
pub trait RemoteSource: Send {
    /// Retrieves the whole body of `filename`.
    fn fetch(&mut self, filename: &str) -> Result<Vec<u8>>;

    /// Human-readable location of `filename`, used in logs and dry runs.
    fn locate(&self, filename: &str) -> String;

    /// Releases any held connection.
    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}

/// A validated `ftp://` URL prefix that file names are appended to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteUrl {
    prefix: String,
    host: String,
    port: u16,
    username: String,
    password: String,
    base_path: String,
}

impl RemoteUrl {
    pub fn parse(prefix: &str) -> Result<Self> {
        let url = Url::parse(prefix).map_err(|_| ClimaFetchError::InvalidUrl {
            url: prefix.to_string(),
        })?;

        if url.scheme() != "ftp" {
            return Err(ClimaFetchError::InvalidUrl {
                url: prefix.to_string(),
            });
        }

        let host = url
            .host_str()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| ClimaFetchError::InvalidUrl {
                url: prefix.to_string(),
            })?
            .to_string();

        let username = match url.username() {
            "" => ANONYMOUS_USER.to_string(),
            user => decode(user, prefix)?,
        };
        let password = match url.password() {
            Some(password) => decode(password, prefix)?,
            None => ANONYMOUS_PASSWORD.to_string(),
        };

        Ok(Self {
            prefix: prefix.to_string(),
            host,
            port: url.port().unwrap_or(DEFAULT_FTP_PORT),
            username,
            password,
            base_path: decode(url.path(), prefix)?,
        })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// `<prefix><filename>`, verbatim.
    pub fn file_url(&self, filename: &str) -> String {
        format!("{}{}", self.prefix, filename)
    }

    /// Splits the server-side path of `filename` into the directory to change
    /// into and the name to retrieve from there.
    pub fn remote_location(&self, filename: &str) -> (String, String) {
        let full = format!("{}{}", self.base_path, filename);
        match full.rfind('/') {
            Some(0) => ("/".to_string(), full[1..].to_string()),
            Some(idx) => (full[..idx].to_string(), full[idx + 1..].to_string()),
            None => ("/".to_string(), full),
        }
    }
}

fn decode(value: &str, prefix: &str) -> Result<String> {
    urlencoding::decode(value)
        .map(|v| v.into_owned())
        .map_err(|_| ClimaFetchError::InvalidUrl {
            url: prefix.to_string(),
        })
}

/// Anonymous (or URL-credentialed) FTP download source.
///
/// The control connection is opened on the first fetch and reused for every
/// later one.
pub struct FtpSource {
    url: RemoteUrl,
    timeout: Duration,
    stream: Option<FtpStream>,
    current_dir: Option<String>,
}

impl FtpSource {
    pub fn new(url: RemoteUrl) -> Self {
        Self {
            url,
            timeout: Duration::from_secs(60),
            stream: None,
            current_dir: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn resolve(&self) -> Result<Vec<SocketAddr>> {
        let addrs: Vec<SocketAddr> = (self.url.host(), self.url.port())
            .to_socket_addrs()
            .map_err(|e| ClimaFetchError::NetworkError {
                message: format!("Failed to resolve {}: {}", self.url.host(), e),
            })?
            .collect();

        if addrs.is_empty() {
            return Err(ClimaFetchError::NetworkError {
                message: format!("No address found for {}", self.url.host()),
            });
        }
        Ok(addrs)
    }

    fn connect(&self) -> Result<FtpStream> {
        let addrs = self.resolve()?;
        info!(host = %self.url.host(), candidates = addrs.len(), "connecting to FTP server");

        let mut stream = connect_any(&addrs, self.timeout)?;
        stream.login(self.url.username.as_str(), self.url.password.as_str())?;
        stream.transfer_type(FileType::Binary)?;

        debug!(user = %self.url.username, "logged in");
        Ok(stream)
    }
}

/// Opens a control connection to the first address that accepts one.
fn connect_any(addrs: &[SocketAddr], timeout: Duration) -> Result<FtpStream> {
    let mut last_error = None;

    for addr in addrs {
        match FtpStream::connect_timeout(*addr, timeout) {
            Ok(stream) => {
                debug!(%addr, "connected");
                return Ok(stream);
            }
            Err(e) => {
                debug!(%addr, error = %e, "connection attempt failed");
                last_error = Some(e);
            }
        }
    }

    Err(match last_error {
        Some(e) => e.into(),
        None => ClimaFetchError::NetworkError {
            message: "No address to connect to".to_string(),
        },
    })
}

impl RemoteSource for FtpSource {
    fn fetch(&mut self, filename: &str) -> Result<Vec<u8>> {
        let stream = match self.stream.take() {
            Some(stream) => stream,
            None => {
                self.current_dir = None;
                self.connect()?
            }
        };
        let stream = self.stream.insert(stream);

        let (dir, name) = self.url.remote_location(filename);
        if self.current_dir.as_deref() != Some(dir.as_str()) {
            stream.cwd(&dir)?;
            self.current_dir = Some(dir);
        }

        let body = stream.retr_as_buffer(&name)?.into_inner();
        debug!(file = %name, bytes = body.len(), "retrieved");
        Ok(body)
    }

    fn locate(&self, filename: &str) -> String {
        self.url.file_url(filename)
    }

    fn finish(&mut self) -> Result<()> {
        if let Some(mut stream) = self.stream.take() {
            self.current_dir = None;
            stream.quit()?;
            debug!(host = %self.url.host(), "closed FTP connection");
        }
        Ok(())
    }
}
