use std::sync::Arc;

use crate::args::{parse_args, OptionSpec, ParsedArgs};
use crate::error::ConfigError;
use crate::multipart::{load_parts, sample_parts, Part};

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 18080;
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// Options understood by the multipart server.
pub const SERVER_OPTIONS: &[OptionSpec] = &[
    OptionSpec::single("host", &["H"]),
    OptionSpec::single("port", &["p"]),
    OptionSpec::multi("files", &["f"]),
    OptionSpec::single("chunk-size", &["c"]),
];

/// Server configuration, fixed for the lifetime of the listener.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Upper bound on a single body write.
    pub chunk_size: usize,
    /// Parts served on every request, in order.
    pub parts: Arc<[Part]>,
}

impl ServerConfig {
    pub fn new(host: impl Into<String>, port: u16, parts: Vec<Part>) -> Self {
        ServerConfig {
            host: host.into(),
            port,
            chunk_size: DEFAULT_CHUNK_SIZE,
            parts: parts.into(),
        }
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// `host:port`, bracketing IPv6 literals.
    pub fn bind_addr(&self) -> String {
        if self.host.contains(':') && !self.host.starts_with('[') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }

    /// Build the configuration from command-line arguments (program name
    /// excluded). Input files are read here, once.
    pub fn from_args(args: &[String]) -> Result<Self, ConfigError> {
        let parsed = parse_args(args, SERVER_OPTIONS)?;
        Self::from_parsed(&parsed)
    }

    fn from_parsed(parsed: &ParsedArgs) -> Result<Self, ConfigError> {
        let host = parsed.get("host").unwrap_or(DEFAULT_HOST);
        let port = match parsed.get("port") {
            Some(value) => value
                .parse::<u16>()
                .map_err(|_| ConfigError::InvalidPort(value.to_string()))?,
            None => DEFAULT_PORT,
        };
        let chunk_size = match parsed.get("chunk-size") {
            Some(value) => value
                .parse::<usize>()
                .ok()
                .filter(|size| *size > 0)
                .ok_or_else(|| ConfigError::InvalidChunkSize(value.to_string()))?,
            None => DEFAULT_CHUNK_SIZE,
        };

        // An empty `--files` behaves like no `--files` at all.
        let files = parsed.values("files");
        let parts = if files.is_empty() {
            sample_parts()
        } else {
            load_parts(files)?
        };

        Ok(ServerConfig::new(host, port, parts).with_chunk_size(chunk_size))
    }
}
