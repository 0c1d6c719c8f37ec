use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Startup configuration failures. All of them are fatal.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid option: {0}")]
    InvalidOption(String),

    #[error("Option {0} requires a value")]
    MissingValue(String),

    #[error("Invalid port '{0}'")]
    InvalidPort(String),

    #[error("Invalid chunk size '{0}': expected a positive number of bytes")]
    InvalidChunkSize(String),

    #[error("File not found: {}", .0.display())]
    MissingFile(PathBuf),

    #[error("Failed to read {}: {source}", .path.display())]
    ReadFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        assert_eq!(
            ConfigError::MissingFile(PathBuf::from("/tmp/x.bin")).to_string(),
            "File not found: /tmp/x.bin"
        );
        assert_eq!(
            ConfigError::MissingValue("--port".to_string()).to_string(),
            "Option --port requires a value"
        );
    }
}
