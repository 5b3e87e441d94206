//! Configuration errors
//!
//! Typed errors for loading the fleet configuration and resolving machines
//! and account credentials from it.

use thiserror::Error;

/// Configuration loading and lookup errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Machine name is not present in the configuration
    #[error("Machine '{name}' not found. Available machines: {}", .available.join(", "))]
    UnknownMachine {
        name: String,
        available: Vec<String>,
    },

    /// Account key is not present in the configuration
    #[error("Token '{0}' not found in configuration")]
    UnknownCredential(String),

    /// Account key is present but its token is empty
    #[error("Token '{0}' is empty")]
    EmptyToken(String),

    /// Account value is not a string
    #[error("Token '{0}' must be a string")]
    InvalidToken(String),

    /// Failed to parse JSON configuration
    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    /// Failed to read configuration file
    #[error("Failed to read config file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl ConfigError {
    /// Create an IO error with path context
    pub fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ConfigError::UnknownMachine {
            name: "nope".to_string(),
            available: vec!["a".to_string(), "b".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "Machine 'nope' not found. Available machines: a, b"
        );
        assert_eq!(
            ConfigError::UnknownCredential("do_token9".to_string()).to_string(),
            "Token 'do_token9' not found in configuration"
        );
    }

    #[test]
    fn test_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err = ConfigError::io("/path/to/config.json", io_err);
        assert!(err.to_string().contains("/path/to/config.json"));
    }
}
