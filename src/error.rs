//! Error types

use std::path::PathBuf;

/// Errors raised while parsing instance keys, inspecting DSNs or building TLS policies.
///
/// Building a config, duplicating it and rendering its DSN never fail.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid configuration value
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Failed to read a certificate or key file
    #[error("failed to read '{}': {source}", .path.display())]
    Io {
        /// File that could not be read
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// rustls rejected the TLS configuration
    #[error("TLS error: {0}")]
    Tls(#[from] rustls::Error),

    /// String is not a DSN of the form produced by `ConnectionConfig::db_uri`
    #[error("invalid DSN: {0}")]
    InvalidDsn(String),
}

/// Result alias for this crate
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        let err = Error::Config("port out of range".into());
        assert_eq!(err.to_string(), "invalid configuration: port out of range");
    }

    #[test]
    fn test_io_error_display_includes_path() {
        let err = Error::Io {
            path: PathBuf::from("/etc/ssl/ca.pem"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        };
        let msg = err.to_string();
        assert!(msg.contains("/etc/ssl/ca.pem"));
        assert!(msg.contains("missing"));
    }
}
