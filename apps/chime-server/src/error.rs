//! Error types for the chime-server application.
//!
//! Defines [`ServerError`] as the error type for startup, configuration and
//! registration. Request-time failures are [`chime_core::CoreError`]s and are
//! mapped to status codes in [`crate::http`].

use thiserror::Error;

/// Error type for chime-server operations.
///
/// # Examples
///
/// ```
/// use chime_server::error::ServerError;
///
/// let err = ServerError::Config("missing public_key".into());
/// assert!(err.to_string().contains("missing public_key"));
/// ```
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ServerError {
    /// A configuration error (missing or invalid config file/values).
    #[error("Config error: {0}")]
    Config(String),

    /// The config file could not be read.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The config file is not valid YAML for [`crate::config::ServerConfig`].
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// An error from `chime-core`.
    #[error(transparent)]
    Core(#[from] chime_core::CoreError),
}
