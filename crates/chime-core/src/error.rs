//! Error types for the interaction engine.
//!
//! Defines [`CoreError`] as the primary error type for all operations within
//! `chime-core`, and the [`HandlerError`] alias returned by command runners.

use thiserror::Error;

/// Error type returned by command runners.
///
/// Runners are feature code; they may fail for any reason, so the engine only
/// needs the error to be displayable and loggable.
pub type HandlerError = anyhow::Error;

/// Error type for chime-core operations.
///
/// The first four variants are the protocol-level rejections that the HTTP
/// boundary maps onto fixed status codes; see [`CoreError::status_code`].
///
/// # Examples
///
/// ```
/// use chime_core::CoreError;
///
/// let err = CoreError::UnknownCommand("share".into());
/// assert_eq!(err.status_code(), 400);
/// assert!(err.to_string().contains("share"));
/// ```
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CoreError {
    /// Missing or invalid signature headers, or a stale timestamp.
    #[error("Unauthenticated: {0}")]
    Unauthenticated(&'static str),

    /// The verified body is not a well-formed interaction.
    #[error("Malformed interaction: {0}")]
    MalformedInteraction(String),

    /// No registered command matches the routing key.
    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    /// A private command was invoked by a caller outside the allowlist.
    #[error("Forbidden: caller {caller} may not invoke {command}")]
    Forbidden {
        /// Name of the restricted command.
        command: String,
        /// Id of the rejected caller.
        caller: String,
    },

    /// A reply operation that is not legal for the interaction kind.
    #[error("Reply `{reply}` is not allowed for {kind} interactions")]
    ReplyNotAllowed {
        /// The attempted reply operation.
        reply: &'static str,
        /// The interaction kind being answered.
        kind: &'static str,
    },

    /// A compact identifier could not be built or parsed.
    #[error("Invalid custom id: {0}")]
    InvalidCustomId(String),

    /// The configured verification key is not a valid Ed25519 public key.
    #[error("Invalid verification key: {0}")]
    InvalidKey(String),

    /// The command registry could not be assembled.
    #[error("Registry error: {0}")]
    Registry(String),

    /// A runner failed before producing a response.
    #[error("Handler error: {0}")]
    Handler(String),

    /// An error from a platform REST call.
    #[error("REST error: {0}")]
    Rest(String),

    /// A JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CoreError {
    /// Returns the HTTP status code this error maps to at the webhook boundary.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Unauthenticated(_) => 401,
            Self::MalformedInteraction(_)
            | Self::UnknownCommand(_)
            | Self::InvalidCustomId(_)
            | Self::Json(_) => 400,
            Self::Forbidden { .. } => 403,
            _ => 500,
        }
    }
}
