//! Shared application state for the chime-server.
//!
//! [`AppState`] is the state container passed (as `Arc<AppState>`) to the
//! webhook handler. Everything in it is read-only after startup.

use std::time::Duration;

use chime_core::{Allowlist, Dispatcher, Registry, RestClient, SignatureVerifier};
use tracing::info;

use crate::commands;
use crate::config::ServerConfig;
use crate::error::ServerError;

/// Shared application state, passed as `Arc<AppState>` to all handlers.
#[derive(Debug)]
pub struct AppState {
    dispatcher: Dispatcher,
}

impl AppState {
    /// Creates a new application state around a dispatcher.
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self { dispatcher }
    }

    /// Builds the dispatcher with the built-in commands from configuration.
    ///
    /// # Errors
    ///
    /// Returns `ServerError::Core` if the public key is invalid or the
    /// built-in commands collide in the registry.
    pub fn from_config(config: &ServerConfig, rest: RestClient) -> Result<Self, ServerError> {
        let verifier = SignatureVerifier::from_hex(&config.discord.public_key)?
            .with_tolerance(config.tolerance());
        let registry = Registry::new(commands::builtin())?;
        let allowlist: Allowlist = config.allowlist.iter().cloned().collect();

        info!(
            commands = registry.len(),
            allowlisted = allowlist.len(),
            tolerance_secs = config.tolerance().as_secs(),
            "Dispatcher configured"
        );

        Ok(Self::new(Dispatcher::new(verifier, registry, allowlist, rest)))
    }

    /// Returns the interaction dispatcher.
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Waits for outstanding continuations, up to `timeout`.
    ///
    /// Returns `false` if some were still running when the timeout hit.
    pub async fn drain(&self, timeout: Duration) -> bool {
        let broker = self.dispatcher.broker();
        let in_flight = broker.in_flight();
        if in_flight > 0 {
            info!(in_flight, "Waiting for background continuations");
        }
        tokio::time::timeout(timeout, broker.drain()).await.is_ok()
    }
}
