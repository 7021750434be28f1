//! The interaction pipeline.
//!
//! [`Dispatcher::handle`] takes a raw signed request through verification,
//! classification, command resolution, authorization, option flattening,
//! runner selection and the response broker, and returns the single
//! response the webhook should send.

use std::sync::Arc;

use tracing::{info, instrument, warn};

use crate::broker::Broker;
use crate::command::{default_runner_name, defaults};
use crate::custom_id::CustomId;
use crate::error::CoreError;
use crate::gate::Allowlist;
use crate::interaction::{Interaction, InteractionData, InteractionKind, classify};
use crate::invocation::Invocation;
use crate::options::{FlatOptions, flatten};
use crate::registry::Registry;
use crate::resolver::select_runner;
use crate::response::InteractionResponse;
use crate::rest::RestClient;
use crate::verify::SignatureVerifier;

/// Routes interactions to registered command runners.
///
/// Holds only read-only state plus the continuation tracker, so one
/// dispatcher serves any number of concurrent requests.
#[derive(Debug)]
pub struct Dispatcher {
    verifier: SignatureVerifier,
    registry: Registry,
    allowlist: Allowlist,
    rest: RestClient,
    broker: Broker,
}

impl Dispatcher {
    pub fn new(
        verifier: SignatureVerifier,
        registry: Registry,
        allowlist: Allowlist,
        rest: RestClient,
    ) -> Self {
        Self {
            verifier,
            registry,
            allowlist,
            rest,
            broker: Broker::new(),
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// The broker tracking background continuations.
    pub fn broker(&self) -> &Broker {
        &self.broker
    }

    /// Authenticates, parses and dispatches one raw request.
    ///
    /// Returns `Ok(None)` when no runner produced a response.
    ///
    /// # Errors
    ///
    /// - `CoreError::Unauthenticated` before the body is looked at
    /// - `CoreError::MalformedInteraction` for unparseable bodies
    /// - `CoreError::UnknownCommand`, `CoreError::Forbidden` from routing
    /// - `CoreError::Handler` if the runner failed before responding
    pub async fn handle(
        &self,
        signature: Option<&str>,
        timestamp: Option<&str>,
        body: &[u8],
    ) -> Result<Option<InteractionResponse>, CoreError> {
        self.verifier.verify(signature, timestamp, body)?;
        let interaction = classify(body)?;
        self.dispatch(interaction).await
    }

    /// Dispatches an already-verified interaction.
    ///
    /// # Errors
    ///
    /// See [`Dispatcher::handle`].
    #[instrument(
        skip_all,
        fields(
            interaction_id = %interaction.id,
            kind = interaction.kind.as_str(),
            caller = %interaction.caller,
        )
    )]
    pub async fn dispatch(
        &self,
        interaction: Interaction,
    ) -> Result<Option<InteractionResponse>, CoreError> {
        if interaction.kind == InteractionKind::Ping {
            return Ok(Some(InteractionResponse::Pong));
        }

        let command = self.registry.resolve(&interaction).ok_or_else(|| {
            CoreError::UnknownCommand(interaction.routing_key().unwrap_or_default().to_string())
        })?;

        self.allowlist.authorize(command, &interaction.caller)?;

        let (options, args, values, default) = match &interaction.data {
            InteractionData::Ping => return Ok(Some(InteractionResponse::Pong)),
            InteractionData::Command(c) => (
                flatten(&c.options),
                Vec::new(),
                Vec::new(),
                default_runner_name(interaction.kind, c.command_type),
            ),
            InteractionData::Component(c) => (
                FlatOptions::default(),
                CustomId::parse(&c.custom_id)?.into_args(),
                c.values.clone(),
                Some(defaults::COMPONENT),
            ),
            InteractionData::Modal(m) => (
                FlatOptions {
                    values: m.fields.clone(),
                    ..FlatOptions::default()
                },
                CustomId::parse(&m.custom_id)?.into_args(),
                Vec::new(),
                Some(defaults::MODAL),
            ),
        };

        // Subcommand overrides answer the command itself; completion always
        // goes to the autocomplete runner.
        let path = match interaction.kind {
            InteractionKind::Autocomplete => None,
            _ => options.subcommand.as_deref(),
        };
        let Some(choice) = select_runner(command, default, path, args) else {
            warn!(
                command = command.name(),
                subcommand = options.subcommand.as_deref().unwrap_or_default(),
                "No runner for interaction"
            );
            return Ok(None);
        };

        info!(
            command = command.name(),
            runner = choice.name,
            "Dispatching interaction"
        );

        let (respond, pending) = self.broker.open(interaction.kind);
        let followup = self
            .rest
            .followup(&interaction.application_id, &interaction.token);
        let invocation = Invocation {
            interaction: Arc::new(interaction),
            command: command.name().to_string(),
            runner: choice.name,
            options,
            args: choice.args,
            values,
            respond,
            followup,
        };

        self.broker.invoke(&choice.runner, invocation, pending).await
    }
}
