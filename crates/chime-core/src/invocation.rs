//! The value handed to a runner.

use std::sync::Arc;

use crate::broker::Responder;
use crate::interaction::Interaction;
use crate::options::FlatOptions;
use crate::rest::FollowUp;

/// A resolved invocation: everything a runner needs to do its work.
///
/// `respond` answers the pending HTTP request exactly once; `followup` edits
/// the conversation turn afterwards. Everything else is read-only context.
#[derive(Debug, Clone)]
pub struct Invocation {
    /// The original envelope, including its raw JSON.
    pub interaction: Arc<Interaction>,

    /// Name of the resolved command.
    pub command: String,

    /// Name of the runner that was selected.
    pub runner: String,

    /// Flattened options. For modal submissions this holds the submitted
    /// fields keyed by input id.
    pub options: FlatOptions,

    /// Positional arguments from the compact identifier, minus any segment
    /// consumed by sub-identifier dispatch.
    pub args: Vec<String>,

    /// Selected values of a select-menu component.
    pub values: Vec<String>,

    /// Reply operations for the pending response.
    pub respond: Responder,

    /// Token-authenticated operations on this conversation turn.
    pub followup: FollowUp,
}

impl Invocation {
    /// Id of the invoking user.
    pub fn caller(&self) -> &str {
        &self.interaction.caller
    }

    /// Space-joined subcommand path, if the command has one.
    pub fn subcommand(&self) -> Option<&str> {
        self.options.subcommand.as_deref()
    }

    /// Returns positional argument `index` from the compact identifier.
    pub fn arg(&self, index: usize) -> Option<&str> {
        self.args.get(index).map(String::as_str)
    }

    /// Caller's locale, if the platform sent one.
    pub fn locale(&self) -> Option<&str> {
        self.interaction.locale.as_deref()
    }
}
