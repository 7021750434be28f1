//! Chime Interaction Engine
//!
//! Dispatch and deferred-response engine for signed webhook interactions
//! (slash commands, context menus, buttons, select menus, modals and
//! autocomplete). A request is authenticated, classified, routed to a
//! registered command, authorized, and handed to a runner that answers it
//! exactly once. The runner may keep working after the answer has been sent,
//! using its follow-up token to edit or extend the conversation turn.
//!
//! # Architecture
//!
//! - [`SignatureVerifier`] checks the Ed25519 signature over `timestamp || body`
//! - [`classify`] turns a verified body into an [`Interaction`]
//! - [`Registry`] resolves commands by declared name or compact-identifier key
//! - [`options::flatten`] collapses nested option trees into [`FlatOptions`]
//! - [`resolver::select_runner`] picks the default or a named runner
//! - [`Allowlist`] gates private commands
//! - [`Broker`] runs the runner, returns its first reply, and tracks the rest
//! - [`Dispatcher`] ties the pipeline together
//! - [`RestClient`] / [`FollowUp`] call the platform's webhook and command APIs

pub mod broker;
pub mod command;
pub mod custom_id;
mod dispatch;
mod error;
mod gate;
pub mod interaction;
mod invocation;
pub mod options;
pub mod registry;
pub mod resolver;
pub mod response;
pub mod rest;
pub mod verify;

pub use broker::{Broker, PendingResponse, Responder};
pub use command::{CommandDescriptor, Declaration, Runner, runner};
pub use custom_id::CustomId;
pub use dispatch::Dispatcher;
pub use error::{CoreError, HandlerError};
pub use gate::Allowlist;
pub use interaction::{CommandType, Interaction, InteractionData, InteractionKind, classify};
pub use invocation::Invocation;
pub use options::FlatOptions;
pub use registry::Registry;
pub use response::{Choice, EPHEMERAL, InteractionResponse, Message, Modal};
pub use rest::{FollowUp, RestClient};
pub use verify::{SIGNATURE_HEADER, SignatureVerifier, TIMESTAMP_HEADER};
