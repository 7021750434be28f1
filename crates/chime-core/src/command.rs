//! Command descriptors and runner functions.
//!
//! A [`CommandDescriptor`] is the immutable record a feature module hands to
//! the registry at startup. It names the command, declares how the platform
//! should present it, and maps runner names to the async functions that
//! handle each kind of interaction addressed to it.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::BoxFuture;
use serde_json::{Value, json};

use crate::error::HandlerError;
use crate::interaction::{CommandType, InteractionKind};
use crate::invocation::Invocation;

/// Future returned by a runner.
pub type RunnerFuture = BoxFuture<'static, Result<(), HandlerError>>;

/// A type-erased handler function.
pub type Runner = Arc<dyn Fn(Invocation) -> RunnerFuture + Send + Sync>;

/// Wraps an async function into a [`Runner`].
pub fn runner<F, Fut>(f: F) -> Runner
where
    F: Fn(Invocation) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), HandlerError>> + Send + 'static,
{
    Arc::new(move |invocation| f(invocation).boxed())
}

/// Reserved runner names, one per interaction shape.
pub mod defaults {
    /// Chat-input (slash) command invocations.
    pub const COMMAND: &str = "command";
    /// User context-menu invocations.
    pub const USER_COMMAND: &str = "user_command";
    /// Message context-menu invocations.
    pub const MESSAGE_COMMAND: &str = "message_command";
    /// Autocomplete requests.
    pub const AUTOCOMPLETE: &str = "autocomplete";
    /// Component interactions.
    pub const COMPONENT: &str = "component";
    /// Modal submissions.
    pub const MODAL: &str = "modal";

    /// Every reserved name. Named runners may not use these.
    pub const RESERVED: [&str; 6] = [
        COMMAND,
        USER_COMMAND,
        MESSAGE_COMMAND,
        AUTOCOMPLETE,
        COMPONENT,
        MODAL,
    ];

    /// Returns `true` if `name` is one of the per-kind default runner names.
    pub fn is_reserved(name: &str) -> bool {
        RESERVED.contains(&name)
    }
}

/// Returns the default runner name for an interaction shape.
///
/// # Examples
///
/// ```
/// use chime_core::command::{default_runner_name, defaults};
/// use chime_core::{CommandType, InteractionKind};
///
/// assert_eq!(
///     default_runner_name(InteractionKind::Command, CommandType::User),
///     Some(defaults::USER_COMMAND)
/// );
/// assert_eq!(default_runner_name(InteractionKind::Ping, CommandType::ChatInput), None);
/// ```
pub fn default_runner_name(kind: InteractionKind, command_type: CommandType) -> Option<&'static str> {
    match (kind, command_type) {
        (InteractionKind::Command, CommandType::ChatInput) => Some(defaults::COMMAND),
        (InteractionKind::Command, CommandType::User) => Some(defaults::USER_COMMAND),
        (InteractionKind::Command, CommandType::Message) => Some(defaults::MESSAGE_COMMAND),
        (InteractionKind::Autocomplete, _) => Some(defaults::AUTOCOMPLETE),
        (InteractionKind::Component, _) => Some(defaults::COMPONENT),
        (InteractionKind::ModalSubmit, _) => Some(defaults::MODAL),
        (InteractionKind::Ping, _) => None,
    }
}

/// How the platform should present one entry point of a command.
#[derive(Debug, Clone, PartialEq)]
pub struct Declaration {
    pub name: String,
    pub command_type: CommandType,
    pub description: String,
    /// Option schema, as the platform's JSON array.
    pub options: Value,
}

impl Declaration {
    /// A chat-input slash command.
    pub fn chat(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            command_type: CommandType::ChatInput,
            description: description.into(),
            options: json!([]),
        }
    }

    /// A user context-menu entry.
    pub fn user(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            command_type: CommandType::User,
            description: String::new(),
            options: json!([]),
        }
    }

    /// A message context-menu entry.
    pub fn message(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            command_type: CommandType::Message,
            ..Self::user(String::new())
        }
    }

    /// Sets the option schema.
    pub fn options(mut self, options: Value) -> Self {
        self.options = options;
        self
    }

    /// Renders the declaration as the platform's command object.
    pub fn to_json(&self) -> Value {
        let mut obj = json!({
            "name": self.name,
            "type": self.command_type.code(),
        });
        if self.command_type == CommandType::ChatInput {
            obj["description"] = json!(self.description);
            obj["options"] = self.options.clone();
        }
        obj
    }
}

/// A registered command.
///
/// # Examples
///
/// ```
/// use chime_core::{CommandDescriptor, Declaration, Invocation, HandlerError, Message};
///
/// async fn pong(inv: Invocation) -> Result<(), HandlerError> {
///     inv.respond.reply(Message::text("pong"))?;
///     Ok(())
/// }
///
/// let ping = CommandDescriptor::new("ping")
///     .declare(Declaration::chat("ping", "Check the bot is alive"))
///     .on_command(pong);
///
/// assert_eq!(ping.routing_key(), "ping");
/// assert!(ping.runner("command").is_some());
/// ```
#[derive(Clone)]
pub struct CommandDescriptor {
    name: String,
    declarations: Vec<Declaration>,
    custom_key: Option<String>,
    private: bool,
    sub_id_dispatch: bool,
    runners: HashMap<String, Runner>,
}

impl fmt::Debug for CommandDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut runners: Vec<&str> = self.runners.keys().map(String::as_str).collect();
        runners.sort_unstable();
        f.debug_struct("CommandDescriptor")
            .field("name", &self.name)
            .field("declarations", &self.declarations)
            .field("custom_key", &self.custom_key)
            .field("private", &self.private)
            .field("sub_id_dispatch", &self.sub_id_dispatch)
            .field("runners", &runners)
            .finish()
    }
}

impl CommandDescriptor {
    /// Starts a descriptor. The name identifies the command in logs and, when
    /// no custom key is set, is normalized into its identifier key.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            declarations: Vec::new(),
            custom_key: None,
            private: false,
            sub_id_dispatch: false,
            runners: HashMap::new(),
        }
    }

    /// Adds a platform declaration (primary or secondary entry point).
    pub fn declare(mut self, declaration: Declaration) -> Self {
        self.declarations.push(declaration);
        self
    }

    /// Sets the explicit key compact identifiers use to address this command.
    pub fn custom_key(mut self, key: impl Into<String>) -> Self {
        self.custom_key = Some(key.into());
        self
    }

    /// Restricts the command to allowlisted callers.
    pub fn private(mut self) -> Self {
        self.private = true;
        self
    }

    /// Lets the first positional identifier argument select a named runner.
    pub fn sub_id_dispatch(mut self) -> Self {
        self.sub_id_dispatch = true;
        self
    }

    /// Registers a runner under `name` (a default name, a subcommand path,
    /// or an identifier segment).
    pub fn on<F, Fut>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(Invocation) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), HandlerError>> + Send + 'static,
    {
        self.runners.insert(name.into(), runner(f));
        self
    }

    /// Registers the chat-input command runner.
    pub fn on_command<F, Fut>(self, f: F) -> Self
    where
        F: Fn(Invocation) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), HandlerError>> + Send + 'static,
    {
        self.on(defaults::COMMAND, f)
    }

    /// Registers the user context-menu runner.
    pub fn on_user_command<F, Fut>(self, f: F) -> Self
    where
        F: Fn(Invocation) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), HandlerError>> + Send + 'static,
    {
        self.on(defaults::USER_COMMAND, f)
    }

    /// Registers the message context-menu runner.
    pub fn on_message_command<F, Fut>(self, f: F) -> Self
    where
        F: Fn(Invocation) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), HandlerError>> + Send + 'static,
    {
        self.on(defaults::MESSAGE_COMMAND, f)
    }

    /// Registers the autocomplete runner.
    pub fn on_autocomplete<F, Fut>(self, f: F) -> Self
    where
        F: Fn(Invocation) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), HandlerError>> + Send + 'static,
    {
        self.on(defaults::AUTOCOMPLETE, f)
    }

    /// Registers the component runner.
    pub fn on_component<F, Fut>(self, f: F) -> Self
    where
        F: Fn(Invocation) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), HandlerError>> + Send + 'static,
    {
        self.on(defaults::COMPONENT, f)
    }

    /// Registers the modal-submit runner.
    pub fn on_modal<F, Fut>(self, f: F) -> Self
    where
        F: Fn(Invocation) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), HandlerError>> + Send + 'static,
    {
        self.on(defaults::MODAL, f)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn declarations(&self) -> &[Declaration] {
        &self.declarations
    }

    pub fn is_private(&self) -> bool {
        self.private
    }

    pub fn supports_sub_id_dispatch(&self) -> bool {
        self.sub_id_dispatch
    }

    /// Returns the runner registered under `name`.
    pub fn runner(&self, name: &str) -> Option<&Runner> {
        self.runners.get(name)
    }

    /// Returns `true` if a non-reserved runner is registered under `name`.
    pub fn has_named_runner(&self, name: &str) -> bool {
        !defaults::is_reserved(name) && self.runners.contains_key(name)
    }

    /// The key segment 0 of a compact identifier must equal to reach this
    /// command: the explicit custom key, or the normalized name.
    pub fn routing_key(&self) -> String {
        self.custom_key
            .clone()
            .unwrap_or_else(|| normalize_name(&self.name))
    }
}

/// Normalizes a command name into an identifier key: lowercase, with
/// whitespace and dashes removed.
pub fn normalize_name(name: &str) -> String {
    name.chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .flat_map(char::to_lowercase)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn noop(_inv: Invocation) -> Result<(), HandlerError> {
        Ok(())
    }

    #[test]
    fn test_should_normalize_names() {
        assert_eq!(normalize_name("Lookup Player"), "lookupplayer");
        assert_eq!(normalize_name("emoji-steal"), "emojisteal");
        assert_eq!(normalize_name("ping"), "ping");
    }

    #[test]
    fn test_should_prefer_explicit_custom_key() {
        let d = CommandDescriptor::new("Share Stats").custom_key("share");
        assert_eq!(d.routing_key(), "share");
        let d = CommandDescriptor::new("Share Stats");
        assert_eq!(d.routing_key(), "sharestats");
    }

    #[test]
    fn test_should_register_runners_by_name() {
        let d = CommandDescriptor::new("share")
            .on_command(noop)
            .on_component(noop)
            .on("twitter", noop);
        assert!(d.runner(defaults::COMMAND).is_some());
        assert!(d.runner(defaults::COMPONENT).is_some());
        assert!(d.has_named_runner("twitter"));
        assert!(!d.has_named_runner(defaults::COMMAND));
        assert!(!d.has_named_runner("missing"));

        let d = CommandDescriptor::new("profile")
            .on_user_command(noop)
            .on_message_command(noop)
            .on_modal(noop);
        assert!(d.runner(defaults::USER_COMMAND).is_some());
        assert!(d.runner(defaults::MESSAGE_COMMAND).is_some());
        assert!(d.runner(defaults::MODAL).is_some());
        assert!(d.runner(defaults::COMMAND).is_none());
    }

    #[test]
    fn test_should_set_flags() {
        let d = CommandDescriptor::new("stats").private().sub_id_dispatch();
        assert!(d.is_private());
        assert!(d.supports_sub_id_dispatch());
        let d = CommandDescriptor::new("ping");
        assert!(!d.is_private());
        assert!(!d.supports_sub_id_dispatch());
    }

    #[test]
    fn test_should_render_declarations() {
        let chat = Declaration::chat("notify", "Manage notifications")
            .options(json!([{"name": "enable", "type": 1}]));
        let json = chat.to_json();
        assert_eq!(json["type"], 1);
        assert_eq!(json["description"], "Manage notifications");
        assert_eq!(json["options"][0]["name"], "enable");

        let user = Declaration::user("Profile").to_json();
        assert_eq!(user, json!({"name": "Profile", "type": 2}));
        let message = Declaration::message("Bookmark").to_json();
        assert_eq!(message, json!({"name": "Bookmark", "type": 3}));
    }

    #[test]
    fn test_should_list_runners_in_debug_output() {
        let d = CommandDescriptor::new("share").on("twitter", noop).on_command(noop);
        let debug = format!("{d:?}");
        assert!(debug.contains("\"command\", \"twitter\""));
    }
}
