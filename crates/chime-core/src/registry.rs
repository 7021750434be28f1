//! The command registry and routing-key resolution.
//!
//! The registry is assembled once at startup from every feature module's
//! descriptors and is read-only afterwards. Command-shaped envelopes resolve
//! by exact declaration name (per command type); component and modal
//! envelopes resolve by segment 0 of their compact identifier against each
//! descriptor's routing key. A miss is `None`, never an error.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info};

use crate::command::CommandDescriptor;
use crate::custom_id::{self, CustomId};
use crate::error::CoreError;
use crate::interaction::{CommandType, Interaction, InteractionData};

/// Immutable set of registered commands with lookup indices.
///
/// # Examples
///
/// ```
/// use chime_core::{CommandDescriptor, CommandType, Declaration, Registry};
///
/// let registry = Registry::new(vec![
///     CommandDescriptor::new("ping").declare(Declaration::chat("ping", "Pong!")),
///     CommandDescriptor::new("share").custom_key("share"),
/// ])
/// .unwrap();
///
/// assert!(registry.by_name("ping", CommandType::ChatInput).is_some());
/// assert!(registry.by_custom_id("share-twitter-1").is_some());
/// assert!(registry.by_name("pin", CommandType::ChatInput).is_none());
/// ```
#[derive(Debug, Default)]
pub struct Registry {
    commands: Vec<Arc<CommandDescriptor>>,
    names: HashMap<(CommandType, String), usize>,
    keys: HashMap<String, usize>,
}

impl Registry {
    /// Builds the registry and its indices.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Registry` if two declarations of the same command
    /// type share a name, two descriptors share a routing key, or a routing
    /// key could never be addressed by a compact identifier.
    pub fn new(commands: Vec<CommandDescriptor>) -> Result<Self, CoreError> {
        let mut registry = Self::default();

        for (index, command) in commands.into_iter().enumerate() {
            for declaration in command.declarations() {
                let slot = (declaration.command_type, declaration.name.clone());
                if registry.names.insert(slot, index).is_some() {
                    return Err(CoreError::Registry(format!(
                        "duplicate {:?} declaration `{}`",
                        declaration.command_type, declaration.name
                    )));
                }
            }

            let key = command.routing_key();
            if let Err(e) = custom_id::validate_key(&key) {
                return Err(CoreError::Registry(format!(
                    "command `{}` has unusable routing key: {e}",
                    command.name()
                )));
            }
            if let Some(previous) = registry.keys.insert(key.clone(), index) {
                return Err(CoreError::Registry(format!(
                    "routing key `{key}` is used by both `{}` and `{}`",
                    registry.commands[previous].name(),
                    command.name()
                )));
            }

            registry.commands.push(Arc::new(command));
        }

        info!(
            commands = registry.commands.len(),
            declarations = registry.names.len(),
            "Command registry built"
        );
        Ok(registry)
    }

    /// Every registered command, in registration order.
    pub fn commands(&self) -> &[Arc<CommandDescriptor>] {
        &self.commands
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Looks up a command by one of its declared names.
    pub fn by_name(&self, name: &str, command_type: CommandType) -> Option<&Arc<CommandDescriptor>> {
        self.names
            .get(&(command_type, name.to_string()))
            .map(|&i| &self.commands[i])
    }

    /// Looks up a command by segment 0 of a compact identifier.
    pub fn by_custom_id(&self, custom_id: &str) -> Option<&Arc<CommandDescriptor>> {
        let parsed = CustomId::parse(custom_id).ok()?;
        self.keys.get(parsed.key()).map(|&i| &self.commands[i])
    }

    /// Resolves the command an interaction is addressed to.
    pub fn resolve(&self, interaction: &Interaction) -> Option<&Arc<CommandDescriptor>> {
        let found = match &interaction.data {
            InteractionData::Ping => None,
            InteractionData::Command(c) => self.by_name(&c.name, c.command_type),
            InteractionData::Component(c) => self.by_custom_id(&c.custom_id),
            InteractionData::Modal(m) => self.by_custom_id(&m.custom_id),
        };
        if found.is_none() {
            debug!(
                routing_key = interaction.routing_key().unwrap_or_default(),
                "No command matches routing key"
            );
        }
        found
    }

    /// Renders every declaration as the platform's bulk-overwrite payload.
    pub fn declarations(&self) -> Value {
        Value::Array(
            self.commands
                .iter()
                .flat_map(|c| c.declarations().iter().map(|d| d.to_json()))
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::command::Declaration;
    use crate::interaction::classify;

    fn registry() -> Registry {
        Registry::new(vec![
            CommandDescriptor::new("profile")
                .declare(Declaration::chat("profile", "Show a profile"))
                .declare(Declaration::user("Profile")),
            CommandDescriptor::new("share").custom_key("share"),
            CommandDescriptor::new("Emoji Steal"),
        ])
        .expect("registry")
    }

    fn interaction(value: Value) -> Interaction {
        classify(&serde_json::to_vec(&value).expect("json")).expect("classify")
    }

    #[test]
    fn test_should_resolve_primary_and_secondary_declarations() {
        let r = registry();
        let slash = r.by_name("profile", CommandType::ChatInput).expect("slash");
        let menu = r.by_name("Profile", CommandType::User).expect("menu");
        assert!(Arc::ptr_eq(slash, menu));
        assert!(r.by_name("Profile", CommandType::ChatInput).is_none());
        assert!(r.by_name("profile", CommandType::Message).is_none());
    }

    #[test]
    fn test_should_not_prefix_match() {
        let r = registry();
        assert!(r.by_name("prof", CommandType::ChatInput).is_none());
        assert!(r.by_custom_id("sharex-1").is_none());
        assert!(r.by_custom_id("shar").is_none());
    }

    #[test]
    fn test_should_resolve_custom_ids_by_key_or_normalized_name() {
        let r = registry();
        assert_eq!(r.by_custom_id("share-twitter-1").map(|c| c.name()), Some("share"));
        assert_eq!(r.by_custom_id("emojisteal-42").map(|c| c.name()), Some("Emoji Steal"));
        assert!(r.by_custom_id("").is_none());
    }

    #[test]
    fn test_should_resolve_every_interaction_kind() {
        let r = registry();
        let cmd = interaction(json!({
            "id": "1", "application_id": "a", "type": 2, "user": {"id": "u"},
            "data": {"name": "profile", "type": 1}
        }));
        assert_eq!(r.resolve(&cmd).map(|c| c.name()), Some("profile"));

        let auto = interaction(json!({
            "id": "1", "application_id": "a", "type": 4, "user": {"id": "u"},
            "data": {"name": "profile", "type": 1, "options": []}
        }));
        assert_eq!(r.resolve(&auto).map(|c| c.name()), Some("profile"));

        let component = interaction(json!({
            "id": "1", "application_id": "a", "type": 3, "user": {"id": "u"},
            "data": {"custom_id": "share-link-9", "component_type": 2}
        }));
        assert_eq!(r.resolve(&component).map(|c| c.name()), Some("share"));

        let modal = interaction(json!({
            "id": "1", "application_id": "a", "type": 5, "user": {"id": "u"},
            "data": {"custom_id": "emojisteal", "components": []}
        }));
        assert_eq!(r.resolve(&modal).map(|c| c.name()), Some("Emoji Steal"));
    }

    #[test]
    fn test_should_return_none_for_unknown_keys() {
        let r = registry();
        let unknown = interaction(json!({
            "id": "1", "application_id": "a", "type": 2, "user": {"id": "u"},
            "data": {"name": "nope"}
        }));
        assert!(r.resolve(&unknown).is_none());
    }

    #[test]
    fn test_should_reject_duplicate_declarations() {
        let result = Registry::new(vec![
            CommandDescriptor::new("a").declare(Declaration::chat("same", "x")),
            CommandDescriptor::new("b").declare(Declaration::chat("same", "y")),
        ]);
        assert!(matches!(result, Err(CoreError::Registry(_))));
    }

    #[test]
    fn test_should_allow_same_name_across_command_types() {
        let result = Registry::new(vec![
            CommandDescriptor::new("a").declare(Declaration::chat("info", "x")),
            CommandDescriptor::new("b").declare(Declaration::message("info")),
        ]);
        assert!(result.is_ok());
    }

    #[test]
    fn test_should_reject_duplicate_routing_keys() {
        let result = Registry::new(vec![
            CommandDescriptor::new("poll"),
            CommandDescriptor::new("Poll"),
        ]);
        let err = result.unwrap_err().to_string();
        assert!(err.contains("poll"));
    }

    #[test]
    fn test_should_reject_unaddressable_routing_key() {
        let result = Registry::new(vec![CommandDescriptor::new("x").custom_key("a-b")]);
        assert!(matches!(result, Err(CoreError::Registry(_))));

        let result = Registry::new(vec![CommandDescriptor::new("x").custom_key("50%")]);
        assert!(matches!(result, Err(CoreError::Registry(_))));
        assert!(CustomId::new("50%").is_err());
    }

    #[test]
    fn test_should_render_declarations_payload() {
        let payload = registry().declarations();
        let names: Vec<&str> = payload
            .as_array()
            .expect("array")
            .iter()
            .filter_map(|d| d["name"].as_str())
            .collect();
        assert_eq!(names, ["profile", "Profile"]);
    }
}
