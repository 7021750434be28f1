//! Interaction envelope parsing and classification.
//!
//! The platform POSTs one JSON object per user action. Its numeric `type`
//! field selects one of five [`InteractionKind`]s, and the shape of `data`
//! depends on that kind. [`classify`] turns an already-verified body into an
//! immutable [`Interaction`] carrying a typed routing payload, the caller id,
//! and the original JSON for handlers that need anything else from it.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::error::CoreError;
use crate::options::CommandOption;

/// The five interaction kinds defined by the platform.
///
/// # Examples
///
/// ```
/// use chime_core::InteractionKind;
///
/// assert_eq!(InteractionKind::from_code(2), Some(InteractionKind::Command));
/// assert_eq!(InteractionKind::from_code(9), None);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InteractionKind {
    /// Endpoint liveness check sent by the platform.
    Ping,
    /// A typed command invocation (slash command or context menu).
    Command,
    /// A click or selection on a previously sent component.
    Component,
    /// A text-completion request for a focused command option.
    Autocomplete,
    /// A submitted modal form.
    ModalSubmit,
}

impl InteractionKind {
    /// Maps a platform type code to a kind.
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(Self::Ping),
            2 => Some(Self::Command),
            3 => Some(Self::Component),
            4 => Some(Self::Autocomplete),
            5 => Some(Self::ModalSubmit),
            _ => None,
        }
    }

    /// Short lowercase name used in logs and errors.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ping => "ping",
            Self::Command => "command",
            Self::Component => "component",
            Self::Autocomplete => "autocomplete",
            Self::ModalSubmit => "modal",
        }
    }

    /// Returns `true` for kinds routed by a compact identifier rather than a
    /// command name.
    pub fn is_identifier_addressed(self) -> bool {
        matches!(self, Self::Component | Self::ModalSubmit)
    }
}

/// Shape of a command: a chat-input slash command or a context menu entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CommandType {
    #[default]
    ChatInput,
    User,
    Message,
}

impl CommandType {
    /// Maps a platform command type code, defaulting unknown codes to chat input.
    pub fn from_code(code: u8) -> Self {
        match code {
            2 => Self::User,
            3 => Self::Message,
            _ => Self::ChatInput,
        }
    }

    /// Returns the platform type code.
    pub fn code(self) -> u8 {
        match self {
            Self::ChatInput => 1,
            Self::User => 2,
            Self::Message => 3,
        }
    }
}

/// Routing payload of command and autocomplete envelopes.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandData {
    pub name: String,
    pub command_type: CommandType,
    pub options: Vec<CommandOption>,
    /// Target user or message id for context menu commands.
    pub target_id: Option<String>,
    /// Platform-resolved users, members, channels, messages and attachments.
    pub resolved: Option<Value>,
}

/// Routing payload of component envelopes.
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentData {
    pub custom_id: String,
    pub component_type: u8,
    /// Selected values for select menus; empty for buttons.
    pub values: Vec<String>,
}

/// Routing payload of modal-submit envelopes.
#[derive(Debug, Clone, PartialEq)]
pub struct ModalData {
    pub custom_id: String,
    /// Submitted text inputs keyed by their custom id.
    pub fields: BTreeMap<String, Value>,
}

/// Kind-specific routing payload.
#[derive(Debug, Clone, PartialEq)]
pub enum InteractionData {
    Ping,
    Command(CommandData),
    Component(ComponentData),
    Modal(ModalData),
}

/// A verified, classified inbound interaction.
#[derive(Debug, Clone)]
pub struct Interaction {
    pub id: String,
    pub application_id: String,
    pub kind: InteractionKind,
    /// Follow-up token for post-response edits of this turn.
    pub token: String,
    /// Id of the invoking user; empty for pings.
    pub caller: String,
    pub channel_id: Option<String>,
    pub guild_id: Option<String>,
    pub locale: Option<String>,
    pub data: InteractionData,
    /// The original request object, unmodified.
    pub raw: Value,
}

impl Interaction {
    /// Returns the key used to find the owning command: the command name for
    /// command-shaped envelopes, the full custom id otherwise.
    pub fn routing_key(&self) -> Option<&str> {
        match &self.data {
            InteractionData::Ping => None,
            InteractionData::Command(c) => Some(&c.name),
            InteractionData::Component(c) => Some(&c.custom_id),
            InteractionData::Modal(m) => Some(&m.custom_id),
        }
    }

    /// Returns the command payload, if this is a command or autocomplete envelope.
    pub fn command(&self) -> Option<&CommandData> {
        match &self.data {
            InteractionData::Command(c) => Some(c),
            _ => None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawInteraction {
    id: String,
    application_id: String,
    #[serde(rename = "type")]
    kind: u8,
    #[serde(default)]
    token: String,
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    member: Option<RawMember>,
    #[serde(default)]
    user: Option<RawUser>,
    #[serde(default)]
    channel_id: Option<String>,
    #[serde(default)]
    guild_id: Option<String>,
    #[serde(default)]
    locale: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawMember {
    user: RawUser,
}

#[derive(Debug, Deserialize)]
struct RawUser {
    id: String,
}

#[derive(Debug, Deserialize)]
struct RawCommandData {
    name: String,
    #[serde(rename = "type", default)]
    command_type: Option<u8>,
    #[serde(default)]
    options: Vec<CommandOption>,
    #[serde(default)]
    target_id: Option<String>,
    #[serde(default)]
    resolved: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct RawComponentData {
    custom_id: String,
    #[serde(default)]
    component_type: u8,
    #[serde(default)]
    values: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RawModalData {
    custom_id: String,
    #[serde(default)]
    components: Vec<RawModalComponent>,
}

/// A modal component: either an action row wrapping inputs, a label wrapping
/// a single input, or an input itself.
#[derive(Debug, Deserialize)]
struct RawModalComponent {
    #[serde(default)]
    custom_id: Option<String>,
    #[serde(default)]
    value: Option<Value>,
    #[serde(default)]
    values: Option<Value>,
    #[serde(default)]
    components: Vec<RawModalComponent>,
    #[serde(default)]
    component: Option<Box<RawModalComponent>>,
}

impl RawModalComponent {
    fn collect_into(self, fields: &mut BTreeMap<String, Value>) {
        if let Some(id) = self.custom_id {
            if let Some(value) = self.value.or(self.values) {
                fields.insert(id, value);
            }
        }
        if let Some(inner) = self.component {
            inner.collect_into(fields);
        }
        for child in self.components {
            child.collect_into(fields);
        }
    }
}

/// Parses a verified request body into an [`Interaction`].
///
/// # Errors
///
/// Returns `CoreError::MalformedInteraction` if the body is not JSON, has an
/// unknown type code, lacks the payload its kind requires, or (for anything
/// but a ping) does not identify the invoking user.
///
/// # Examples
///
/// ```
/// use chime_core::{classify, InteractionKind};
///
/// let body = br#"{"id":"1","application_id":"2","type":1}"#;
/// let interaction = classify(body).unwrap();
/// assert_eq!(interaction.kind, InteractionKind::Ping);
/// ```
pub fn classify(body: &[u8]) -> Result<Interaction, CoreError> {
    let raw: Value = serde_json::from_slice(body)
        .map_err(|e| CoreError::MalformedInteraction(format!("body is not JSON: {e}")))?;
    let envelope: RawInteraction = serde_json::from_value(raw.clone())
        .map_err(|e| CoreError::MalformedInteraction(e.to_string()))?;

    let kind = InteractionKind::from_code(envelope.kind).ok_or_else(|| {
        CoreError::MalformedInteraction(format!("unknown interaction type {}", envelope.kind))
    })?;

    let caller = envelope
        .member
        .map(|m| m.user.id)
        .or(envelope.user.map(|u| u.id))
        .unwrap_or_default();
    if caller.is_empty() && kind != InteractionKind::Ping {
        return Err(CoreError::MalformedInteraction(
            "interaction does not identify its caller".into(),
        ));
    }

    let data = match kind {
        InteractionKind::Ping => InteractionData::Ping,
        InteractionKind::Command | InteractionKind::Autocomplete => {
            let d: RawCommandData = parse_data(envelope.data)?;
            InteractionData::Command(CommandData {
                name: d.name,
                command_type: d.command_type.map(CommandType::from_code).unwrap_or_default(),
                options: d.options,
                target_id: d.target_id,
                resolved: d.resolved,
            })
        }
        InteractionKind::Component => {
            let d: RawComponentData = parse_data(envelope.data)?;
            InteractionData::Component(ComponentData {
                custom_id: d.custom_id,
                component_type: d.component_type,
                values: d.values,
            })
        }
        InteractionKind::ModalSubmit => {
            let d: RawModalData = parse_data(envelope.data)?;
            let mut fields = BTreeMap::new();
            for component in d.components {
                component.collect_into(&mut fields);
            }
            InteractionData::Modal(ModalData {
                custom_id: d.custom_id,
                fields,
            })
        }
    };

    debug!(
        interaction_id = envelope.id,
        kind = kind.as_str(),
        caller,
        "Classified interaction"
    );

    Ok(Interaction {
        id: envelope.id,
        application_id: envelope.application_id,
        kind,
        token: envelope.token,
        caller,
        channel_id: envelope.channel_id,
        guild_id: envelope.guild_id,
        locale: envelope.locale,
        data,
        raw,
    })
}

fn parse_data<T: serde::de::DeserializeOwned>(data: Option<Value>) -> Result<T, CoreError> {
    let data = data.ok_or_else(|| CoreError::MalformedInteraction("missing data".into()))?;
    serde_json::from_value(data).map_err(|e| CoreError::MalformedInteraction(e.to_string()))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn body(value: Value) -> Vec<u8> {
        serde_json::to_vec(&value).expect("serialize")
    }

    #[test]
    fn test_should_classify_ping() {
        let i = classify(&body(json!({"id": "1", "application_id": "9", "type": 1})))
            .expect("classify");
        assert_eq!(i.kind, InteractionKind::Ping);
        assert!(i.routing_key().is_none());
        assert!(i.caller.is_empty());
    }

    #[test]
    fn test_should_classify_guild_command() {
        let i = classify(&body(json!({
            "id": "1", "application_id": "9", "type": 2, "token": "tok",
            "guild_id": "g1", "channel_id": "c1", "locale": "en-GB",
            "member": {"user": {"id": "u42"}},
            "data": {"name": "ping", "type": 1, "options": []}
        })))
        .expect("classify");
        assert_eq!(i.kind, InteractionKind::Command);
        assert_eq!(i.caller, "u42");
        assert_eq!(i.routing_key(), Some("ping"));
        assert_eq!(i.token, "tok");
        assert_eq!(i.locale.as_deref(), Some("en-GB"));
        assert_eq!(i.raw["guild_id"], "g1");
    }

    #[test]
    fn test_should_take_caller_from_user_in_dms() {
        let i = classify(&body(json!({
            "id": "1", "application_id": "9", "type": 2,
            "user": {"id": "u7"},
            "data": {"name": "ping"}
        })))
        .expect("classify");
        assert_eq!(i.caller, "u7");
        assert_eq!(i.command().map(|c| c.command_type), Some(CommandType::ChatInput));
    }

    #[test]
    fn test_should_classify_context_menu_command() {
        let i = classify(&body(json!({
            "id": "1", "application_id": "9", "type": 2,
            "user": {"id": "u7"},
            "data": {"name": "Profile", "type": 2, "target_id": "u99"}
        })))
        .expect("classify");
        let cmd = i.command().expect("command data");
        assert_eq!(cmd.command_type, CommandType::User);
        assert_eq!(cmd.target_id.as_deref(), Some("u99"));
    }

    #[test]
    fn test_should_classify_component_with_values() {
        let i = classify(&body(json!({
            "id": "1", "application_id": "9", "type": 3,
            "user": {"id": "u7"},
            "data": {"custom_id": "poll-3", "component_type": 3, "values": ["a", "b"]}
        })))
        .expect("classify");
        assert_eq!(i.kind, InteractionKind::Component);
        assert_eq!(i.routing_key(), Some("poll-3"));
        match i.data {
            InteractionData::Component(c) => assert_eq!(c.values, ["a", "b"]),
            other => panic!("unexpected data {other:?}"),
        }
    }

    #[test]
    fn test_should_flatten_modal_inputs() {
        let i = classify(&body(json!({
            "id": "1", "application_id": "9", "type": 5,
            "user": {"id": "u7"},
            "data": {"custom_id": "feedback", "components": [
                {"type": 1, "components": [
                    {"type": 4, "custom_id": "subject", "value": "hi"}
                ]},
                {"type": 18, "component": {"type": 3, "custom_id": "mood", "values": ["ok"]}}
            ]}
        })))
        .expect("classify");
        match i.data {
            InteractionData::Modal(m) => {
                assert_eq!(m.custom_id, "feedback");
                assert_eq!(m.fields["subject"], json!("hi"));
                assert_eq!(m.fields["mood"], json!(["ok"]));
            }
            other => panic!("unexpected data {other:?}"),
        }
    }

    #[test]
    fn test_should_reject_non_json_body() {
        assert!(matches!(
            classify(b"nope"),
            Err(CoreError::MalformedInteraction(_))
        ));
    }

    #[test]
    fn test_should_reject_unknown_type() {
        let result = classify(&body(json!({"id": "1", "application_id": "9", "type": 42})));
        assert!(matches!(result, Err(CoreError::MalformedInteraction(_))));
    }

    #[test]
    fn test_should_reject_command_without_data() {
        let result = classify(&body(json!({
            "id": "1", "application_id": "9", "type": 2, "user": {"id": "u"}
        })));
        assert!(matches!(result, Err(CoreError::MalformedInteraction(_))));
    }

    #[test]
    fn test_should_reject_command_without_caller() {
        let result = classify(&body(json!({
            "id": "1", "application_id": "9", "type": 2, "data": {"name": "ping"}
        })));
        assert!(matches!(result, Err(CoreError::MalformedInteraction(_))));
    }
}
