//! Interaction response bodies.
//!
//! These are the JSON shapes the webhook returns synchronously. Message
//! content, embeds and components are kept as loosely-typed JSON so that
//! feature code can build whatever the platform accepts.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Message flag marking a reply visible only to the caller.
pub const EPHEMERAL: u64 = 1 << 6;

/// A message body used by immediate replies, updates and follow-ups.
///
/// # Examples
///
/// ```
/// use chime_core::Message;
///
/// let msg = Message::text("pong").ephemeral();
/// let json = serde_json::to_value(&msg).unwrap();
/// assert_eq!(json["content"], "pong");
/// assert_eq!(json["flags"], 64);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Message {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub embeds: Vec<Value>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub components: Vec<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flags: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_mentions: Option<Value>,
}

impl Message {
    /// A plain-text message.
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Self::default()
        }
    }

    /// Adds an embed.
    pub fn embed(mut self, embed: Value) -> Self {
        self.embeds.push(embed);
        self
    }

    /// Adds an action row containing the given components.
    pub fn row(mut self, components: Vec<Value>) -> Self {
        self.components
            .push(json!({ "type": 1, "components": components }));
        self
    }

    /// Marks the message as visible only to the caller.
    pub fn ephemeral(mut self) -> Self {
        self.flags = Some(self.flags.unwrap_or(0) | EPHEMERAL);
        self
    }

    /// Suppresses all mention pings.
    pub fn no_mentions(mut self) -> Self {
        self.allowed_mentions = Some(json!({ "parse": [] }));
        self
    }
}

/// A modal prompt.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Modal {
    pub custom_id: String,
    pub title: String,
    pub components: Vec<Value>,
}

impl Modal {
    /// Creates an empty modal.
    pub fn new(custom_id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            custom_id: custom_id.into(),
            title: title.into(),
            components: Vec::new(),
        }
    }

    /// Adds a short or paragraph text input wrapped in its own action row.
    pub fn text_input(
        mut self,
        custom_id: impl Into<String>,
        label: impl Into<String>,
        paragraph: bool,
    ) -> Self {
        let input = json!({
            "type": 4,
            "custom_id": custom_id.into(),
            "label": label.into(),
            "style": if paragraph { 2 } else { 1 },
        });
        self.components
            .push(json!({ "type": 1, "components": [input] }));
        self
    }
}

/// One autocomplete suggestion.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Choice {
    pub name: String,
    pub value: Value,
}

impl Choice {
    pub fn new(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Maximum suggestions the platform accepts in one autocomplete result.
pub const MAX_CHOICES: usize = 25;

/// The single synchronous response to an interaction.
#[derive(Debug, Clone, PartialEq)]
pub enum InteractionResponse {
    /// Acknowledges a ping.
    Pong,
    /// Replies with a new message.
    Message(Message),
    /// Shows a "thinking" placeholder to be edited later.
    DeferredMessage { ephemeral: bool },
    /// Acknowledges a component without visibly changing anything yet.
    DeferredUpdate,
    /// Edits the message the component is attached to.
    UpdateMessage(Message),
    /// Returns autocomplete suggestions.
    Autocomplete(Vec<Choice>),
    /// Opens a modal.
    Modal(Modal),
}

impl InteractionResponse {
    /// Platform response type code.
    pub fn code(&self) -> u8 {
        match self {
            Self::Pong => 1,
            Self::Message(_) => 4,
            Self::DeferredMessage { .. } => 5,
            Self::DeferredUpdate => 6,
            Self::UpdateMessage(_) => 7,
            Self::Autocomplete(_) => 8,
            Self::Modal(_) => 9,
        }
    }

    /// Short name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Pong => "pong",
            Self::Message(_) => "reply",
            Self::DeferredMessage { .. } => "defer",
            Self::DeferredUpdate => "defer_update",
            Self::UpdateMessage(_) => "update",
            Self::Autocomplete(_) => "autocomplete",
            Self::Modal(_) => "modal",
        }
    }

    /// Renders the wire body.
    pub fn to_json(&self) -> Value {
        let data = match self {
            Self::Pong | Self::DeferredUpdate => None,
            Self::Message(m) | Self::UpdateMessage(m) => serde_json::to_value(m).ok(),
            Self::DeferredMessage { ephemeral } => {
                ephemeral.then(|| json!({ "flags": EPHEMERAL }))
            }
            Self::Autocomplete(choices) => Some(json!({ "choices": choices })),
            Self::Modal(modal) => serde_json::to_value(modal).ok(),
        };
        match data {
            Some(data) => json!({ "type": self.code(), "data": data }),
            None => json!({ "type": self.code() }),
        }
    }
}

impl Serialize for InteractionResponse {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}
