//! Command option trees and their flattening.
//!
//! A command envelope carries its arguments as a tree: zero or more
//! sub-command groups and sub-commands wrap a terminal level of leaf options.
//! [`flatten`] reduces that tree to a space-joined subcommand path and a flat
//! name → value map, which is what runners actually consume.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;

/// Platform option type codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(from = "u8")]
pub enum OptionType {
    SubCommand,
    SubCommandGroup,
    String,
    Integer,
    Boolean,
    User,
    Channel,
    Role,
    Mentionable,
    Number,
    Attachment,
    /// A type code this crate does not know about; treated as a leaf.
    Unknown(u8),
}

impl From<u8> for OptionType {
    fn from(code: u8) -> Self {
        match code {
            1 => Self::SubCommand,
            2 => Self::SubCommandGroup,
            3 => Self::String,
            4 => Self::Integer,
            5 => Self::Boolean,
            6 => Self::User,
            7 => Self::Channel,
            8 => Self::Role,
            9 => Self::Mentionable,
            10 => Self::Number,
            11 => Self::Attachment,
            other => Self::Unknown(other),
        }
    }
}

impl OptionType {
    /// Returns `true` for node types that wrap further options rather than
    /// carrying a value.
    pub fn is_branch(self) -> bool {
        matches!(self, Self::SubCommand | Self::SubCommandGroup)
    }
}

/// One node of a command's option tree as delivered by the platform.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CommandOption {
    pub name: String,

    #[serde(rename = "type")]
    pub kind: OptionType,

    /// Resolved scalar value (leaf options only).
    #[serde(default)]
    pub value: Option<Value>,

    /// Child nodes (branch options only).
    #[serde(default)]
    pub options: Vec<CommandOption>,

    /// Set on the option the user is typing into during autocomplete.
    #[serde(default)]
    pub focused: bool,
}

/// The flattened form of an option tree.
///
/// # Examples
///
/// ```
/// use chime_core::options::{flatten, CommandOption};
///
/// let tree: Vec<CommandOption> = serde_json::from_value(serde_json::json!([
///     {"name": "notify", "type": 2, "options": [
///         {"name": "enable", "type": 1, "options": [
///             {"name": "type", "type": 3, "value": "All"}
///         ]}
///     ]}
/// ])).unwrap();
///
/// let flat = flatten(&tree);
/// assert_eq!(flat.subcommand.as_deref(), Some("notify enable"));
/// assert_eq!(flat.str("type"), Some("All"));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlatOptions {
    /// Space-joined sub-group/sub-command names, if any descent happened.
    pub subcommand: Option<String>,

    /// Leaf option values at the terminal level, keyed by option name.
    pub values: BTreeMap<String, Value>,

    /// Name of the focused leaf option (autocomplete only).
    pub focused: Option<String>,
}

impl FlatOptions {
    /// Returns the raw value of an option.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Returns a string option.
    pub fn str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Value::as_str)
    }

    /// Returns an integer option.
    pub fn i64(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(Value::as_i64)
    }

    /// Returns a number option.
    pub fn f64(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(Value::as_f64)
    }

    /// Returns a boolean option.
    pub fn bool(&self, name: &str) -> Option<bool> {
        self.get(name).and_then(Value::as_bool)
    }

    /// Returns `true` if no leaf options were supplied.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Flattens a command's option tree.
///
/// Descends while the current level consists of exactly one branch node,
/// collecting each node's name into the subcommand path. Every non-branch
/// node at the level where descent stops becomes an entry of the flat map.
pub fn flatten(options: &[CommandOption]) -> FlatOptions {
    let mut path: Vec<&str> = Vec::new();
    let mut level = options;

    while let [only] = level {
        if !only.kind.is_branch() {
            break;
        }
        path.push(&only.name);
        level = &only.options;
    }

    let mut flat = FlatOptions {
        subcommand: (!path.is_empty()).then(|| path.join(" ")),
        ..FlatOptions::default()
    };

    for leaf in level.iter().filter(|o| !o.kind.is_branch()) {
        if leaf.focused {
            flat.focused = Some(leaf.name.clone());
        }
        flat.values
            .insert(leaf.name.clone(), leaf.value.clone().unwrap_or(Value::Null));
    }

    flat
}
