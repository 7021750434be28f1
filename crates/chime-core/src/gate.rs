//! Authorization for private commands.

use std::collections::HashSet;

use tracing::warn;

use crate::command::CommandDescriptor;
use crate::error::CoreError;

/// Fixed set of caller ids permitted to invoke private commands.
///
/// # Examples
///
/// ```
/// use chime_core::{Allowlist, CommandDescriptor};
///
/// let allow: Allowlist = ["1111"].into_iter().collect();
/// let stats = CommandDescriptor::new("stats").private();
/// assert!(allow.authorize(&stats, "1111").is_ok());
/// assert!(allow.authorize(&stats, "2222").is_err());
/// ```
#[derive(Debug, Clone, Default)]
pub struct Allowlist {
    ids: HashSet<String>,
}

impl Allowlist {
    pub fn new<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            ids: ids.into_iter().map(Into::into).collect(),
        }
    }

    pub fn contains(&self, caller: &str) -> bool {
        self.ids.contains(caller)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Admits every caller to public commands and only allowlisted callers to
    /// private ones.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Forbidden` if the command is private and the caller
    /// is not on the list.
    pub fn authorize(&self, command: &CommandDescriptor, caller: &str) -> Result<(), CoreError> {
        if !command.is_private() || self.contains(caller) {
            return Ok(());
        }
        warn!(command = command.name(), caller, "Rejected private command");
        Err(CoreError::Forbidden {
            command: command.name().to_string(),
            caller: caller.to_string(),
        })
    }
}

impl<S: Into<String>> FromIterator<S> for Allowlist {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::new(iter)
    }
}
