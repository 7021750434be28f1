//! Compact identifiers attached to components and modals.
//!
//! A custom id is a dash-separated string: segment 0 names the owning
//! command, the remaining segments are positional arguments handed back to
//! that command when the user interacts with the element.
//!
//! Arguments are escaped so that any value round-trips: `%` becomes `%25`
//! and `-` becomes `%2D`. The owning key itself may contain neither.

use std::fmt;

use crate::error::CoreError;

/// Segment separator.
pub const SEPARATOR: char = '-';

/// Maximum custom id length accepted by the platform.
pub const MAX_LEN: usize = 100;

/// Checks that `key` can own identifiers: non-empty, with neither the
/// separator nor the escape character.
///
/// # Errors
///
/// Returns `CoreError::InvalidCustomId` describing the offending key.
pub fn validate_key(key: &str) -> Result<(), CoreError> {
    if key.is_empty() || key.contains(SEPARATOR) || key.contains('%') {
        return Err(CoreError::InvalidCustomId(format!(
            "command key `{key}` must be non-empty and contain no `-` or `%`"
        )));
    }
    Ok(())
}

/// A parsed or under-construction compact identifier.
///
/// # Examples
///
/// ```
/// use chime_core::CustomId;
///
/// let id = CustomId::new("share").unwrap().arg("twitter").arg("12345").arg(1);
/// assert_eq!(id.encode().unwrap(), "share-twitter-12345-1");
///
/// let parsed = CustomId::parse("share-twitter-12345-1").unwrap();
/// assert_eq!(parsed.key(), "share");
/// assert_eq!(parsed.args(), ["twitter", "12345", "1"]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomId {
    key: String,
    args: Vec<String>,
}

impl CustomId {
    /// Starts an identifier owned by the command with the given key.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidCustomId` if the key is empty or contains
    /// the separator or the escape character.
    pub fn new(key: impl Into<String>) -> Result<Self, CoreError> {
        let key = key.into();
        validate_key(&key)?;
        Ok(Self {
            key,
            args: Vec::new(),
        })
    }

    /// Appends a positional argument.
    pub fn arg(mut self, value: impl ToString) -> Self {
        self.args.push(value.to_string());
        self
    }

    /// Parses an identifier received from the platform.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidCustomId` if the key segment is empty.
    pub fn parse(raw: &str) -> Result<Self, CoreError> {
        let mut segments = raw.split(SEPARATOR);
        let key = segments.next().unwrap_or_default();
        if key.is_empty() {
            return Err(CoreError::InvalidCustomId(format!(
                "`{raw}` has an empty command key"
            )));
        }
        Ok(Self {
            key: key.to_string(),
            args: segments.map(unescape).collect(),
        })
    }

    /// Returns the owning command key (segment 0).
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Returns the positional arguments.
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Consumes the identifier, returning its positional arguments.
    pub fn into_args(self) -> Vec<String> {
        self.args
    }

    /// Renders the identifier for attaching to a component.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidCustomId` if the encoded form exceeds
    /// [`MAX_LEN`] characters.
    pub fn encode(&self) -> Result<String, CoreError> {
        let encoded = self.to_string();
        if encoded.chars().count() > MAX_LEN {
            return Err(CoreError::InvalidCustomId(format!(
                "encoded id is longer than {MAX_LEN} characters"
            )));
        }
        Ok(encoded)
    }
}

impl fmt::Display for CustomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key)?;
        for arg in &self.args {
            write!(f, "{SEPARATOR}{}", escape(arg))?;
        }
        Ok(())
    }
}

fn escape(value: &str) -> String {
    value.replace('%', "%25").replace(SEPARATOR, "%2D")
}

fn unescape(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len());
    let mut rest = segment;
    while let Some(pos) = rest.find('%') {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];
        if tail.starts_with("%2D") || tail.starts_with("%2d") {
            out.push(SEPARATOR);
            rest = &tail[3..];
        } else if tail.starts_with("%25") {
            out.push('%');
            rest = &tail[3..];
        } else {
            out.push('%');
            rest = &tail[1..];
        }
    }
    out.push_str(rest);
    out
}
