//! Server configuration types and loading.
//!
//! Defines [`ServerConfig`] which is loaded from `~/.chime/config.yml`.
//! Contains the application's platform credentials, the listen address, and
//! the allowlist for private commands.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::ServerError;

/// Environment variable that overrides `discord.bot_token`.
pub const BOT_TOKEN_ENV: &str = "CHIME_BOT_TOKEN";

const DEFAULT_LISTEN: &str = "0.0.0.0:8787";
const DEFAULT_TOLERANCE_SECS: u64 = 300;

/// Top-level server configuration loaded from `~/.chime/config.yml`.
///
/// # Examples
///
/// ```
/// use chime_server::config::ServerConfig;
///
/// let yaml = r#"
/// discord:
///   application_id: "1234567890"
///   public_key: "d75a980182b10ab7d54bfed3c964073a0ee172f3daa62325af021a68f707511a"
/// allowlist: ["42"]
/// "#;
///
/// let config: ServerConfig = serde_yaml::from_str(yaml).unwrap();
/// assert_eq!(config.discord.application_id, "1234567890");
/// assert_eq!(config.listen, "0.0.0.0:8787");
/// assert_eq!(config.allowlist, ["42"]);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Platform application credentials.
    pub discord: DiscordConfig,

    /// Address the webhook listener binds to.
    #[serde(default = "default_listen")]
    pub listen: String,

    /// Maximum clock skew accepted on signed requests. `0` disables the check.
    #[serde(default = "default_tolerance")]
    pub timestamp_tolerance_secs: u64,

    /// Caller ids permitted to invoke private commands.
    #[serde(default)]
    pub allowlist: Vec<String>,

    /// Registers commands to this guild instead of globally.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guild_id: Option<String>,
}

/// Platform application credentials.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscordConfig {
    /// Numeric application id.
    pub application_id: String,

    /// Hex-encoded Ed25519 public key from the developer portal.
    pub public_key: String,

    /// Bot token, only needed to register commands.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bot_token: Option<String>,
}

fn default_listen() -> String {
    DEFAULT_LISTEN.to_string()
}

fn default_tolerance() -> u64 {
    DEFAULT_TOLERANCE_SECS
}

/// Returns the default configuration directory path (`~/.chime/`).
///
/// # Errors
///
/// Returns `ServerError::Config` if the `HOME` environment variable is not set.
pub fn default_config_dir() -> Result<PathBuf, ServerError> {
    let home = std::env::var("HOME")
        .map_err(|_| ServerError::Config("HOME environment variable not set".into()))?;
    Ok(PathBuf::from(home).join(".chime"))
}

/// Returns the default configuration file path (`~/.chime/config.yml`).
///
/// # Errors
///
/// Returns `ServerError::Config` if the `HOME` environment variable is not set.
pub fn default_config_path() -> Result<PathBuf, ServerError> {
    Ok(default_config_dir()?.join("config.yml"))
}

impl ServerConfig {
    /// Loads configuration from the given YAML file path, applies the
    /// environment override for the bot token, and validates the result.
    ///
    /// # Errors
    ///
    /// Returns `ServerError::Io` if the file cannot be read,
    /// `ServerError::Yaml` if it is not a valid config document, and
    /// `ServerError::Config` for missing or malformed values.
    pub fn load(path: &Path) -> Result<Self, ServerError> {
        info!(path = %path.display(), "Loading configuration");
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = serde_yaml::from_str(&content)?;
        config.apply_env_override(std::env::var(BOT_TOKEN_ENV).ok());
        config.validate()?;
        Ok(config)
    }

    fn apply_env_override(&mut self, bot_token: Option<String>) {
        if let Some(token) = bot_token.filter(|t| !t.is_empty()) {
            self.discord.bot_token = Some(token);
        }
    }

    /// Validates that required fields are present and well-formed.
    fn validate(&self) -> Result<(), ServerError> {
        let app_id = &self.discord.application_id;
        if app_id.is_empty() || !app_id.chars().all(|c| c.is_ascii_digit()) {
            return Err(ServerError::Config(
                "discord.application_id must be a numeric id".into(),
            ));
        }
        let key = self.discord.public_key.trim();
        if key.len() != 64 || !key.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(ServerError::Config(
                "discord.public_key must be 64 hex characters".into(),
            ));
        }
        self.listen_addr()?;
        Ok(())
    }

    /// Parsed listen address.
    ///
    /// # Errors
    ///
    /// Returns `ServerError::Config` if `listen` is not a socket address.
    pub fn listen_addr(&self) -> Result<SocketAddr, ServerError> {
        self.listen
            .parse()
            .map_err(|e| ServerError::Config(format!("listen '{}' is invalid: {e}", self.listen)))
    }

    /// Freshness window for signed requests.
    pub fn tolerance(&self) -> Duration {
        Duration::from_secs(self.timestamp_tolerance_secs)
    }

    /// Bot token for command registration.
    ///
    /// # Errors
    ///
    /// Returns `ServerError::Config` if neither the file nor the environment
    /// provides one.
    pub fn bot_token(&self) -> Result<&str, ServerError> {
        self.discord
            .bot_token
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                ServerError::Config(format!(
                    "discord.bot_token (or {BOT_TOKEN_ENV}) is required to register commands"
                ))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &str = "d75a980182b10ab7d54bfed3c964073a0ee172f3daa62325af021a68f707511a";

    fn config() -> ServerConfig {
        ServerConfig {
            discord: DiscordConfig {
                application_id: "1234".into(),
                public_key: KEY.into(),
                bot_token: None,
            },
            listen: default_listen(),
            timestamp_tolerance_secs: DEFAULT_TOLERANCE_SECS,
            allowlist: Vec::new(),
            guild_id: None,
        }
    }

    #[test]
    fn test_should_deserialize_full_config() {
        let yaml = format!(
            r#"
discord:
  application_id: "1234"
  public_key: "{KEY}"
  bot_token: "bot-secret"
listen: "127.0.0.1:9000"
timestamp_tolerance_secs: 0
allowlist: ["1", "2"]
guild_id: "777"
"#
        );
        let config: ServerConfig = serde_yaml::from_str(&yaml).expect("deserialize");
        assert_eq!(config.discord.bot_token.as_deref(), Some("bot-secret"));
        assert_eq!(config.listen, "127.0.0.1:9000");
        assert!(config.tolerance().is_zero());
        assert_eq!(config.allowlist.len(), 2);
        assert_eq!(config.guild_id.as_deref(), Some("777"));
    }

    #[test]
    fn test_should_apply_defaults() {
        let yaml = format!(
            r#"
discord:
  application_id: "1234"
  public_key: "{KEY}"
"#
        );
        let config: ServerConfig = serde_yaml::from_str(&yaml).expect("deserialize");
        assert_eq!(config.listen, DEFAULT_LISTEN);
        assert_eq!(config.tolerance(), Duration::from_secs(300));
        assert!(config.allowlist.is_empty());
        assert!(config.guild_id.is_none());
        assert!(config.discord.bot_token.is_none());
    }

    #[test]
    fn test_should_validate_valid_config() {
        assert!(config().validate().is_ok());
    }

    #[test]
    fn test_should_reject_non_numeric_application_id() {
        let mut c = config();
        c.discord.application_id = "abc".into();
        let err = c.validate().unwrap_err().to_string();
        assert!(err.contains("application_id"));
    }

    #[test]
    fn test_should_reject_malformed_public_key() {
        let mut c = config();
        c.discord.public_key = "zz".into();
        let err = c.validate().unwrap_err().to_string();
        assert!(err.contains("public_key"));
    }

    #[test]
    fn test_should_reject_bad_listen_address() {
        let mut c = config();
        c.listen = "not an address".into();
        let err = c.validate().unwrap_err().to_string();
        assert!(err.contains("listen"));
    }

    #[test]
    fn test_should_prefer_env_bot_token() {
        let mut c = config();
        c.discord.bot_token = Some("from-file".into());
        c.apply_env_override(Some("from-env".into()));
        assert_eq!(c.bot_token().expect("token"), "from-env");

        c.apply_env_override(Some(String::new()));
        assert_eq!(c.bot_token().expect("token"), "from-env");
    }

    #[test]
    fn test_should_require_bot_token_for_registration() {
        let err = config().bot_token().unwrap_err().to_string();
        assert!(err.contains(BOT_TOKEN_ENV));
    }

    #[test]
    fn test_should_load_from_file() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let path = tmp.path().join("config.yml");
        std::fs::write(
            &path,
            format!(
                r#"
discord:
  application_id: "1234"
  public_key: "{KEY}"
allowlist: ["9"]
"#
            ),
        )
        .expect("write config");

        let config = ServerConfig::load(&path).expect("load");
        assert_eq!(config.allowlist, ["9"]);
        assert_eq!(
            config.listen_addr().expect("addr"),
            "0.0.0.0:8787".parse::<SocketAddr>().expect("addr")
        );
    }

    #[test]
    fn test_should_error_on_missing_file() {
        let result = ServerConfig::load(Path::new("/nonexistent/config.yml"));
        assert!(matches!(result, Err(ServerError::Io(_))));
    }

    #[test]
    fn test_should_error_on_invalid_yaml() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let path = tmp.path().join("config.yml");
        std::fs::write(&path, "discord: [unclosed").expect("write config");
        let err = ServerConfig::load(&path).unwrap_err();
        assert!(matches!(err, ServerError::Yaml(_)));
        assert!(err.to_string().starts_with("YAML error"));
    }

    #[test]
    fn test_should_round_trip_yaml() {
        let mut c = config();
        c.guild_id = Some("777".into());
        let yaml = serde_yaml::to_string(&c).expect("serialize");
        assert!(!yaml.contains("bot_token"));
        let back: ServerConfig = serde_yaml::from_str(&yaml).expect("deserialize");
        assert_eq!(back.guild_id.as_deref(), Some("777"));
        assert_eq!(back.discord.public_key, KEY);
    }
}
