//! Command registration.
//!
//! Bulk-overwrites the platform's command declarations with the ones in the
//! registry, either globally or for a single guild.

use chime_core::{Registry, RestClient};
use tracing::{info, instrument};

use crate::commands;
use crate::config::ServerConfig;
use crate::error::ServerError;

/// Uploads every built-in declaration. Returns how many the platform accepted.
///
/// `guild` overrides `config.guild_id`; with neither set the commands are
/// registered globally.
///
/// # Errors
///
/// Returns `ServerError::Config` if no bot token is configured, and
/// `ServerError::Core` if the registry is inconsistent or the platform
/// rejects the upload.
#[instrument(skip(config, rest), fields(application_id = %config.discord.application_id))]
pub async fn register(
    config: &ServerConfig,
    rest: &RestClient,
    guild: Option<&str>,
) -> Result<usize, ServerError> {
    let bot_token = config.bot_token()?;
    let registry = Registry::new(commands::builtin())?;
    let declarations = registry.declarations();
    let app_id = &config.discord.application_id;

    let accepted = match guild.or(config.guild_id.as_deref()) {
        Some(guild_id) => {
            info!(guild_id, "Registering guild commands");
            rest.overwrite_guild_commands(app_id, guild_id, bot_token, &declarations)
                .await?
        }
        None => {
            info!("Registering global commands");
            rest.overwrite_global_commands(app_id, bot_token, &declarations)
                .await?
        }
    };

    let count = accepted.as_array().map_or(0, Vec::len);
    info!(count, "Commands registered");
    Ok(count)
}
