//! `/ping` command.
//!
//! Answers immediately, then edits the answer in place with how long the
//! interaction took to reach us. The edit runs after the HTTP response has
//! been sent.

use chime_core::{CommandDescriptor, Declaration, HandlerError, Invocation, Message};
use tracing::debug;

/// Platform epoch for snowflake ids (2015-01-01T00:00:00Z), in milliseconds.
const SNOWFLAKE_EPOCH_MS: i64 = 1_420_070_400_000;

pub fn command() -> CommandDescriptor {
    CommandDescriptor::new("ping")
        .declare(Declaration::chat("ping", "Check that the bot is reachable"))
        .on_command(run)
}

async fn run(inv: Invocation) -> Result<(), HandlerError> {
    inv.respond.reply(Message::text("Pong!"))?;

    let Some(latency) = snowflake_age_ms(&inv.interaction.id, chrono::Utc::now().timestamp_millis())
    else {
        debug!(id = %inv.interaction.id, "Interaction id is not a snowflake, skipping edit");
        return Ok(());
    };
    inv.followup
        .edit_original(&Message::text(format!("Pong! Took {latency} ms to arrive.")))
        .await?;
    Ok(())
}

/// Milliseconds between the creation of a snowflake id and `now_ms`.
fn snowflake_age_ms(id: &str, now_ms: i64) -> Option<i64> {
    let id: u64 = id.parse().ok()?;
    let created = i64::try_from(id >> 22).ok()? + SNOWFLAKE_EPOCH_MS;
    Some((now_ms - created).max(0))
}
