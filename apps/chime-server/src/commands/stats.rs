//! `/stats` command (allowlisted callers only).
//!
//! Defers with a private placeholder and fills it in from the continuation.

use std::sync::LazyLock;
use std::time::{Duration, Instant};

use chime_core::{CommandDescriptor, Declaration, HandlerError, Invocation, Message};

static STARTED: LazyLock<Instant> = LazyLock::new(Instant::now);

pub fn command() -> CommandDescriptor {
    LazyLock::force(&STARTED);
    CommandDescriptor::new("stats")
        .declare(Declaration::chat("stats", "Show server statistics"))
        .private()
        .on_command(run)
}

async fn run(inv: Invocation) -> Result<(), HandlerError> {
    inv.respond.defer(true)?;

    let report = format!(
        "**chime-server** v{}\nUptime: {}\nLocale: {}",
        env!("CARGO_PKG_VERSION"),
        format_uptime(STARTED.elapsed()),
        inv.locale().unwrap_or("unknown"),
    );
    inv.followup.edit_original(&Message::text(report)).await?;
    Ok(())
}

fn format_uptime(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    let (days, hours, minutes, seconds) = (
        secs / 86_400,
        secs % 86_400 / 3_600,
        secs % 3_600 / 60,
        secs % 60,
    );
    if days > 0 {
        format!("{days}d {hours}h {minutes}m")
    } else {
        format!("{hours}h {minutes}m {seconds}s")
    }
}
