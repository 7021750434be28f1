//! `/settings` command.
//!
//! Only the `notify` sub-group exists so far:
//! `/settings notify enable type:<level>` and `/settings notify disable`.
//! The `type` option is autocompleted from [`LEVELS`].

use chime_core::{Choice, CommandDescriptor, Declaration, HandlerError, Invocation, Message};
use serde_json::json;
use tracing::info;

/// Notification levels offered by autocomplete.
pub const LEVELS: [&str; 3] = ["All", "Mentions", "None"];

pub fn command() -> CommandDescriptor {
    CommandDescriptor::new("settings")
        .declare(Declaration::chat("settings", "Change your preferences").options(json!([
            {
                "type": 2,
                "name": "notify",
                "description": "Notification preferences",
                "options": [
                    {
                        "type": 1,
                        "name": "enable",
                        "description": "Turn notifications on",
                        "options": [{
                            "type": 3,
                            "name": "type",
                            "description": "Which notifications",
                            "required": true,
                            "autocomplete": true,
                        }]
                    },
                    {
                        "type": 1,
                        "name": "disable",
                        "description": "Turn notifications off",
                    }
                ]
            }
        ])))
        .on("notify enable", enable)
        .on("notify disable", disable)
        .on_command(unknown)
        .on_autocomplete(complete)
}

async fn enable(inv: Invocation) -> Result<(), HandlerError> {
    let level = inv.options.str("type").unwrap_or("All");
    let Some(level) = LEVELS.iter().find(|l| l.eq_ignore_ascii_case(level)) else {
        inv.respond
            .reply(Message::text(format!("`{level}` is not a notification level")).ephemeral())?;
        return Ok(());
    };
    info!(caller = inv.caller(), level, "Notifications enabled");
    inv.respond
        .reply(Message::text(format!("Notifications enabled: {level}")).ephemeral())?;
    Ok(())
}

async fn disable(inv: Invocation) -> Result<(), HandlerError> {
    info!(caller = inv.caller(), "Notifications disabled");
    inv.respond
        .reply(Message::text("Notifications disabled").ephemeral())?;
    Ok(())
}

async fn unknown(inv: Invocation) -> Result<(), HandlerError> {
    inv.respond.reply(
        Message::text(format!(
            "Unknown setting `{}`",
            inv.subcommand().unwrap_or_default()
        ))
        .ephemeral(),
    )?;
    Ok(())
}

async fn complete(inv: Invocation) -> Result<(), HandlerError> {
    let typed = match inv.options.focused.as_deref() {
        Some(field) => inv.options.str(field).unwrap_or_default().to_lowercase(),
        None => String::new(),
    };
    let choices = LEVELS
        .iter()
        .filter(|l| l.to_lowercase().starts_with(&typed))
        .map(|l| Choice::new(*l, *l))
        .collect();
    inv.respond.autocomplete(choices)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use chime_core::InteractionResponse;
    use serde_json::{Value, json};

    use super::*;
    use crate::commands::testing;

    fn settings(kind: u8, leaf: Value) -> Value {
        json!({
            "id": "1", "application_id": "app", "type": kind, "token": "tok",
            "user": {"id": "u1"},
            "data": {"name": "settings", "type": 1, "options": [
                {"name": "notify", "type": 2, "options": [leaf]}
            ]}
        })
    }

    async fn content(body: Value) -> String {
        let d = testing::dispatcher("http://127.0.0.1:9");
        let resp = testing::dispatch(&d, body)
            .await
            .expect("dispatch")
            .expect("response")
            .to_json();
        resp["data"]["content"].as_str().unwrap_or_default().to_string()
    }

    #[tokio::test]
    async fn test_should_enable_with_flattened_option() {
        let body = settings(
            2,
            json!({"name": "enable", "type": 1, "options": [
                {"name": "type", "type": 3, "value": "All"}
            ]}),
        );
        assert_eq!(content(body).await, "Notifications enabled: All");
    }

    #[tokio::test]
    async fn test_should_reject_unknown_level() {
        let body = settings(
            2,
            json!({"name": "enable", "type": 1, "options": [
                {"name": "type", "type": 3, "value": "loud"}
            ]}),
        );
        assert_eq!(content(body).await, "`loud` is not a notification level");
    }

    #[tokio::test]
    async fn test_should_disable() {
        let body = settings(2, json!({"name": "disable", "type": 1}));
        assert_eq!(content(body).await, "Notifications disabled");
    }

    #[tokio::test]
    async fn test_should_fall_back_for_undeclared_subcommand() {
        let body = settings(2, json!({"name": "snooze", "type": 1}));
        assert_eq!(content(body).await, "Unknown setting `notify snooze`");
    }

    #[tokio::test]
    async fn test_should_complete_focused_option() {
        let d = testing::dispatcher("http://127.0.0.1:9");
        let body = settings(
            4,
            json!({"name": "enable", "type": 1, "options": [
                {"name": "type", "type": 3, "value": "m", "focused": true}
            ]}),
        );
        match testing::dispatch(&d, body).await.expect("dispatch") {
            Some(InteractionResponse::Autocomplete(choices)) => {
                assert_eq!(choices, vec![Choice::new("Mentions", "Mentions")]);
            }
            other => panic!("unexpected response {other:?}"),
        }
    }
}
