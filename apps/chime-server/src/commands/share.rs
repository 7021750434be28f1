//! `/share` command.
//!
//! Posts a topic with buttons underneath. Each button carries a compact
//! identifier `share-<target>-<topic>`; sub-identifier dispatch routes the
//! click to the runner named by `<target>` and hands it the topic as its
//! only positional argument.

use chime_core::custom_id::MAX_LEN;
use chime_core::{
    CommandDescriptor, CustomId, Declaration, HandlerError, Invocation, Message, Modal,
};
use serde_json::{Value, json};
use tracing::info;

const KEY: &str = "share";
const TOPIC_MAX_LEN: usize = 60;
/// Longest target segment any identifier of this command carries.
const LONGEST_TARGET: &str = "twitter";
/// Encoded characters left for the topic in `share-<target>-<topic>`.
const TOPIC_ID_BUDGET: usize = MAX_LEN - KEY.len() - LONGEST_TARGET.len() - 2;

pub fn command() -> CommandDescriptor {
    CommandDescriptor::new("share")
        .declare(Declaration::chat("share", "Share a topic with the channel").options(json!([
            {
                "type": 3,
                "name": "topic",
                "description": "What to share",
                "required": true,
                "max_length": TOPIC_MAX_LEN,
            }
        ])))
        .custom_key(KEY)
        .sub_id_dispatch()
        .on_command(post)
        .on("twitter", twitter)
        .on("link", link)
        .on("note", note)
        .on("submit", submit)
        .on_component(unknown_target)
}

/// Longest prefix of `topic` whose escaped form fits the identifier budget.
fn id_topic(topic: &str) -> String {
    let mut used = 0;
    topic
        .chars()
        .take_while(|c| {
            used += if matches!(c, '-' | '%') { 3 } else { 1 };
            used <= TOPIC_ID_BUDGET
        })
        .collect()
}

fn button(label: &str, target: &str, topic: &str) -> Result<Value, HandlerError> {
    let custom_id = CustomId::new(KEY)?.arg(target).arg(topic).encode()?;
    Ok(json!({ "type": 2, "style": 2, "label": label, "custom_id": custom_id }))
}

async fn post(inv: Invocation) -> Result<(), HandlerError> {
    let topic: String = inv
        .options
        .str("topic")
        .unwrap_or_default()
        .chars()
        .take(TOPIC_MAX_LEN)
        .collect();

    let id_topic = id_topic(&topic);

    let message = Message::text(format!("<@{}> wants to share **{topic}**", inv.caller()))
        .no_mentions()
        .row(vec![
            button("Tweet", "twitter", &id_topic)?,
            button("Copy link", "link", &id_topic)?,
            button("Add a note", "note", &id_topic)?,
        ]);
    inv.respond.reply(message)?;
    Ok(())
}

/// Replaces the buttons with an attribution line.
async fn twitter(inv: Invocation) -> Result<(), HandlerError> {
    let topic = inv.arg(0).unwrap_or_default();
    info!(caller = inv.caller(), topic, "Topic shared to Twitter");
    inv.respond.update(
        Message::text(format!("**{topic}** was shared to Twitter by <@{}>", inv.caller()))
            .no_mentions(),
    )?;
    Ok(())
}

/// Replies privately with a jump link to the shared message.
async fn link(inv: Invocation) -> Result<(), HandlerError> {
    let raw = &inv.interaction.raw;
    let guild = inv.interaction.guild_id.as_deref().unwrap_or("@me");
    let channel = inv.interaction.channel_id.as_deref().unwrap_or_default();
    let message_id = raw["message"]["id"].as_str().unwrap_or_default();

    inv.respond.reply(
        Message::text(format!(
            "https://discord.com/channels/{guild}/{channel}/{message_id}"
        ))
        .ephemeral(),
    )?;
    Ok(())
}

/// Opens a modal asking for a note about the topic.
async fn note(inv: Invocation) -> Result<(), HandlerError> {
    let topic = inv.arg(0).unwrap_or_default();
    let custom_id = CustomId::new(KEY)?.arg("submit").arg(topic).encode()?;
    inv.respond
        .modal(Modal::new(custom_id, "Add a note").text_input("note", "Your note", true))?;
    Ok(())
}

/// Receives the modal submission.
async fn submit(inv: Invocation) -> Result<(), HandlerError> {
    let topic = inv.arg(0).unwrap_or_default();
    let note = inv.options.str("note").unwrap_or_default();
    inv.respond.reply(
        Message::text(format!("<@{}> on **{topic}**: {note}", inv.caller())).no_mentions(),
    )?;
    Ok(())
}

async fn unknown_target(inv: Invocation) -> Result<(), HandlerError> {
    inv.respond.reply(
        Message::text(format!(
            "Unknown share target `{}`",
            inv.arg(0).unwrap_or_default()
        ))
        .ephemeral(),
    )?;
    Ok(())
}
