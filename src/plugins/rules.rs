//! Rules command handlers.

use teloxide::prelude::*;
use teloxide::types::{ParseMode, ReplyParameters, UserId};

use crate::bot::dispatcher::{AppState, ThrottledBot};
use crate::database::models::ChatConfigPatch;
use crate::utils::html_escape;

/// Handle /rules command - available to everyone.
pub async fn rules_command(bot: ThrottledBot, msg: Message, state: AppState) -> anyhow::Result<()> {
    if !msg.chat.is_group() && !msg.chat.is_supergroup() {
        return Ok(());
    }

    let config = state.configs.get(msg.chat.id.0).await?;

    match config.rules {
        Some(rules) => {
            bot.send_message(
                msg.chat.id,
                format!("\u{1F4DC} <b>Chat rules</b>\n\n{}", html_escape(&rules)),
            )
            .parse_mode(ParseMode::Html)
            .await?;
        }
        None => {
            bot.send_message(msg.chat.id, "No rules have been set for this chat.")
                .await?;
        }
    }

    Ok(())
}

/// Handle /setrules command. No text clears the rules.
pub async fn setrules_command(
    bot: ThrottledBot,
    msg: Message,
    state: AppState,
) -> anyhow::Result<()> {
    if !msg.chat.is_group() && !msg.chat.is_supergroup() {
        return Ok(());
    }

    let admin_id = msg.from.as_ref().map(|u| u.id).unwrap_or(UserId(0));
    if !state
        .permissions
        .can_change_info(msg.chat.id, admin_id)
        .await
        .unwrap_or(false)
    {
        bot.send_message(msg.chat.id, "You need the change-info permission for that.")
            .reply_parameters(ReplyParameters::new(msg.id))
            .await?;
        return Ok(());
    }

    let text = msg.text().unwrap_or("");
    let rules = text
        .split_once(char::is_whitespace)
        .map(|(_, rest)| rest.trim().to_string())
        .filter(|s| !s.is_empty());

    let confirmation = if rules.is_some() {
        "Rules saved."
    } else {
        "Rules cleared."
    };

    let patch = ChatConfigPatch {
        rules: Some(rules),
        ..Default::default()
    };
    state.configs.update(msg.chat.id.0, patch).await?;

    bot.send_message(msg.chat.id, confirmation).await?;
    Ok(())
}
