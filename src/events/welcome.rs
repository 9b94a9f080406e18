//! Welcome event handler.
//!
//! Greets new members with the chat's configured welcome text, if any, and
//! points at the rules when they are set.

use teloxide::dispatching::UpdateHandler;
use teloxide::prelude::*;
use teloxide::types::{ChatMemberUpdated, ParseMode};
use tracing::{debug, info};

use crate::bot::dispatcher::{AppState, ThrottledBot};
use crate::utils::html_escape;

/// Returns the handler for new member events.
pub fn handler() -> UpdateHandler<anyhow::Error> {
    dptree::filter(is_new_member).endpoint(welcome_handler)
}

/// Check if this is a new (non-bot) member joining.
fn is_new_member(update: ChatMemberUpdated) -> bool {
    let old = &update.old_chat_member;
    let new = &update.new_chat_member;

    !old.is_present() && new.is_present() && !new.user.is_bot
}

/// Handle new member join event.
async fn welcome_handler(
    bot: ThrottledBot,
    update: ChatMemberUpdated,
    state: AppState,
) -> anyhow::Result<()> {
    let chat = update.chat;
    let user = &update.new_chat_member.user;

    debug!("New member {} joined chat {}", user.id, chat.id);

    let config = state.configs.get(chat.id.0).await?;

    let template = match config.welcome_text {
        Some(ref t) => t,
        None => return Ok(()),
    };

    let mention = format!(
        "<a href=\"tg://user?id={}\">{}</a>",
        user.id,
        html_escape(&user.first_name)
    );
    let mut text = template
        .replace("{mention}", &mention)
        .replace("{first}", &html_escape(&user.first_name))
        .replace("{chatname}", &html_escape(chat.title().unwrap_or("the group")));

    if config.rules.is_some() {
        text.push_str("\n\nSee /rules before posting.");
    }

    bot.send_message(chat.id, text)
        .parse_mode(ParseMode::Html)
        .await?;

    info!("Sent welcome message to {} in chat {}", user.first_name, chat.id);

    Ok(())
}
