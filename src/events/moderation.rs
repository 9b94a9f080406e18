//! Moderation event handler.
//!
//! Bridges Telegram messages into the moderation pipeline and executes the
//! resulting actions. Action execution is best-effort: a failed API call is
//! logged and the remaining actions still run, so a revoked delete permission
//! cannot stop a ban from being applied.

use teloxide::prelude::*;
use teloxide::types::{ChatId, MessageId, ParseMode, User, UserId};
use tracing::{debug, error, warn};

use crate::bot::dispatcher::{AppState, ThrottledBot};
use crate::moderation::{Action, InboundEvent};
use crate::utils::{format_duration, html_escape};

/// Run the moderation pipeline on a group message.
pub async fn moderate_message(
    bot: ThrottledBot,
    msg: Message,
    state: AppState,
) -> anyhow::Result<()> {
    let user = match msg.from.as_ref() {
        Some(u) => u,
        None => return Ok(()),
    };

    // Bots, bot owners, and chat admins are never moderated.
    if user.is_bot {
        return Ok(());
    }
    if state.is_owner(user.id.0) {
        debug!("User {} is bot owner, skipping moderation", user.id);
        return Ok(());
    }
    if state
        .permissions
        .is_admin(msg.chat.id, user.id)
        .await
        .unwrap_or(false)
    {
        return Ok(());
    }

    let text = msg.text().or_else(|| msg.caption());
    let event = InboundEvent {
        chat_id: msg.chat.id.0,
        user_id: user.id.0,
        message_id: Some(msg.id.0),
        text: text.map(str::to_string),
        timestamp: msg.date,
        is_command: text.map(|t| t.starts_with('/')).unwrap_or(false),
    };

    let actions = match state.moderation.process_event(&event).await {
        Ok(actions) => actions,
        Err(e) => {
            error!(
                "moderation pipeline failed for user {} in chat {}: {e}",
                user.id, msg.chat.id
            );
            return Ok(());
        }
    };

    for action in actions {
        execute_action(&bot, user, action).await;
    }

    Ok(())
}

/// Execute one platform action, logging failures without aborting the rest.
async fn execute_action(bot: &ThrottledBot, user: &User, action: Action) {
    match action {
        Action::DeleteMessage { chat_id, message_id } => {
            if let Err(e) = bot
                .delete_message(ChatId(chat_id), MessageId(message_id))
                .await
            {
                warn!("failed to delete message {message_id} in chat {chat_id}: {e}");
            }
        }
        Action::Warn {
            chat_id,
            user_id,
            reason,
            count,
            limit,
            flood,
        } => {
            let header = if flood {
                "\u{1F30A} Slow down!"
            } else {
                "\u{26A0} Warning issued."
            };
            let text = format!(
                "{header} <a href=\"tg://user?id={user_id}\">{}</a> has {count}/{limit} warning(s).\n<b>Reason:</b> {}",
                html_escape(&user.first_name),
                html_escape(&reason),
            );
            if let Err(e) = bot
                .send_message(ChatId(chat_id), text)
                .parse_mode(ParseMode::Html)
                .await
            {
                warn!("failed to announce warning in chat {chat_id}: {e}");
            }
        }
        Action::Ban {
            chat_id,
            user_id,
            reason,
            until,
        } => {
            let mut request = bot.ban_chat_member(ChatId(chat_id), UserId(user_id));
            if let Some(until) = until {
                request = request.until_date(until);
            }
            if let Err(e) = request.await {
                warn!("failed to ban user {user_id} in chat {chat_id}: {e}");
                return;
            }

            let duration_text = match until {
                Some(until) => {
                    let secs = (until - chrono::Utc::now()).num_seconds().max(0) as u64;
                    format!("for {}", format_duration(secs))
                }
                None => "permanently".to_string(),
            };
            let text = format!(
                "\u{1F6AB} <a href=\"tg://user?id={user_id}\">{}</a> has been banned {duration_text}.\n<b>Reason:</b> {}",
                html_escape(&user.first_name),
                html_escape(&reason),
            );
            if let Err(e) = bot
                .send_message(ChatId(chat_id), text)
                .parse_mode(ParseMode::Html)
                .await
            {
                warn!("failed to announce ban in chat {chat_id}: {e}");
            }
        }
    }
}
