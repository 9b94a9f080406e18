//! Mute command handlers.

use teloxide::prelude::*;
use teloxide::types::{ChatPermissions, ParseMode, ReplyParameters, UserId};
use tracing::info;

use crate::bot::dispatcher::{AppState, ThrottledBot};
use crate::utils::{format_duration, get_target_from_msg, html_escape, parse_duration};

/// Handle /mute command, with an optional duration argument.
pub async fn mute_command(bot: ThrottledBot, msg: Message, state: AppState) -> anyhow::Result<()> {
    let chat_id = msg.chat.id;
    let admin_id = msg.from.as_ref().map(|u| u.id).unwrap_or(UserId(0));

    if !msg.chat.is_group() && !msg.chat.is_supergroup() {
        return Ok(());
    }

    if !state
        .permissions
        .can_restrict_members(chat_id, admin_id)
        .await
        .unwrap_or(false)
    {
        bot.send_message(chat_id, "You need the restrict-members permission for that.")
            .reply_parameters(ReplyParameters::new(msg.id))
            .await?;
        return Ok(());
    }

    let (target_id, target_name, skip_words) = match get_target_from_msg(&msg) {
        Some(t) => t,
        None => {
            bot.send_message(chat_id, "Who should I mute? Reply or pass an ID.")
                .reply_parameters(ReplyParameters::new(msg.id))
                .await?;
            return Ok(());
        }
    };

    if state
        .permissions
        .is_admin(chat_id, target_id)
        .await
        .unwrap_or(false)
    {
        bot.send_message(chat_id, "I won't mute an admin.")
            .reply_parameters(ReplyParameters::new(msg.id))
            .await?;
        return Ok(());
    }

    let duration = msg
        .text()
        .and_then(|t| t.split_whitespace().nth(1 + skip_words))
        .and_then(parse_duration);

    // No rights = muted
    let mut request = bot.restrict_chat_member(chat_id, target_id, ChatPermissions::empty());
    if let Some(d) = duration {
        request = request.until_date(chrono::Utc::now() + chrono::Duration::from_std(d)?);
    }
    request.await?;

    let duration_text = match duration {
        Some(d) => format!("for {}", format_duration(d.as_secs())),
        None => "indefinitely".to_string(),
    };
    bot.send_message(
        chat_id,
        format!(
            "\u{1F507} <a href=\"tg://user?id={}\">{}</a> has been muted {duration_text}.",
            target_id,
            html_escape(&target_name),
        ),
    )
    .parse_mode(ParseMode::Html)
    .await?;

    info!("Admin {} muted user {} in chat {}", admin_id, target_id, chat_id);

    Ok(())
}

/// Handle /unmute command.
pub async fn unmute_command(
    bot: ThrottledBot,
    msg: Message,
    state: AppState,
) -> anyhow::Result<()> {
    let chat_id = msg.chat.id;
    let admin_id = msg.from.as_ref().map(|u| u.id).unwrap_or(UserId(0));

    if !msg.chat.is_group() && !msg.chat.is_supergroup() {
        return Ok(());
    }

    if !state
        .permissions
        .can_restrict_members(chat_id, admin_id)
        .await
        .unwrap_or(false)
    {
        bot.send_message(chat_id, "You need the restrict-members permission for that.")
            .reply_parameters(ReplyParameters::new(msg.id))
            .await?;
        return Ok(());
    }

    let (target_id, target_name, _) = match get_target_from_msg(&msg) {
        Some(t) => t,
        None => {
            bot.send_message(chat_id, "Who should I unmute? Reply or pass an ID.")
                .reply_parameters(ReplyParameters::new(msg.id))
                .await?;
            return Ok(());
        }
    };

    // Restore the default send permissions.
    let permissions = ChatPermissions::SEND_MESSAGES
        | ChatPermissions::SEND_AUDIOS
        | ChatPermissions::SEND_DOCUMENTS
        | ChatPermissions::SEND_PHOTOS
        | ChatPermissions::SEND_VIDEOS
        | ChatPermissions::SEND_VIDEO_NOTES
        | ChatPermissions::SEND_VOICE_NOTES
        | ChatPermissions::SEND_POLLS
        | ChatPermissions::SEND_OTHER_MESSAGES
        | ChatPermissions::ADD_WEB_PAGE_PREVIEWS;
    bot.restrict_chat_member(chat_id, target_id, permissions)
        .await?;

    bot.send_message(
        chat_id,
        format!(
            "\u{1F50A} <a href=\"tg://user?id={}\">{}</a> has been unmuted.",
            target_id,
            html_escape(&target_name),
        ),
    )
    .parse_mode(ParseMode::Html)
    .await?;

    info!("Admin {} unmuted user {} in chat {}", admin_id, target_id, chat_id);

    Ok(())
}
