//! Ban command handlers.
//!
//! Commands for banning, unbanning, and kicking users. Admin bans are
//! recorded in the same ban log the escalation engine writes to, with the
//! admin as the issuer.

use chrono::Utc;
use teloxide::prelude::*;
use teloxide::types::{ParseMode, ReplyParameters, UserId};
use tracing::info;

use crate::bot::dispatcher::{AppState, ThrottledBot};
use crate::utils::{format_duration, get_target_from_msg, html_escape, parse_duration};

/// Handle /ban command - permanent ban.
pub async fn ban_command(bot: ThrottledBot, msg: Message, state: AppState) -> anyhow::Result<()> {
    ban_action(bot, msg, state, BanAction::Ban).await
}

/// Handle /tban command - temporary ban with a duration argument.
pub async fn tban_command(bot: ThrottledBot, msg: Message, state: AppState) -> anyhow::Result<()> {
    ban_action(bot, msg, state, BanAction::TempBan).await
}

/// Handle /kick command - ban then unban, so the user can rejoin.
pub async fn kick_command(bot: ThrottledBot, msg: Message, state: AppState) -> anyhow::Result<()> {
    ban_action(bot, msg, state, BanAction::Kick).await
}

#[derive(PartialEq, Clone, Copy)]
enum BanAction {
    Ban,
    TempBan,
    Kick,
}

async fn ban_action(
    bot: ThrottledBot,
    msg: Message,
    state: AppState,
    action: BanAction,
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

    let (target_id, target_name, skip_words) = match get_target_from_msg(&msg) {
        Some(t) => t,
        None => {
            bot.send_message(chat_id, "Who? Reply to them or pass an ID.")
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
        bot.send_message(chat_id, "I won't ban an admin.")
            .reply_parameters(ReplyParameters::new(msg.id))
            .await?;
        return Ok(());
    }

    let text = msg.text().unwrap_or("");
    let mut args = text.split_whitespace().skip(1 + skip_words);

    // /tban takes a leading duration argument, the rest is the reason.
    let duration_secs = if action == BanAction::TempBan {
        let arg = args.next().unwrap_or("");
        match parse_duration(arg) {
            Some(d) => Some(d.as_secs()),
            None => {
                bot.send_message(chat_id, "Usage: /tban <duration> [reason] (e.g. /tban 1d spam)")
                    .reply_parameters(ReplyParameters::new(msg.id))
                    .await?;
                return Ok(());
            }
        }
    } else {
        None
    };

    let reason = args.collect::<Vec<_>>().join(" ");
    let reason = if reason.is_empty() {
        match action {
            BanAction::Kick => "kicked by admin".to_string(),
            _ => "banned by admin".to_string(),
        }
    } else {
        reason
    };

    let now = Utc::now();

    match action {
        BanAction::Kick => {
            // Ban then unban = kick
            bot.ban_chat_member(chat_id, target_id).await?;
            bot.unban_chat_member(chat_id, target_id).await?;

            bot.send_message(
                chat_id,
                format!(
                    "\u{1F462} <a href=\"tg://user?id={}\">{}</a> has been kicked.\n<b>Reason:</b> {}",
                    target_id,
                    html_escape(&target_name),
                    html_escape(&reason),
                ),
            )
            .parse_mode(ParseMode::Html)
            .await?;
        }
        BanAction::Ban | BanAction::TempBan => {
            state
                .bans
                .add(chat_id.0, target_id.0, &reason, admin_id.0, duration_secs, now)
                .await?;

            let mut request = bot.ban_chat_member(chat_id, target_id);
            if let Some(secs) = duration_secs {
                request = request.until_date(now + chrono::Duration::seconds(secs as i64));
            }
            request.await?;

            let duration_text = match duration_secs {
                Some(secs) => format!("for {}", format_duration(secs)),
                None => "permanently".to_string(),
            };
            bot.send_message(
                chat_id,
                format!(
                    "\u{1F6AB} <a href=\"tg://user?id={}\">{}</a> has been banned {duration_text}.\n<b>Reason:</b> {}",
                    target_id,
                    html_escape(&target_name),
                    html_escape(&reason),
                ),
            )
            .parse_mode(ParseMode::Html)
            .await?;
        }
    }

    info!("Admin {} applied {} to user {} in chat {}", admin_id, action_name(action), target_id, chat_id);

    Ok(())
}

fn action_name(action: BanAction) -> &'static str {
    match action {
        BanAction::Ban => "ban",
        BanAction::TempBan => "tban",
        BanAction::Kick => "kick",
    }
}

/// Handle /unban command.
///
/// Lifts the platform restriction only; the ban log keeps its history.
pub async fn unban_command(bot: ThrottledBot, msg: Message, state: AppState) -> anyhow::Result<()> {
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
            bot.send_message(chat_id, "Who should I unban? Reply or pass an ID.")
                .reply_parameters(ReplyParameters::new(msg.id))
                .await?;
            return Ok(());
        }
    };

    bot.unban_chat_member(chat_id, target_id).await?;

    bot.send_message(
        chat_id,
        format!(
            "\u{2705} <a href=\"tg://user?id={}\">{}</a> has been unbanned.",
            target_id,
            html_escape(&target_name),
        ),
    )
    .parse_mode(ParseMode::Html)
    .await?;

    info!("Admin {} unbanned user {} in chat {}", admin_id, target_id, chat_id);

    Ok(())
}
