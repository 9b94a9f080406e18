//! Warning command handlers.
//!
//! Admin-issued warnings share the escalation ledger with automatic ones:
//! a /warn that reaches the chat's limit bans, exactly like a classifier
//! warning would.

use chrono::Utc;
use teloxide::prelude::*;
use teloxide::types::{ParseMode, ReplyParameters, UserId};
use tracing::info;

use crate::bot::dispatcher::{AppState, ThrottledBot};
use crate::utils::{format_duration, get_target_from_msg, html_escape};

/// Handle /warn command.
pub async fn warn_command(bot: ThrottledBot, msg: Message, state: AppState) -> anyhow::Result<()> {
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
            bot.send_message(chat_id, "Who do you want to warn? Reply to them or pass an ID.")
                .reply_parameters(ReplyParameters::new(msg.id))
                .await?;
            return Ok(());
        }
    };

    // Never warn admins.
    if state
        .permissions
        .is_admin(chat_id, target_id)
        .await
        .unwrap_or(false)
    {
        bot.send_message(chat_id, "I won't warn an admin.")
            .reply_parameters(ReplyParameters::new(msg.id))
            .await?;
        return Ok(());
    }

    let text = msg.text().unwrap_or("");
    let reason = text
        .split_whitespace()
        .skip(1 + skip_words)
        .collect::<Vec<_>>()
        .join(" ");
    let reason = if reason.is_empty() {
        "warned by admin".to_string()
    } else {
        reason
    };

    let now = Utc::now();
    state
        .warnings
        .add(chat_id.0, target_id.0, &reason, admin_id.0, now)
        .await?;
    let count = state.warnings.count(chat_id.0, target_id.0).await?;

    let config = state.configs.get(chat_id.0).await?;

    if count >= config.warn_limit {
        let ban_reason = format!("repeated violations ({count} warnings)");
        state
            .bans
            .add(
                chat_id.0,
                target_id.0,
                &ban_reason,
                admin_id.0,
                config.ban_duration_secs,
                now,
            )
            .await?;

        let mut request = bot.ban_chat_member(chat_id, target_id);
        if let Some(secs) = config.ban_duration_secs {
            request = request.until_date(now + chrono::Duration::seconds(secs as i64));
        }
        request.await?;

        let duration_text = match config.ban_duration_secs {
            Some(secs) => format!("for {}", format_duration(secs)),
            None => "permanently".to_string(),
        };
        bot.send_message(
            chat_id,
            format!(
                "\u{1F6AB} <a href=\"tg://user?id={}\">{}</a> reached the warning limit ({count}/{}) and has been banned {duration_text}.",
                target_id,
                html_escape(&target_name),
                config.warn_limit,
            ),
        )
        .parse_mode(ParseMode::Html)
        .await?;

        info!("User {} reached warn limit in chat {}, banned", target_id, chat_id);
    } else {
        bot.send_message(
            chat_id,
            format!(
                "\u{26A0} <a href=\"tg://user?id={}\">{}</a> has {count}/{} warning(s).\n<b>Reason:</b> {}",
                target_id,
                html_escape(&target_name),
                config.warn_limit,
                html_escape(&reason),
            ),
        )
        .parse_mode(ParseMode::Html)
        .await?;
    }

    Ok(())
}

/// Handle /unwarn command - clear all warnings for a user.
pub async fn unwarn_command(
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
            bot.send_message(chat_id, "Whose warnings should I clear? Reply or pass an ID.")
                .reply_parameters(ReplyParameters::new(msg.id))
                .await?;
            return Ok(());
        }
    };

    let removed = state.warnings.clear(chat_id.0, target_id.0).await?;

    let text = if removed > 0 {
        format!(
            "Cleared {removed} warning(s) for <a href=\"tg://user?id={}\">{}</a>.",
            target_id,
            html_escape(&target_name),
        )
    } else {
        format!(
            "<a href=\"tg://user?id={}\">{}</a> has no warnings.",
            target_id,
            html_escape(&target_name),
        )
    };
    bot.send_message(chat_id, text)
        .parse_mode(ParseMode::Html)
        .await?;

    Ok(())
}

/// Handle /warns command - show a user's warnings.
pub async fn warns_command(bot: ThrottledBot, msg: Message, state: AppState) -> anyhow::Result<()> {
    let chat_id = msg.chat.id;

    if !msg.chat.is_group() && !msg.chat.is_supergroup() {
        return Ok(());
    }

    let (target_id, target_name, _) = match get_target_from_msg(&msg) {
        Some(t) => t,
        None => {
            bot.send_message(chat_id, "Whose warnings? Reply to them or pass an ID.")
                .reply_parameters(ReplyParameters::new(msg.id))
                .await?;
            return Ok(());
        }
    };

    let warnings = state.warnings.list(chat_id.0, target_id.0).await?;
    let config = state.configs.get(chat_id.0).await?;

    if warnings.is_empty() {
        bot.send_message(
            chat_id,
            format!(
                "<a href=\"tg://user?id={}\">{}</a> has no warnings.",
                target_id,
                html_escape(&target_name),
            ),
        )
        .parse_mode(ParseMode::Html)
        .await?;
        return Ok(());
    }

    let mut text = format!(
        "<a href=\"tg://user?id={}\">{}</a> has {}/{} warning(s):\n",
        target_id,
        html_escape(&target_name),
        warnings.len(),
        config.warn_limit,
    );
    for record in warnings.iter().take(5) {
        text.push_str(&format!(
            "\u{2022} {} - {}\n",
            record.timestamp.format("%Y-%m-%d %H:%M"),
            html_escape(&record.reason),
        ));
    }
    if warnings.len() > 5 {
        text.push_str(&format!("... and {} more", warnings.len() - 5));
    }

    bot.send_message(chat_id, text)
        .parse_mode(ParseMode::Html)
        .await?;

    Ok(())
}

/// Handle /userstats command - warning count plus ban status.
pub async fn userstats_command(
    bot: ThrottledBot,
    msg: Message,
    state: AppState,
) -> anyhow::Result<()> {
    let chat_id = msg.chat.id;

    if !msg.chat.is_group() && !msg.chat.is_supergroup() {
        return Ok(());
    }

    let (target_id, target_name, _) = match get_target_from_msg(&msg) {
        Some(t) => t,
        None => {
            bot.send_message(chat_id, "Whose stats? Reply to them or pass an ID.")
                .reply_parameters(ReplyParameters::new(msg.id))
                .await?;
            return Ok(());
        }
    };

    let warn_count = state.warnings.count(chat_id.0, target_id.0).await?;
    let ban_status = state.bans.status(chat_id.0, target_id.0).await?;
    let config = state.configs.get(chat_id.0).await?;

    let ban_text = if !ban_status.active {
        "not banned".to_string()
    } else if ban_status.permanent {
        "banned permanently".to_string()
    } else {
        match ban_status.expiry {
            Some(expiry) => format!("banned until {}", expiry.format("%Y-%m-%d %H:%M UTC")),
            None => "banned".to_string(),
        }
    };

    bot.send_message(
        chat_id,
        format!(
            "\u{1F4CA} Stats for <a href=\"tg://user?id={}\">{}</a>:\n\u{2022} Warnings: {warn_count}/{}\n\u{2022} Ban status: {ban_text}",
            target_id,
            html_escape(&target_name),
            config.warn_limit,
        ),
    )
    .parse_mode(ParseMode::Html)
    .await?;

    Ok(())
}
