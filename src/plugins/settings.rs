//! Settings command handlers.
//!
//! All per-chat config changes funnel through `ChatConfigPatch`, which is
//! validated here at the command boundary. The moderation engine trusts any
//! stored config.

use teloxide::prelude::*;
use teloxide::types::{ParseMode, ReplyParameters, UserId};
use tracing::info;

use crate::bot::dispatcher::{AppState, ThrottledBot};
use crate::database::models::ChatConfigPatch;
use crate::utils::{format_duration, parse_duration};

/// Check the caller can change chat settings, replying if not.
async fn ensure_settings_permission(
    bot: &ThrottledBot,
    msg: &Message,
    state: &AppState,
) -> anyhow::Result<bool> {
    if !msg.chat.is_group() && !msg.chat.is_supergroup() {
        return Ok(false);
    }

    let admin_id = msg.from.as_ref().map(|u| u.id).unwrap_or(UserId(0));
    if state
        .permissions
        .can_change_info(msg.chat.id, admin_id)
        .await
        .unwrap_or(false)
    {
        return Ok(true);
    }

    bot.send_message(msg.chat.id, "You need the change-info permission for that.")
        .reply_parameters(ReplyParameters::new(msg.id))
        .await?;
    Ok(false)
}

/// Apply a patch after validation, replying with the validation error if any.
async fn apply_patch(
    bot: &ThrottledBot,
    msg: &Message,
    state: &AppState,
    patch: ChatConfigPatch,
    confirmation: String,
) -> anyhow::Result<()> {
    if let Err(e) = patch.validate() {
        bot.send_message(msg.chat.id, format!("\u{274C} {e}"))
            .reply_parameters(ReplyParameters::new(msg.id))
            .await?;
        return Ok(());
    }

    state.configs.update(msg.chat.id.0, patch).await?;
    info!("Updated config for chat {}", msg.chat.id);

    bot.send_message(msg.chat.id, confirmation).await?;
    Ok(())
}

fn arg(msg: &Message, index: usize) -> Option<&str> {
    msg.text()?.split_whitespace().nth(index)
}

/// Handle /setwarnlimit command.
pub async fn setwarnlimit_command(
    bot: ThrottledBot,
    msg: Message,
    state: AppState,
) -> anyhow::Result<()> {
    if !ensure_settings_permission(&bot, &msg, &state).await? {
        return Ok(());
    }

    let limit = match arg(&msg, 1).and_then(|a| a.parse::<u32>().ok()) {
        Some(n) => n,
        None => {
            bot.send_message(msg.chat.id, "Usage: /setwarnlimit <number>")
                .reply_parameters(ReplyParameters::new(msg.id))
                .await?;
            return Ok(());
        }
    };

    let patch = ChatConfigPatch {
        warn_limit: Some(limit),
        ..Default::default()
    };
    apply_patch(
        &bot,
        &msg,
        &state,
        patch,
        format!("Warning limit set to {limit}."),
    )
    .await
}

/// Handle /setbanduration command.
pub async fn setbanduration_command(
    bot: ThrottledBot,
    msg: Message,
    state: AppState,
) -> anyhow::Result<()> {
    if !ensure_settings_permission(&bot, &msg, &state).await? {
        return Ok(());
    }

    let (duration, confirmation) = match arg(&msg, 1) {
        Some("permanent") => (None, "Automatic bans are now permanent.".to_string()),
        Some(raw) => match parse_duration(raw) {
            Some(d) => {
                let secs = d.as_secs();
                (
                    Some(secs),
                    format!("Automatic bans now last {}.", format_duration(secs)),
                )
            }
            None => {
                bot.send_message(
                    msg.chat.id,
                    "Usage: /setbanduration <duration|permanent> (e.g. /setbanduration 1h)",
                )
                .reply_parameters(ReplyParameters::new(msg.id))
                .await?;
                return Ok(());
            }
        },
        None => {
            bot.send_message(msg.chat.id, "Usage: /setbanduration <duration|permanent>")
                .reply_parameters(ReplyParameters::new(msg.id))
                .await?;
            return Ok(());
        }
    };

    let patch = ChatConfigPatch {
        ban_duration_secs: Some(duration),
        ..Default::default()
    };
    apply_patch(&bot, &msg, &state, patch, confirmation).await
}

/// Handle /setfloodlimit command.
pub async fn setfloodlimit_command(
    bot: ThrottledBot,
    msg: Message,
    state: AppState,
) -> anyhow::Result<()> {
    if !ensure_settings_permission(&bot, &msg, &state).await? {
        return Ok(());
    }

    let threshold = arg(&msg, 1).and_then(|a| a.parse::<u32>().ok());
    let window = arg(&msg, 2).and_then(|a| a.parse::<u32>().ok());

    let (threshold, window) = match (threshold, window) {
        (Some(t), Some(w)) => (t, w),
        _ => {
            bot.send_message(
                msg.chat.id,
                "Usage: /setfloodlimit <messages> <seconds> (e.g. /setfloodlimit 5 10)",
            )
            .reply_parameters(ReplyParameters::new(msg.id))
            .await?;
            return Ok(());
        }
    };

    let patch = ChatConfigPatch {
        flood_threshold: Some(threshold),
        flood_window_secs: Some(window),
        ..Default::default()
    };
    apply_patch(
        &bot,
        &msg,
        &state,
        patch,
        format!("Flood limit set to {threshold} messages per {window}s."),
    )
    .await
}

/// Handle /toggleai command.
pub async fn toggleai_command(
    bot: ThrottledBot,
    msg: Message,
    state: AppState,
) -> anyhow::Result<()> {
    if !ensure_settings_permission(&bot, &msg, &state).await? {
        return Ok(());
    }

    let config = state.configs.get(msg.chat.id.0).await?;
    let enabled = !config.ai_moderation_enabled;

    let patch = ChatConfigPatch {
        ai_moderation_enabled: Some(enabled),
        ..Default::default()
    };
    let confirmation = if enabled {
        "Content moderation enabled.".to_string()
    } else {
        "Content moderation disabled. Flood control stays active.".to_string()
    };
    apply_patch(&bot, &msg, &state, patch, confirmation).await
}

/// Handle /config command - show current settings.
pub async fn config_command(
    bot: ThrottledBot,
    msg: Message,
    state: AppState,
) -> anyhow::Result<()> {
    if !ensure_settings_permission(&bot, &msg, &state).await? {
        return Ok(());
    }

    let config = state.configs.get(msg.chat.id.0).await?;

    let ban_duration = match config.ban_duration_secs {
        Some(secs) => format_duration(secs),
        None => "permanent".to_string(),
    };
    let text = format!(
        "\u{2699} <b>Moderation settings</b>\n\
         \u{2022} Warning limit: {}\n\
         \u{2022} Ban duration: {}\n\
         \u{2022} Content moderation: {}\n\
         \u{2022} Flood limit: {} messages per {}s\n\
         \u{2022} Delete flagged spam: {}\n\
         \u{2022} Rules set: {}\n\
         \u{2022} Welcome message set: {}",
        config.warn_limit,
        ban_duration,
        if config.ai_moderation_enabled { "on" } else { "off" },
        config.flood_threshold,
        config.flood_window_secs,
        if config.auto_delete_spam { "yes" } else { "no" },
        if config.rules.is_some() { "yes" } else { "no" },
        if config.welcome_text.is_some() { "yes" } else { "no" },
    );

    bot.send_message(msg.chat.id, text)
        .parse_mode(ParseMode::Html)
        .await?;
    Ok(())
}

/// Handle /setwelcome command. No text clears the welcome message.
pub async fn setwelcome_command(
    bot: ThrottledBot,
    msg: Message,
    state: AppState,
) -> anyhow::Result<()> {
    if !ensure_settings_permission(&bot, &msg, &state).await? {
        return Ok(());
    }

    let text = msg.text().unwrap_or("");
    let welcome = text
        .split_once(char::is_whitespace)
        .map(|(_, rest)| rest.trim().to_string())
        .filter(|s| !s.is_empty());

    let confirmation = if welcome.is_some() {
        "Welcome message saved.".to_string()
    } else {
        "Welcome message cleared.".to_string()
    };
    let patch = ChatConfigPatch {
        welcome_text: Some(welcome),
        ..Default::default()
    };
    apply_patch(&bot, &msg, &state, patch, confirmation).await
}
