//! Start and help command handlers.

use teloxide::prelude::*;
use teloxide::types::ParseMode;

use crate::bot::dispatcher::{AppState, ThrottledBot};

const HELP_TEXT: &str = "\
<b>Moderation</b>
/warn - warn a user (reply or ID)
/unwarn - clear a user's warnings
/warns - show a user's warnings
/userstats - show a user's moderation stats
/ban, /tban, /unban, /kick - ban management
/mute, /unmute - mute management

<b>Settings</b> (admins)
/setwarnlimit &lt;n&gt; - warnings before a ban
/setbanduration &lt;duration|permanent&gt; - automatic ban length
/setfloodlimit &lt;msgs&gt; &lt;seconds&gt; - flood threshold
/toggleai - toggle content moderation
/config - show current settings
/setwelcome &lt;text&gt; - welcome message ({mention}, {first}, {chatname})
/setrules &lt;text&gt; - chat rules

<b>Everyone</b>
/rules - show the chat rules";

/// Handle /start command.
pub async fn start_command(
    bot: ThrottledBot,
    msg: Message,
    _state: AppState,
) -> anyhow::Result<()> {
    bot.send_message(
        msg.chat.id,
        "Hi! I keep group chats civil: content checks, flood control, and \
         warning escalation.\n\nAdd me to a group as admin and use /help to \
         see the commands.",
    )
    .await?;
    Ok(())
}

/// Handle /help command.
pub async fn help_command(bot: ThrottledBot, msg: Message, _state: AppState) -> anyhow::Result<()> {
    bot.send_message(msg.chat.id, HELP_TEXT)
        .parse_mode(ParseMode::Html)
        .await?;
    Ok(())
}
