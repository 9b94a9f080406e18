//! Plugin system for command handlers.
//!
//! Add new plugins by:
//! 1. Creating a new file in this directory
//! 2. Adding `pub mod your_plugin;` below
//! 3. Adding the handler to `command_handler()`

pub mod ban;
pub mod mute;
pub mod rules;
pub mod settings;
pub mod start;
pub mod warn;

use teloxide::dispatching::UpdateHandler;
use teloxide::prelude::*;
use teloxide::utils::command::BotCommands;

/// All bot commands.
#[derive(BotCommands, Clone)]
#[command(rename_rule = "lowercase", description = "Available commands:")]
pub enum Command {
    #[command(description = "Start the bot")]
    Start,

    #[command(description = "Show help")]
    Help,

    // Warning commands
    #[command(description = "Warn a user")]
    Warn,

    #[command(description = "Clear a user's warnings")]
    Unwarn,

    #[command(description = "Show a user's warnings")]
    Warns,

    #[command(description = "Show a user's moderation stats")]
    Userstats,

    // Ban commands
    #[command(description = "Ban a user")]
    Ban,

    #[command(description = "Temporarily ban a user")]
    Tban,

    #[command(description = "Unban a user")]
    Unban,

    #[command(description = "Kick a user")]
    Kick,

    // Mute commands
    #[command(description = "Mute a user")]
    Mute,

    #[command(description = "Unmute a user")]
    Unmute,

    // Settings commands
    #[command(description = "Set the warning limit")]
    Setwarnlimit,

    #[command(description = "Set the automatic ban duration")]
    Setbanduration,

    #[command(description = "Set the flood limit")]
    Setfloodlimit,

    #[command(description = "Toggle content moderation")]
    Toggleai,

    #[command(description = "Show the chat's moderation config")]
    Config,

    #[command(description = "Set the welcome message")]
    Setwelcome,

    // Rules commands
    #[command(description = "Show the chat rules")]
    Rules,

    #[command(description = "Set the chat rules")]
    Setrules,
}

/// Build the combined command handler.
pub fn command_handler() -> UpdateHandler<anyhow::Error> {
    use dptree::case;

    teloxide::filter_command::<Command, _>()
        .branch(case![Command::Start].endpoint(start::start_command))
        .branch(case![Command::Help].endpoint(start::help_command))
        // Warnings
        .branch(case![Command::Warn].endpoint(warn::warn_command))
        .branch(case![Command::Unwarn].endpoint(warn::unwarn_command))
        .branch(case![Command::Warns].endpoint(warn::warns_command))
        .branch(case![Command::Userstats].endpoint(warn::userstats_command))
        // Bans
        .branch(case![Command::Ban].endpoint(ban::ban_command))
        .branch(case![Command::Tban].endpoint(ban::tban_command))
        .branch(case![Command::Unban].endpoint(ban::unban_command))
        .branch(case![Command::Kick].endpoint(ban::kick_command))
        // Mutes
        .branch(case![Command::Mute].endpoint(mute::mute_command))
        .branch(case![Command::Unmute].endpoint(mute::unmute_command))
        // Settings
        .branch(case![Command::Setwarnlimit].endpoint(settings::setwarnlimit_command))
        .branch(case![Command::Setbanduration].endpoint(settings::setbanduration_command))
        .branch(case![Command::Setfloodlimit].endpoint(settings::setfloodlimit_command))
        .branch(case![Command::Toggleai].endpoint(settings::toggleai_command))
        .branch(case![Command::Config].endpoint(settings::config_command))
        .branch(case![Command::Setwelcome].endpoint(settings::setwelcome_command))
        // Rules
        .branch(case![Command::Rules].endpoint(rules::rules_command))
        .branch(case![Command::Setrules].endpoint(rules::setrules_command))
}
