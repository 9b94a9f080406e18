//! Event handler system.
//!
//! Add new event handlers by:
//! 1. Creating a new file in this directory
//! 2. Adding `pub mod your_event;` below
//! 3. Adding the handler to `event_handler()` or `message_event_handler()`

pub mod moderation;
pub mod welcome;

use teloxide::dispatching::UpdateHandler;
use teloxide::prelude::*;

/// Build the combined event handler for chat member updates.
pub fn event_handler() -> UpdateHandler<anyhow::Error> {
    dptree::entry().branch(welcome::handler())
}

/// Build the message event handler.
///
/// Runs the moderation pipeline on every ordinary group message.
pub fn message_event_handler() -> UpdateHandler<anyhow::Error> {
    dptree::filter(|msg: Message| msg.chat.is_group() || msg.chat.is_supergroup())
        .endpoint(moderation::moderate_message)
}
