//! Target resolution for admin commands.
//!
//! Resolves the user an admin command applies to, from a reply, a numeric
//! ID argument, or a text-mention entity.

use teloxide::types::{Message, MessageEntityKind, UserId};

/// Get the target user from a command message.
///
/// Returns `(user_id, display_name, skip_words)` where `skip_words` is the
/// number of arguments consumed by the target reference (0 for a reply).
///
/// Resolution order:
/// 1. Reply message -> use `reply.from`
/// 2. Numeric ID argument
/// 3. TextMention entity near the command
pub fn get_target_from_msg(msg: &Message) -> Option<(UserId, String, usize)> {
    if let Some(reply) = msg.reply_to_message()
        && let Some(user) = &reply.from
    {
        return Some((user.id, user.first_name.clone(), 0));
    }

    let text = msg.text()?;
    let parts: Vec<&str> = text.split_whitespace().collect();
    if parts.len() < 2 {
        return None;
    }

    if let Ok(id) = parts[1].parse::<u64>() {
        return Some((UserId(id), format!("User {}", id), 1));
    }

    if let Some(entities) = msg.entities() {
        for entity in entities {
            if let MessageEntityKind::TextMention { user } = &entity.kind {
                // Only consider entities near the command (first 20 chars)
                if entity.offset < 20 {
                    return Some((user.id, user.first_name.clone(), 1));
                }
            }
        }
    }

    None
}
