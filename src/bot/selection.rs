use serenity::{
    collector::MessageCollector,
    model::{channel::Message, id::UserId},
    prelude::Context,
};
use std::time::Duration;
use tracing::debug;

use crate::error::{MusicError, MusicResult};

/// Parses a disambiguation reply: exactly one digit in `1..=count`.
///
/// Returns the 0-based index of the chosen candidate.
pub fn parse_selection(content: &str, count: usize) -> MusicResult<usize> {
    let trimmed = content.trim();

    let mut chars = trimmed.chars();
    let digit = match (chars.next(), chars.next()) {
        (Some(c), None) => c.to_digit(10),
        _ => None,
    };

    match digit.map(|d| d as usize) {
        Some(n) if (1..=count).contains(&n) => Ok(n - 1),
        _ => Err(MusicError::InvalidSelection(trimmed.to_string())),
    }
}

/// Waits for `author` to answer in the channel of `prompt` with a valid
/// number. Anything else they or others write is ignored.
pub async fn await_selection(
    ctx: &Context,
    prompt: &Message,
    author: UserId,
    count: usize,
    timeout: Duration,
) -> MusicResult<usize> {
    let reply = MessageCollector::new(&ctx.shard)
        .author_id(author)
        .channel_id(prompt.channel_id)
        .timeout(timeout)
        .filter(move |message| parse_selection(&message.content, count).is_ok())
        .next()
        .await;

    match reply {
        Some(message) => {
            debug!("{} picked {:?}", message.author.name, message.content);
            parse_selection(&message.content, count)
        }
        None => Err(MusicError::SelectionTimeout),
    }
}
