//! Embeds for every message the bot posts.

pub mod embeds;
