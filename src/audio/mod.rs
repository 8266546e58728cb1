//! # Audio Module
//!
//! Per-guild playback queues.
//!
//! - [`queue`]: songs of one guild plus its voice connection and current playback
//! - [`player`]: [`player::QueueRegistry`], which owns every guild's queue and
//!   advances it when a song ends, is skipped or cannot be played
//! - [`voice`]: the voice sink traits, the one-shot completion signal and the
//!   songbird implementation
//! - [`notice`]: what the queue reports back to the guild's text channel
//!
//! Playback never recurses: every finished song produces one
//! [`voice::PlaybackFinished`] event, which the completion loop turns into a
//! fresh advance task.

pub mod notice;
pub mod player;
pub mod queue;
pub mod voice;

#[cfg(test)]
pub mod testing;
