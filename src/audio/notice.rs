use async_trait::async_trait;
use serenity::model::id::ChannelId;

use super::queue::Song;

/// Something the queue wants the guild's text channel to know.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    NowPlaying(Song),
    /// Appended behind the head; `position` is the 1-based pending position.
    Queued { song: Song, position: usize },
    /// The song was skipped because it could not be played.
    StreamFailed { song: Song, reason: String },
    /// The queue drained and the bot left the voice channel.
    Finished,
}

/// Delivers queue notices. Failures are the implementor's to log.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, channel_id: ChannelId, notice: Notice);
}
