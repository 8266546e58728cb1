use serenity::model::id::ChannelId;
use std::{collections::VecDeque, time::Duration};
use tracing::{debug, info};

use super::voice::VoiceConnection;
use crate::{
    error::{MusicError, MusicResult},
    sources::{format_duration, TrackCandidate},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Song {
    pub title: String,
    pub url: String,
    pub duration: Option<Duration>,
    pub requested_by: String,
}

impl Song {
    pub fn from_candidate(candidate: TrackCandidate, requested_by: impl Into<String>) -> Self {
        Self {
            title: candidate.title,
            url: candidate.url,
            duration: candidate.duration,
            requested_by: requested_by.into(),
        }
    }

    pub fn duration_label(&self) -> String {
        self.duration
            .map(format_duration)
            .unwrap_or_else(|| "LIVE".to_string())
    }
}

/// Read-only view of a queue: the head plus the pending songs in play order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueSnapshot {
    pub now_playing: Song,
    pub pending: Vec<Song>,
}

/// One guild's songs, voice connection and current playback.
///
/// `songs[0]` is the song playing (or about to play). Songs are only ever
/// appended at the tail or removed, never reordered.
pub struct GuildQueue<C: VoiceConnection> {
    songs: VecDeque<Song>,
    text_channel: ChannelId,
    voice_channel: ChannelId,
    connection: Option<C>,
    playback: Option<C::Playback>,
    attempt: Option<u64>,
    closed: bool,
}

impl<C: VoiceConnection> GuildQueue<C> {
    pub fn new(text_channel: ChannelId, voice_channel: ChannelId) -> Self {
        Self {
            songs: VecDeque::new(),
            text_channel,
            voice_channel,
            connection: None,
            playback: None,
            attempt: None,
            closed: false,
        }
    }

    /// Appends a song and returns its index (0 = it became the head).
    pub fn push(&mut self, song: Song) -> usize {
        info!("➕ Queued: {}", song.title);
        self.songs.push_back(song);
        self.songs.len() - 1
    }

    pub fn head(&self) -> Option<&Song> {
        self.songs.front()
    }

    pub fn pop_head(&mut self) -> Option<Song> {
        self.songs.pop_front()
    }

    pub fn pending(&self) -> impl Iterator<Item = &Song> {
        self.songs.iter().skip(1)
    }

    /// Removes the pending song at 1-based `position`. The head is untouchable.
    pub fn cancel(&mut self, position: usize) -> MusicResult<Song> {
        if position == 0 || position >= self.songs.len() {
            return Err(MusicError::InvalidPosition(position));
        }

        let removed = self
            .songs
            .remove(position)
            .ok_or(MusicError::InvalidPosition(position))?;

        debug!("🗑️ Removed {} from position {}", removed.title, position);
        Ok(removed)
    }

    pub fn snapshot(&self) -> Option<QueueSnapshot> {
        let now_playing = self.head()?.clone();

        Some(QueueSnapshot {
            now_playing,
            pending: self.pending().cloned().collect(),
        })
    }

    pub fn len(&self) -> usize {
        self.songs.len()
    }

    pub fn text_channel(&self) -> ChannelId {
        self.text_channel
    }

    pub fn voice_channel(&self) -> ChannelId {
        self.voice_channel
    }

    pub fn connection(&self) -> Option<&C> {
        self.connection.as_ref()
    }

    pub fn set_connection(&mut self, connection: C) {
        self.connection = Some(connection);
    }

    pub fn take_connection(&mut self) -> Option<C> {
        self.connection.take()
    }

    pub fn set_playback(&mut self, playback: C::Playback) {
        self.playback = Some(playback);
    }

    pub fn take_playback(&mut self) -> Option<C::Playback> {
        self.playback.take()
    }

    /// Marks `attempt` as the only one whose completion may advance the queue.
    pub fn begin_attempt(&mut self, attempt: u64) {
        self.attempt = Some(attempt);
    }

    pub fn is_current_attempt(&self, attempt: u64) -> bool {
        self.attempt == Some(attempt)
    }

    /// Set once the queue drained; a closed queue is never reused.
    pub fn close(&mut self) {
        self.closed = true;
        self.attempt = None;
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}
