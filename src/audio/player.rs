use dashmap::DashMap;
use serenity::model::id::{ChannelId, GuildId};
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, info, warn};

use super::{
    notice::{Notice, Notifier},
    queue::{GuildQueue, QueueSnapshot, Song},
    voice::{
        CompletionReceiver, CompletionSender, CompletionSignal, PlaybackFinished, PlaybackHandle,
        VoiceConnection, VoiceSink,
    },
};
use crate::{
    error::{MusicError, MusicResult},
    sources::StreamSource,
};

/// Stream type the voice sink of `V` accepts.
pub type StreamOf<V> = <<V as VoiceSink>::Connection as VoiceConnection>::Stream;
type PlaybackOf<V> = <<V as VoiceSink>::Connection as VoiceConnection>::Playback;
type SharedQueue<V> = Arc<Mutex<GuildQueue<<V as VoiceSink>::Connection>>>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Enqueued {
    /// The song became the head and its playback was attempted.
    Started,
    /// Appended behind the head at this 1-based pending position.
    Queued { position: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipOutcome {
    /// `next` starts once the stopped track reports its end.
    Advancing { next: Song },
    /// Nothing was pending; the queue drains.
    Stopping,
}

/// Owns every guild's queue and drives playback.
///
/// Each guild's operations are serialized by that guild's mutex; the map is
/// the only structure shared between guilds. Entries appear on the first
/// enqueue and disappear when the queue drains.
pub struct QueueRegistry<S, V: VoiceSink> {
    queues: DashMap<GuildId, SharedQueue<V>>,
    streams: S,
    voice: V,
    notifier: Arc<dyn Notifier>,
    completions: CompletionSender,
    attempts: AtomicU64,
    max_queue_size: usize,
}

impl<S, V> QueueRegistry<S, V>
where
    S: StreamSource<Stream = StreamOf<V>>,
    V: VoiceSink,
{
    /// Returns the registry and the receiving end of its completion events,
    /// to be handed to [`QueueRegistry::run_completions`].
    pub fn new(
        streams: S,
        voice: V,
        notifier: Arc<dyn Notifier>,
        max_queue_size: usize,
    ) -> (Self, CompletionReceiver) {
        let (completions, rx) = mpsc::unbounded_channel();

        let registry = Self {
            queues: DashMap::new(),
            streams,
            voice,
            notifier,
            completions,
            attempts: AtomicU64::new(0),
            max_queue_size,
        };

        (registry, rx)
    }

    pub fn get(&self, guild_id: GuildId) -> Option<SharedQueue<V>> {
        self.queues.get(&guild_id).map(|entry| entry.value().clone())
    }

    #[cfg(test)]
    pub fn contains(&self, guild_id: GuildId) -> bool {
        self.queues.contains_key(&guild_id)
    }

    #[cfg(test)]
    pub fn active_guilds(&self) -> usize {
        self.queues.len()
    }

    /// Drops the guild's entry if it is still `handle`. Removing an absent
    /// guild, or one that already holds a newer queue, is a no-op.
    fn remove_if_current(&self, guild_id: GuildId, handle: &SharedQueue<V>) -> bool {
        self.queues
            .remove_if(&guild_id, |_, current| Arc::ptr_eq(current, handle))
            .is_some()
    }

    fn get_or_create(&self, guild_id: GuildId, text_channel: ChannelId, voice_channel: ChannelId) -> SharedQueue<V> {
        self.queues
            .entry(guild_id)
            .or_insert_with(|| {
                debug!("Creating queue for guild {}", guild_id);
                Arc::new(Mutex::new(GuildQueue::new(text_channel, voice_channel)))
            })
            .value()
            .clone()
    }

    /// Adds `song` to the guild's queue, starting playback if it was empty.
    ///
    /// The caller has already checked that the requester is in
    /// `voice_channel`. Notices go to the text channel of the request that
    /// created the queue.
    pub async fn enqueue(
        &self,
        guild_id: GuildId,
        text_channel: ChannelId,
        voice_channel: ChannelId,
        song: Song,
    ) -> MusicResult<Enqueued> {
        loop {
            let handle = self.get_or_create(guild_id, text_channel, voice_channel);
            let mut queue = handle.lock().await;

            // Drained while we waited for the lock; its entry is already gone.
            if queue.is_closed() {
                continue;
            }

            if queue.len() >= self.max_queue_size {
                return Err(MusicError::QueueFull(self.max_queue_size));
            }

            let position = queue.push(song.clone());
            if position == 0 {
                self.start_playback(guild_id, &handle, &mut queue).await;
                return Ok(Enqueued::Started);
            }

            self.notifier
                .notify(queue.text_channel(), Notice::Queued { song, position })
                .await;

            return Ok(Enqueued::Queued { position });
        }
    }

    /// Stops the current song. The queue advances through the same
    /// completion path as a natural end.
    pub async fn skip(&self, guild_id: GuildId) -> MusicResult<SkipOutcome> {
        let handle = self.get(guild_id).ok_or(MusicError::NothingPlaying)?;
        let mut queue = handle.lock().await;

        if queue.is_closed() {
            return Err(MusicError::NothingPlaying);
        }

        let playback = queue.take_playback().ok_or(MusicError::NothingPlaying)?;

        let outcome = match queue.pending().next() {
            Some(next) => SkipOutcome::Advancing { next: next.clone() },
            None => SkipOutcome::Stopping,
        };

        info!("⏭️ Skipping in guild {}: {:?}", guild_id, outcome);
        playback.stop();

        Ok(outcome)
    }

    /// Removes the pending song at 1-based `position`.
    pub async fn cancel(&self, guild_id: GuildId, position: usize) -> MusicResult<Song> {
        let handle = self.get(guild_id).ok_or(MusicError::InvalidPosition(position))?;
        let mut queue = handle.lock().await;

        if queue.is_closed() {
            return Err(MusicError::InvalidPosition(position));
        }

        queue.cancel(position)
    }

    pub async fn snapshot(&self, guild_id: GuildId) -> MusicResult<QueueSnapshot> {
        let handle = self.get(guild_id).ok_or(MusicError::NothingPlaying)?;
        let queue = handle.lock().await;

        queue.snapshot().ok_or(MusicError::NothingPlaying)
    }

    /// Advances the queue when the current attempt's playback finished.
    ///
    /// Events of older attempts or of drained queues are ignored.
    pub async fn on_playback_finished(&self, event: PlaybackFinished) {
        let Some(handle) = self.get(event.guild_id) else {
            debug!("Ignoring completion for inactive guild: {:?}", event);
            return;
        };

        let mut queue = handle.lock().await;

        if queue.is_closed() || !queue.is_current_attempt(event.attempt) {
            debug!("Ignoring stale completion: {:?}", event);
            return;
        }

        queue.take_playback();
        if let Some(finished) = queue.pop_head() {
            debug!("✅ Finished {} in guild {}", finished.title, event.guild_id);
        }

        self.start_playback(event.guild_id, &handle, &mut queue).await;
    }

    /// Feeds completion events back into the registry, one task per event.
    pub async fn run_completions(self: Arc<Self>, mut rx: CompletionReceiver) {
        while let Some(event) = rx.recv().await {
            let registry = Arc::clone(&self);
            tokio::spawn(async move {
                registry.on_playback_finished(event).await;
            });
        }

        debug!("Completion channel closed");
    }

    /// Plays the head, skipping every song that cannot be played, and
    /// drains the queue when nothing is left.
    async fn start_playback(
        &self,
        guild_id: GuildId,
        handle: &SharedQueue<V>,
        queue: &mut GuildQueue<V::Connection>,
    ) {
        while let Some(song) = queue.head().cloned() {
            let attempt = self.attempts.fetch_add(1, Ordering::Relaxed) + 1;
            queue.begin_attempt(attempt);

            match self.try_play(guild_id, attempt, &song, queue).await {
                Ok(playback) => {
                    queue.set_playback(playback);
                    info!("🎵 Now playing in guild {}: {}", guild_id, song.title);
                    self.notifier
                        .notify(queue.text_channel(), Notice::NowPlaying(song))
                        .await;
                    return;
                }
                Err(e) => {
                    warn!("Skipping {} in guild {}: {}", song.title, guild_id, e);
                    queue.pop_head();
                    self.notifier
                        .notify(
                            queue.text_channel(),
                            Notice::StreamFailed {
                                song,
                                reason: e.to_string(),
                            },
                        )
                        .await;
                }
            }
        }

        self.drain(guild_id, handle, queue).await;
    }

    /// One retry-free attempt: resolve, join lazily, bind.
    async fn try_play(
        &self,
        guild_id: GuildId,
        attempt: u64,
        song: &Song,
        queue: &mut GuildQueue<V::Connection>,
    ) -> MusicResult<PlaybackOf<V>> {
        let stream = self.streams.resolve(&song.url).await?;

        if queue.connection().is_some_and(|connection| !connection.is_connected()) {
            warn!("Voice connection lost in guild {}, rejoining", guild_id);
            if let Some(stale) = queue.take_connection() {
                stale.leave().await;
            }
        }

        if queue.connection().is_none() {
            let connection = self.voice.join(guild_id, queue.voice_channel()).await?;
            queue.set_connection(connection);
        }

        let connection = queue
            .connection()
            .ok_or_else(|| MusicError::Connection("voice connection missing".to_string()))?;

        let signal = CompletionSignal::new(PlaybackFinished { guild_id, attempt }, self.completions.clone());

        match connection.play(stream, signal).await {
            Ok(playback) => Ok(playback),
            Err(e) => {
                if let Some(connection) = queue.take_connection() {
                    connection.leave().await;
                }
                Err(e)
            }
        }
    }

    async fn drain(&self, guild_id: GuildId, handle: &SharedQueue<V>, queue: &mut GuildQueue<V::Connection>) {
        queue.close();
        queue.take_playback();

        if let Some(connection) = queue.take_connection() {
            connection.leave().await;
        }

        if !self.remove_if_current(guild_id, handle) {
            debug!("Queue entry for guild {} was already replaced", guild_id);
        }

        info!("⏹️ Queue finished for guild {}", guild_id);
        self.notifier.notify(queue.text_channel(), Notice::Finished).await;
    }
}
