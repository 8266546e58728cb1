use async_trait::async_trait;
use serenity::model::id::{ChannelId, GuildId};
use songbird::{
    events::CoreEvent,
    input::Input,
    tracks::{PlayMode, TrackHandle},
    Call, Event, EventContext, EventHandler as VoiceEventHandler, Songbird, TrackEvent,
};
use std::{
    fmt::Display,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, info, warn};

use crate::error::{MusicError, MusicResult};

/// Opens voice connections for a guild.
#[async_trait]
pub trait VoiceSink: Send + Sync + 'static {
    type Connection: VoiceConnection;

    async fn join(&self, guild_id: GuildId, channel_id: ChannelId) -> MusicResult<Self::Connection>;
}

/// A joined voice channel, exclusively owned by one guild queue.
#[async_trait]
pub trait VoiceConnection: Send + Sync + 'static {
    type Stream: Send + 'static;
    type Playback: PlaybackHandle;

    /// Binds `stream` to the connection and starts it.
    ///
    /// `on_finish` must be fired exactly once when playback ends for any
    /// reason: natural end, [`PlaybackHandle::stop`] or a decode error.
    async fn play(&self, stream: Self::Stream, on_finish: CompletionSignal) -> MusicResult<Self::Playback>;

    async fn leave(&self);

    /// `false` once the voice driver lost the channel; the connection must
    /// then be left and joined again.
    fn is_connected(&self) -> bool {
        true
    }
}

pub trait PlaybackHandle: Send + Sync + 'static {
    /// Stops playback. The completion signal of the attempt still fires,
    /// even when the underlying track is already gone.
    fn stop(&self);
}

/// Fires `signal` when stopping failed, since no end event will follow.
pub fn finish_on_stop_error<E: Display>(result: Result<(), E>, signal: &CompletionSignal) {
    if let Err(e) = result {
        warn!("Track already gone, finishing {:?} directly: {}", signal.event(), e);
        signal.fire();
    }
}

/// Delivered to the completion loop once per play attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaybackFinished {
    pub guild_id: GuildId,
    pub attempt: u64,
}

pub type CompletionSender = mpsc::UnboundedSender<PlaybackFinished>;
pub type CompletionReceiver = mpsc::UnboundedReceiver<PlaybackFinished>;

/// One-shot completion callback of a play attempt.
///
/// Clones share the fired flag, so a natural end racing an explicit stop
/// still produces a single [`PlaybackFinished`].
#[derive(Clone)]
pub struct CompletionSignal {
    inner: Arc<SignalInner>,
}

struct SignalInner {
    fired: AtomicBool,
    event: PlaybackFinished,
    tx: CompletionSender,
}

impl CompletionSignal {
    pub fn new(event: PlaybackFinished, tx: CompletionSender) -> Self {
        Self {
            inner: Arc::new(SignalInner {
                fired: AtomicBool::new(false),
                event,
                tx,
            }),
        }
    }

    /// Returns `true` only for the call that actually delivered the event.
    pub fn fire(&self) -> bool {
        if self.inner.fired.swap(true, Ordering::AcqRel) {
            return false;
        }

        if self.inner.tx.send(self.inner.event).is_err() {
            debug!("Completion loop gone, dropping {:?}", self.inner.event);
        }

        true
    }

    #[cfg(test)]
    pub fn has_fired(&self) -> bool {
        self.inner.fired.load(Ordering::Acquire)
    }

    pub fn event(&self) -> PlaybackFinished {
        self.inner.event
    }
}

/// [`VoiceSink`] backed by songbird.
pub struct SongbirdVoice {
    manager: Arc<Songbird>,
}

impl SongbirdVoice {
    pub fn new(manager: Arc<Songbird>) -> Self {
        Self { manager }
    }
}

#[async_trait]
impl VoiceSink for SongbirdVoice {
    type Connection = SongbirdConnection;

    async fn join(&self, guild_id: GuildId, channel_id: ChannelId) -> MusicResult<SongbirdConnection> {
        info!("🔊 Joining voice channel {} in guild {}", channel_id, guild_id);

        let call = match self.manager.join(guild_id, channel_id).await {
            Ok(call) => call,
            Err(e) => {
                // songbird keeps the half-open call around otherwise
                if let Err(remove_err) = self.manager.remove(guild_id).await {
                    debug!("Nothing to release after failed join: {}", remove_err);
                }
                return Err(MusicError::Connection(e.to_string()));
            }
        };

        let link = Arc::new(LinkState::default());

        {
            let mut handler = call.lock().await;
            if let Err(e) = handler.deafen(true).await {
                warn!("Could not self-deafen in guild {}: {}", guild_id, e);
            }

            handler.add_global_event(
                Event::Core(CoreEvent::DriverDisconnect),
                DisconnectNotifier {
                    guild_id,
                    link: link.clone(),
                },
            );
        }

        Ok(SongbirdConnection {
            guild_id,
            manager: self.manager.clone(),
            call,
            link,
        })
    }
}

/// Liveness of a joined channel and the completion signal of the attempt
/// currently bound to it.
#[derive(Default)]
struct LinkState {
    lost: AtomicBool,
    current: Mutex<Option<CompletionSignal>>,
}

impl LinkState {
    async fn arm(&self, signal: CompletionSignal) {
        *self.current.lock().await = Some(signal);
    }

    /// Marks the link dead and finishes the bound attempt, if any.
    async fn lose(&self) -> bool {
        self.lost.store(true, Ordering::Release);

        match self.current.lock().await.take() {
            Some(signal) => signal.fire(),
            None => false,
        }
    }

    fn is_lost(&self) -> bool {
        self.lost.load(Ordering::Acquire)
    }
}

pub struct SongbirdConnection {
    guild_id: GuildId,
    manager: Arc<Songbird>,
    call: Arc<Mutex<Call>>,
    link: Arc<LinkState>,
}

#[async_trait]
impl VoiceConnection for SongbirdConnection {
    type Stream = Input;
    type Playback = SongbirdPlayback;

    async fn play(&self, stream: Input, on_finish: CompletionSignal) -> MusicResult<SongbirdPlayback> {
        let track_handle = {
            let mut handler = self.call.lock().await;
            handler.play_input(stream)
        };

        for event in [TrackEvent::End, TrackEvent::Error] {
            let notifier = TrackEndNotifier {
                signal: on_finish.clone(),
            };

            if let Err(e) = track_handle.add_event(Event::Track(event), notifier) {
                if let Err(stop_err) = track_handle.stop() {
                    debug!("Track already gone: {}", stop_err);
                }
                return Err(MusicError::Connection(format!(
                    "could not register track event handler: {}",
                    e
                )));
            }
        }

        self.link.arm(on_finish.clone()).await;

        Ok(SongbirdPlayback {
            track: track_handle,
            signal: on_finish,
        })
    }

    async fn leave(&self) {
        info!("👋 Leaving voice channel in guild {}", self.guild_id);

        if let Err(e) = self.manager.remove(self.guild_id).await {
            warn!("Error leaving voice channel in guild {}: {}", self.guild_id, e);
        }
    }

    fn is_connected(&self) -> bool {
        !self.link.is_lost()
    }
}

/// A songbird track plus the completion signal of its attempt.
pub struct SongbirdPlayback {
    track: TrackHandle,
    signal: CompletionSignal,
}

impl PlaybackHandle for SongbirdPlayback {
    fn stop(&self) {
        finish_on_stop_error(self.track.stop(), &self.signal);
    }
}

/// Finishes the bound attempt when the driver loses the channel.
struct DisconnectNotifier {
    guild_id: GuildId,
    link: Arc<LinkState>,
}

#[async_trait]
impl VoiceEventHandler for DisconnectNotifier {
    async fn act(&self, ctx: &EventContext<'_>) -> Option<Event> {
        if let EventContext::DriverDisconnect(data) = ctx {
            warn!(
                "🔌 Voice driver disconnected in guild {}: {:?}",
                self.guild_id, data.reason
            );
        }

        if self.link.lose().await {
            debug!("Finished the playing attempt in guild {} after disconnect", self.guild_id);
        }

        None
    }
}

/// Fires the attempt's completion signal on track end or error, then
/// deregisters itself.
struct TrackEndNotifier {
    signal: CompletionSignal,
}

#[async_trait]
impl VoiceEventHandler for TrackEndNotifier {
    async fn act(&self, ctx: &EventContext<'_>) -> Option<Event> {
        if let EventContext::Track(track_list) = ctx {
            for (state, handle) in *track_list {
                if let PlayMode::Errored(e) = &state.playing {
                    warn!("Track {} errored during playback: {}", handle.uuid(), e);
                }
            }
        }

        if self.signal.fire() {
            debug!("🏁 Playback finished: {:?}", self.signal.event());
        }

        Some(Event::Cancel)
    }
}
