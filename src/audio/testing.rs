//! In-memory collaborators for exercising the queue without Discord.

use async_trait::async_trait;
use serenity::model::id::{ChannelId, GuildId};
use std::{
    collections::HashSet,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex,
    },
};

use super::{
    notice::{Notice, Notifier},
    queue::Song,
    voice::{finish_on_stop_error, CompletionSignal, PlaybackHandle, VoiceConnection, VoiceSink},
};
use crate::{
    error::{MusicError, MusicResult},
    sources::StreamSource,
};

pub fn song(title: &str) -> Song {
    Song {
        title: title.to_string(),
        url: format!("https://www.youtube.com/watch?v={}", title),
        duration: None,
        requested_by: "tester".to_string(),
    }
}

#[derive(Clone, Default)]
pub struct FakeStreams {
    failing: Arc<Mutex<HashSet<String>>>,
    resolved: Arc<Mutex<Vec<String>>>,
}

impl FakeStreams {
    pub fn fail(&self, song: &Song) {
        self.failing.lock().unwrap().insert(song.url.clone());
    }

    /// Every locator `resolve` was called with, in order.
    pub fn resolved(&self) -> Vec<String> {
        self.resolved.lock().unwrap().clone()
    }
}

#[async_trait]
impl StreamSource for FakeStreams {
    type Stream = String;

    async fn resolve(&self, locator: &str) -> MusicResult<String> {
        self.resolved.lock().unwrap().push(locator.to_string());

        if self.failing.lock().unwrap().contains(locator) {
            return Err(MusicError::StreamResolution(format!("{} is gone", locator)));
        }

        Ok(locator.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VoiceOp {
    Joined(ChannelId),
    Played(String),
    Stopped(String),
    Left,
}

#[derive(Clone, Default)]
pub struct FakeVoice {
    ops: Arc<Mutex<Vec<VoiceOp>>>,
    signals: Arc<Mutex<Vec<CompletionSignal>>>,
    links: Arc<Mutex<Vec<Arc<AtomicBool>>>>,
    fail_join: Arc<AtomicBool>,
    fail_play: Arc<Mutex<HashSet<String>>>,
    track_gone: Arc<AtomicBool>,
}

impl FakeVoice {
    pub fn ops(&self) -> Vec<VoiceOp> {
        self.ops.lock().unwrap().clone()
    }

    pub fn played(&self) -> Vec<String> {
        self.ops()
            .into_iter()
            .filter_map(|op| match op {
                VoiceOp::Played(url) => Some(url),
                _ => None,
            })
            .collect()
    }

    pub fn set_fail_join(&self, fail: bool) {
        self.fail_join.store(fail, Ordering::SeqCst);
    }

    /// Makes binding `song` to the connection fail.
    pub fn fail_play(&self, song: &Song) {
        self.fail_play.lock().unwrap().insert(song.url.clone());
    }

    /// Makes every track handle behave as if the driver already dropped it.
    pub fn set_track_gone(&self, gone: bool) {
        self.track_gone.store(gone, Ordering::SeqCst);
    }

    /// Simulates the driver losing the channel: the latest connection goes
    /// dead and the latest attempt finishes.
    pub fn disconnect(&self) -> bool {
        if let Some(lost) = self.links.lock().unwrap().last() {
            lost.store(true, Ordering::SeqCst);
        }
        self.finish_latest()
    }

    /// Simulates the track of the latest play attempt ending on its own.
    pub fn finish_latest(&self) -> bool {
        self.signals
            .lock()
            .unwrap()
            .last()
            .map(CompletionSignal::fire)
            .unwrap_or(false)
    }
}

#[async_trait]
impl VoiceSink for FakeVoice {
    type Connection = FakeConnection;

    async fn join(&self, _guild_id: GuildId, channel_id: ChannelId) -> MusicResult<FakeConnection> {
        self.ops.lock().unwrap().push(VoiceOp::Joined(channel_id));

        if self.fail_join.load(Ordering::SeqCst) {
            return Err(MusicError::Connection("channel is full".to_string()));
        }

        let lost = Arc::new(AtomicBool::new(false));
        self.links.lock().unwrap().push(lost.clone());

        Ok(FakeConnection {
            ops: self.ops.clone(),
            signals: self.signals.clone(),
            lost,
            fail_play: self.fail_play.clone(),
            track_gone: self.track_gone.clone(),
        })
    }
}

pub struct FakeConnection {
    ops: Arc<Mutex<Vec<VoiceOp>>>,
    signals: Arc<Mutex<Vec<CompletionSignal>>>,
    lost: Arc<AtomicBool>,
    fail_play: Arc<Mutex<HashSet<String>>>,
    track_gone: Arc<AtomicBool>,
}

#[async_trait]
impl VoiceConnection for FakeConnection {
    type Stream = String;
    type Playback = FakePlayback;

    async fn play(&self, stream: String, on_finish: CompletionSignal) -> MusicResult<FakePlayback> {
        if self.fail_play.lock().unwrap().contains(&stream) {
            return Err(MusicError::Connection(format!("could not bind {}", stream)));
        }

        self.ops.lock().unwrap().push(VoiceOp::Played(stream.clone()));
        self.signals.lock().unwrap().push(on_finish.clone());

        Ok(FakePlayback {
            url: stream,
            signal: on_finish,
            ops: self.ops.clone(),
            gone: self.track_gone.clone(),
        })
    }

    async fn leave(&self) {
        self.ops.lock().unwrap().push(VoiceOp::Left);
    }

    fn is_connected(&self) -> bool {
        !self.lost.load(Ordering::SeqCst)
    }
}

pub struct FakePlayback {
    url: String,
    signal: CompletionSignal,
    ops: Arc<Mutex<Vec<VoiceOp>>>,
    gone: Arc<AtomicBool>,
}

impl PlaybackHandle for FakePlayback {
    fn stop(&self) {
        let result = if self.gone.load(Ordering::SeqCst) {
            Err("track handle dropped")
        } else {
            self.ops.lock().unwrap().push(VoiceOp::Stopped(self.url.clone()));
            self.signal.fire();
            Ok(())
        };

        finish_on_stop_error(result, &self.signal);
    }
}

#[derive(Clone, Default)]
pub struct RecordingNotifier {
    notices: Arc<Mutex<Vec<(ChannelId, Notice)>>>,
}

impl RecordingNotifier {
    pub fn notices(&self) -> Vec<Notice> {
        self.notices
            .lock()
            .unwrap()
            .iter()
            .map(|(_, notice)| notice.clone())
            .collect()
    }

    pub fn channels(&self) -> Vec<ChannelId> {
        self.notices.lock().unwrap().iter().map(|(channel, _)| *channel).collect()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, channel_id: ChannelId, notice: Notice) {
        self.notices.lock().unwrap().push((channel_id, notice));
    }
}
