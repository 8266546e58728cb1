pub mod youtube;

use async_trait::async_trait;
use std::time::Duration;

use crate::error::MusicResult;

pub use youtube::YouTubeClient;

/// Searches a catalogue for tracks matching free text.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Returns at most `limit` candidates, best match first.
    ///
    /// "No results" is an empty list, never an error; errors mean the
    /// provider itself failed.
    async fn search(&self, query: &str, limit: usize) -> MusicResult<Vec<TrackCandidate>>;
}

/// Turns a track locator into something the voice sink can play.
///
/// Called at most once per song by the queue, so implementations must not
/// leave side effects behind when they fail.
#[async_trait]
pub trait StreamSource: Send + Sync + 'static {
    type Stream: Send + 'static;

    async fn resolve(&self, locator: &str) -> MusicResult<Self::Stream>;
}

/// One search hit offered to the user for selection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackCandidate {
    pub title: String,
    pub url: String,
    pub duration: Option<Duration>,
}

impl TrackCandidate {
    pub fn new(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            duration: None,
        }
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = Some(duration);
        self
    }

    /// `3:45`, `1:02:03`, or `LIVE` when the provider did not report a length
    pub fn duration_label(&self) -> String {
        self.duration
            .map(format_duration)
            .unwrap_or_else(|| "LIVE".to_string())
    }
}

/// Formats a duration in a human-readable way (e.g. "3:45" or "1:23:45")
pub fn format_duration(duration: Duration) -> String {
    let total_seconds = duration.as_secs();
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!("{}:{:02}", minutes, seconds)
    }
}
