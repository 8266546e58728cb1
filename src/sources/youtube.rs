use async_process::Command;
use async_trait::async_trait;
use serde::Deserialize;
use songbird::input::{Compose, Input, LiveInput, YoutubeDl};
use std::{future::Future, sync::Arc, time::Duration};
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};
use url::Url;

use super::{SearchProvider, StreamSource, TrackCandidate};
use crate::error::{MusicError, MusicResult};

const YOUTUBE_HOSTS: &[&str] = &[
    "www.youtube.com",
    "youtube.com",
    "m.youtube.com",
    "music.youtube.com",
    "youtu.be",
];

/// Upper bound for one yt-dlp search or stream open
const YTDLP_TIMEOUT: Duration = Duration::from_secs(30);

/// YouTube search and streaming through yt-dlp
///
/// Cheap to clone: the HTTP client and the rate limiter are shared.
#[derive(Clone)]
pub struct YouTubeClient {
    http: reqwest::Client,
    rate_limiter: Arc<Semaphore>,
}

/// One line of `yt-dlp --flat-playlist --dump-json`
#[derive(Debug, Deserialize)]
struct YtDlpEntry {
    id: Option<String>,
    title: Option<String>,
    url: Option<String>,
    webpage_url: Option<String>,
    duration: Option<f64>,
}

impl YouTubeClient {
    pub fn new() -> Self {
        Self {
            http: reqwest::Client::new(),
            // Cap concurrent yt-dlp processes
            rate_limiter: Arc::new(Semaphore::new(3)),
        }
    }

    /// Whether `url` points at a YouTube host
    pub fn is_youtube_url(url: &str) -> bool {
        Url::parse(url)
            .ok()
            .filter(|parsed| matches!(parsed.scheme(), "http" | "https"))
            .and_then(|parsed| parsed.host_str().map(|host| YOUTUBE_HOSTS.contains(&host)))
            .unwrap_or(false)
    }

    /// Parses the JSON lines printed by yt-dlp, skipping anything unusable.
    fn parse_search_output(stdout: &str) -> Vec<TrackCandidate> {
        stdout
            .lines()
            .filter(|line| !line.trim().is_empty())
            .filter_map(|line| match serde_json::from_str::<YtDlpEntry>(line) {
                Ok(entry) => Self::entry_to_candidate(entry),
                Err(e) => {
                    debug!("Ignoring unparsable yt-dlp line: {}", e);
                    None
                }
            })
            .collect()
    }

    fn entry_to_candidate(entry: YtDlpEntry) -> Option<TrackCandidate> {
        let title = entry.title?;
        let url = entry
            .webpage_url
            .filter(|url| Self::is_youtube_url(url))
            .or(entry.url.filter(|url| Self::is_youtube_url(url)))
            .or_else(|| entry.id.map(|id| format!("https://www.youtube.com/watch?v={}", id)))?;

        let mut candidate = TrackCandidate::new(title, url);
        if let Some(seconds) = entry.duration.filter(|s| s.is_finite() && *s >= 0.0) {
            candidate = candidate.with_duration(Duration::from_secs_f64(seconds));
        }

        Some(candidate)
    }
}

/// Runs `call`, failing with `on_timeout` once `limit` elapses.
async fn within_deadline<T>(
    limit: Duration,
    call: impl Future<Output = MusicResult<T>>,
    on_timeout: impl FnOnce(String) -> MusicError,
) -> MusicResult<T> {
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => Err(on_timeout(format!(
            "yt-dlp timed out after {}",
            humantime::format_duration(limit)
        ))),
    }
}

impl Default for YouTubeClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SearchProvider for YouTubeClient {
    async fn search(&self, query: &str, limit: usize) -> MusicResult<Vec<TrackCandidate>> {
        let _permit = self
            .rate_limiter
            .acquire()
            .await
            .map_err(|e| MusicError::Search(e.to_string()))?;

        info!("🔍 Searching YouTube: {}", query);

        let search_query = format!("ytsearch{}:{}", limit, query);

        let mut command = Command::new("yt-dlp");
        command
            .args([
                "--no-playlist",
                "--dump-json",
                "--flat-playlist",
                "--skip-download",
                "--no-warnings",
                &search_query,
            ])
            .kill_on_drop(true);

        let output = within_deadline(
            YTDLP_TIMEOUT,
            async {
                command
                    .output()
                    .await
                    .map_err(|e| MusicError::Search(format!("could not run yt-dlp: {}", e)))
            },
            MusicError::Search,
        )
        .await
        .inspect_err(|e| warn!("Search for {:?} failed: {}", query, e))?;

        if !output.status.success() {
            let error = String::from_utf8_lossy(&output.stderr);
            return Err(MusicError::Search(format!("yt-dlp error: {}", error.trim())));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let mut results = Self::parse_search_output(&stdout);
        results.truncate(limit);

        debug!("{} candidates for {:?}", results.len(), query);
        Ok(results)
    }
}

#[async_trait]
impl StreamSource for YouTubeClient {
    type Stream = Input;

    /// Opens the stream eagerly so a dead video fails here rather than
    /// after the track was handed to the voice driver.
    async fn resolve(&self, locator: &str) -> MusicResult<Input> {
        if !Self::is_youtube_url(locator) {
            return Err(MusicError::StreamResolution(format!(
                "not a YouTube URL: {}",
                locator
            )));
        }

        let _permit = self
            .rate_limiter
            .acquire()
            .await
            .map_err(|e| MusicError::StreamResolution(e.to_string()))?;

        debug!("🎵 Opening stream for {}", locator);

        let mut ytdl = YoutubeDl::new(self.http.clone(), locator.to_string());
        let stream = within_deadline(
            YTDLP_TIMEOUT,
            async {
                ytdl.create_async()
                    .await
                    .map_err(|e| MusicError::StreamResolution(e.to_string()))
            },
            MusicError::StreamResolution,
        )
        .await
        .inspect_err(|e| warn!("yt-dlp could not open {}: {}", locator, e))?;

        Ok(Input::Live(LiveInput::Raw(stream), Some(Box::new(ytdl))))
    }
}
