use anyhow::Result;
use serenity::{http::Http, model::gateway::GatewayIntents, Client};
use songbird::{SerenityInit, Songbird};
use std::sync::Arc;
use tracing::{error, info};

mod audio;
mod bot;
mod config;
mod error;
mod sources;
mod ui;

use crate::audio::{player::QueueRegistry, voice::SongbirdVoice};
use crate::bot::{notifier::DiscordNotifier, JukeboxBot};
use crate::config::Config;
use crate::sources::YouTubeClient;

#[tokio::main]
async fn main() -> Result<()> {
    // Logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("guild_jukebox=debug".parse()?)
                .add_directive("serenity=info".parse()?)
                .add_directive("songbird=info".parse()?),
        )
        .init();

    info!("🎵 Starting Guild Jukebox v{}", env!("CARGO_PKG_VERSION"));

    if std::env::args().any(|arg| arg == "--health-check") {
        return health_check().await;
    }

    let config = Arc::new(Config::load()?);
    info!("{}", config.summary());

    let intents = GatewayIntents::GUILDS
        | GatewayIntents::GUILD_VOICE_STATES
        | GatewayIntents::GUILD_MESSAGES
        | GatewayIntents::MESSAGE_CONTENT;

    let http = Arc::new(Http::new(&config.discord_token));
    let songbird = Songbird::serenity();
    let youtube = YouTubeClient::new();

    let (registry, completions) = QueueRegistry::new(
        youtube.clone(),
        SongbirdVoice::new(songbird.clone()),
        Arc::new(DiscordNotifier::new(http)),
        config.max_queue_size,
    );
    let registry = Arc::new(registry);
    tokio::spawn(registry.clone().run_completions(completions));

    let handler = JukeboxBot::new(config.clone(), registry, Arc::new(youtube));

    let mut client = Client::builder(&config.discord_token, intents)
        .event_handler(handler)
        .register_songbird_with(songbird)
        .await?;

    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Could not listen for Ctrl+C: {:?}", e);
            return;
        }
        info!("⚠️ Shutdown signal received, exiting...");
        std::process::exit(0);
    });

    info!("🚀 Bot started");
    if let Err(why) = client.start().await {
        error!("Client error: {:?}", why);
    }

    Ok(())
}

/// Exits successfully only when yt-dlp and ffmpeg are installed.
async fn health_check() -> Result<()> {
    let yt_dlp = async_process::Command::new("yt-dlp")
        .arg("--version")
        .output()
        .await?;

    let ffmpeg = async_process::Command::new("ffmpeg")
        .arg("-version")
        .output()
        .await?;

    if yt_dlp.status.success() && ffmpeg.status.success() {
        println!("OK");
        Ok(())
    } else {
        anyhow::bail!("Missing yt-dlp or ffmpeg");
    }
}
