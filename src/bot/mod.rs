//! # Bot Module
//!
//! Discord glue around the queue registry.
//!
//! [`JukeboxBot`] implements serenity's [`EventHandler`]: it reads prefix
//! commands from guild text channels ([`commands`]), runs the search and the
//! numbered pick ([`selection`]) and forwards the result to the shared
//! [`QueueRegistry`]. Queue notices reach the channel through
//! [`notifier::DiscordNotifier`].

use serenity::{
    all::{Context, EventHandler, Message, Ready},
    async_trait,
};
use std::sync::Arc;
use tracing::{error, info};

pub mod commands;
pub mod handlers;
pub mod notifier;
pub mod selection;

use crate::{
    audio::{player::QueueRegistry, voice::SongbirdVoice},
    config::Config,
    error::ErrorKind,
    sources::{SearchProvider, YouTubeClient},
    ui::embeds,
};

/// Registry wired to yt-dlp streams and songbird voice.
pub type DiscordRegistry = QueueRegistry<YouTubeClient, SongbirdVoice>;

pub struct JukeboxBot {
    /// Configuration loaded from the environment
    config: Arc<Config>,
    /// Every guild's queue
    registry: Arc<DiscordRegistry>,
    search: Arc<dyn SearchProvider>,
}

impl JukeboxBot {
    pub fn new(config: Arc<Config>, registry: Arc<DiscordRegistry>, search: Arc<dyn SearchProvider>) -> Self {
        Self {
            config,
            registry,
            search,
        }
    }
}

#[async_trait]
impl EventHandler for JukeboxBot {
    async fn ready(&self, _ctx: Context, ready: Ready) {
        info!("🤖 {} is online!", ready.user.name);
        info!("📊 Connected to {} guilds", ready.guilds.len());
    }

    /// Dispatches prefix commands. Bots, DMs and unknown commands are ignored.
    async fn message(&self, ctx: Context, msg: Message) {
        if msg.author.bot {
            return;
        }

        let Some(guild_id) = msg.guild_id else {
            return;
        };

        let Some(command) = commands::parse(&msg.content, &self.config.command_prefix) else {
            return;
        };

        if let Err(e) = handlers::handle_command(&ctx, &msg, guild_id, command, self).await {
            match e.kind() {
                ErrorKind::UserInput => info!("Rejected command in guild {}: {}", guild_id, e),
                _ => error!("Command failed in guild {}: {}", guild_id, e),
            }

            handlers::send_embed(&ctx, msg.channel_id, embeds::create_error_embed(&e)).await;
        }
    }
}
