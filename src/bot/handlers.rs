use serenity::{
    builder::{CreateEmbed, CreateMessage},
    model::{
        channel::Message,
        id::{ChannelId, GuildId, UserId},
    },
    prelude::Context,
};
use tracing::{error, info, warn};

use super::{commands::Command, selection, JukeboxBot};
use crate::{
    audio::{player::Enqueued, queue::Song},
    error::{MusicError, MusicResult},
    sources::{SearchProvider, TrackCandidate},
    ui::embeds,
};

/// Runs a parsed command for a guild message.
pub async fn handle_command(
    ctx: &Context,
    msg: &Message,
    guild_id: GuildId,
    command: Command,
    bot: &JukeboxBot,
) -> MusicResult<()> {
    info!(
        "📝 {:?} from {} in guild {}",
        command, msg.author.name, guild_id
    );

    match command {
        Command::Play(query) => handle_play(ctx, msg, guild_id, &query, bot).await,
        Command::Skip => handle_skip(ctx, msg, guild_id, bot).await,
        Command::Cancel(position) => handle_cancel(ctx, msg, guild_id, position?, bot).await,
        Command::Queue => handle_queue(ctx, msg, guild_id, bot).await,
        Command::Help => {
            send_embed(ctx, msg.channel_id, embeds::create_help_embed(&bot.config.command_prefix)).await;
            Ok(())
        }
    }
}

/// Searches for `query`; an empty query or an empty result list is an error.
pub async fn search_candidates(
    provider: &dyn SearchProvider,
    query: &str,
    limit: usize,
) -> MusicResult<Vec<TrackCandidate>> {
    let query = query.trim();
    if query.is_empty() {
        return Err(MusicError::EmptyQuery);
    }

    let candidates = provider.search(query, limit).await?;
    if candidates.is_empty() {
        return Err(MusicError::NoResults(query.to_string()));
    }

    Ok(candidates)
}

async fn handle_play(
    ctx: &Context,
    msg: &Message,
    guild_id: GuildId,
    query: &str,
    bot: &JukeboxBot,
) -> MusicResult<()> {
    let candidates = search_candidates(bot.search.as_ref(), query, bot.config.search_limit).await?;

    let results = embeds::create_search_results_embed(
        query.trim(),
        &candidates,
        bot.config.selection_timeout.as_secs(),
    );
    let prompt = require_prompt(send_embed(ctx, msg.channel_id, results).await, guild_id)?;

    let index = selection::await_selection(
        ctx,
        &prompt,
        msg.author.id,
        candidates.len(),
        bot.config.selection_timeout,
    )
    .await?;

    // Checked after the pick, so leaving the channel meanwhile is caught
    let voice_channel = user_voice_channel(ctx, guild_id, msg.author.id)?;

    let candidate = candidates
        .into_iter()
        .nth(index)
        .ok_or_else(|| MusicError::InvalidSelection((index + 1).to_string()))?;
    let song = Song::from_candidate(candidate, msg.author.name.clone());

    match bot
        .registry
        .enqueue(guild_id, msg.channel_id, voice_channel, song)
        .await?
    {
        Enqueued::Started => info!("▶️ Queue started in guild {}", guild_id),
        Enqueued::Queued { position } => info!("Queued at position {} in guild {}", position, guild_id),
    }

    Ok(())
}

async fn handle_skip(ctx: &Context, msg: &Message, guild_id: GuildId, bot: &JukeboxBot) -> MusicResult<()> {
    let outcome = bot.registry.skip(guild_id).await?;
    send_embed(ctx, msg.channel_id, embeds::create_skip_embed(&outcome)).await;
    Ok(())
}

async fn handle_cancel(
    ctx: &Context,
    msg: &Message,
    guild_id: GuildId,
    position: usize,
    bot: &JukeboxBot,
) -> MusicResult<()> {
    let removed = bot.registry.cancel(guild_id, position).await?;
    send_embed(ctx, msg.channel_id, embeds::create_cancelled_embed(&removed, position)).await;
    Ok(())
}

async fn handle_queue(ctx: &Context, msg: &Message, guild_id: GuildId, bot: &JukeboxBot) -> MusicResult<()> {
    let snapshot = bot.registry.snapshot(guild_id).await?;
    send_embed(ctx, msg.channel_id, embeds::create_queue_embed(&snapshot)).await;
    Ok(())
}

// Helpers

/// Voice channel `user_id` is connected to, from the gateway cache.
fn user_voice_channel(ctx: &Context, guild_id: GuildId, user_id: UserId) -> MusicResult<ChannelId> {
    let guild = guild_id
        .to_guild_cached(&ctx.cache)
        .ok_or(MusicError::NotInVoiceChannel)?;

    guild
        .voice_states
        .get(&user_id)
        .and_then(|voice_state| voice_state.channel_id)
        .ok_or(MusicError::NotInVoiceChannel)
}

/// The results prompt anchors the pick; without it the request is abandoned.
fn require_prompt(prompt: Option<Message>, guild_id: GuildId) -> MusicResult<Message> {
    prompt.ok_or_else(|| {
        warn!(
            "Abandoning play request in guild {}: search results could not be posted",
            guild_id
        );
        MusicError::Search("could not post the results to this channel".to_string())
    })
}

/// Sends an embed, logging instead of failing when Discord rejects it.
pub async fn send_embed(ctx: &Context, channel_id: ChannelId, embed: CreateEmbed) -> Option<Message> {
    match channel_id
        .send_message(&ctx.http, CreateMessage::new().embed(embed))
        .await
    {
        Ok(message) => Some(message),
        Err(e) => {
            error!("Error sending message to {}: {:?}", channel_id, e);
            None
        }
    }
}
