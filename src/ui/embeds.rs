use serenity::{
    all::Timestamp,
    builder::{CreateEmbed, CreateEmbedFooter},
};

use crate::{
    audio::{
        notice::Notice,
        player::SkipOutcome,
        queue::{QueueSnapshot, Song},
    },
    bot::commands::COMMANDS,
    error::MusicError,
    sources::TrackCandidate,
};

/// Standard palette
pub mod colors {
    use serenity::all::Colour;

    pub const SUCCESS_GREEN: Colour = Colour::from_rgb(67, 181, 129);
    pub const ERROR_RED: Colour = Colour::from_rgb(220, 53, 69);
    pub const WARNING_ORANGE: Colour = Colour::from_rgb(255, 193, 7);
    pub const INFO_BLUE: Colour = Colour::from_rgb(52, 144, 220);
    pub const MUSIC_PURPLE: Colour = Colour::from_rgb(138, 43, 226);
    pub const NEUTRAL_GRAY: Colour = Colour::from_rgb(108, 117, 125);
}

const STANDARD_FOOTER: &str = "🎵 Guild Jukebox";

/// Pending songs listed before the rest is summarized
const MAX_LISTED: usize = 15;

fn song_line(song: &Song) -> String {
    format!(
        "[{}]({}) `{}` · {}",
        song.title,
        song.url,
        song.duration_label(),
        song.requested_by
    )
}

/// Numbered candidate list shown while waiting for the user's pick
pub fn create_search_results_embed(query: &str, candidates: &[TrackCandidate], timeout_secs: u64) -> CreateEmbed {
    let description = candidates
        .iter()
        .enumerate()
        .map(|(i, candidate)| format!("**{}.** {} `{}`", i + 1, candidate.title, candidate.duration_label()))
        .collect::<Vec<_>>()
        .join("\n");

    CreateEmbed::default()
        .title(format!("🔍 Results for \"{}\"", query))
        .description(description)
        .color(colors::INFO_BLUE)
        .footer(CreateEmbedFooter::new(format!(
            "Reply with a number from 1 to {} within {}s",
            candidates.len(),
            timeout_secs
        )))
}

pub fn create_now_playing_embed(song: &Song) -> CreateEmbed {
    CreateEmbed::default()
        .title("🎵 Now Playing")
        .description(format!("**[{}]({})**", song.title, song.url))
        .color(colors::SUCCESS_GREEN)
        .field("⏱️ Duration", song.duration_label(), true)
        .field("👤 Requested by", &song.requested_by, true)
        .timestamp(Timestamp::now())
        .footer(CreateEmbedFooter::new(STANDARD_FOOTER))
}

pub fn create_track_added_embed(song: &Song, position: usize) -> CreateEmbed {
    CreateEmbed::default()
        .title("✅ Added to Queue")
        .description(format!("**[{}]({})**", song.title, song.url))
        .color(colors::MUSIC_PURPLE)
        .field("📍 Position", position.to_string(), true)
        .field("⏱️ Duration", song.duration_label(), true)
        .field("👤 Requested by", &song.requested_by, true)
        .footer(CreateEmbedFooter::new(STANDARD_FOOTER))
}

pub fn create_stream_failed_embed(song: &Song, reason: &str) -> CreateEmbed {
    CreateEmbed::default()
        .title("⚠️ Skipped")
        .description(format!("Could not play **{}**, moving on.\n`{}`", song.title, reason))
        .color(colors::WARNING_ORANGE)
        .footer(CreateEmbedFooter::new(STANDARD_FOOTER))
}

pub fn create_finished_embed() -> CreateEmbed {
    CreateEmbed::default()
        .title("⏹️ Queue Finished")
        .description("Nothing left to play, leaving the voice channel.")
        .color(colors::NEUTRAL_GRAY)
        .footer(CreateEmbedFooter::new(STANDARD_FOOTER))
}

pub fn create_notice_embed(notice: &Notice) -> CreateEmbed {
    match notice {
        Notice::NowPlaying(song) => create_now_playing_embed(song),
        Notice::Queued { song, position } => create_track_added_embed(song, *position),
        Notice::StreamFailed { song, reason } => create_stream_failed_embed(song, reason),
        Notice::Finished => create_finished_embed(),
    }
}

pub fn create_skip_embed(outcome: &SkipOutcome) -> CreateEmbed {
    match outcome {
        SkipOutcome::Advancing { next } => CreateEmbed::default()
            .title("⏭️ Skipped")
            .description(format!("Up next: **{}**", next.title))
            .color(colors::INFO_BLUE),
        SkipOutcome::Stopping => CreateEmbed::default()
            .title("⏭️ Skipped")
            .description("No next song, stopping.")
            .color(colors::NEUTRAL_GRAY),
    }
}

pub fn create_cancelled_embed(song: &Song, position: usize) -> CreateEmbed {
    CreateEmbed::default()
        .title("🗑️ Removed from Queue")
        .description(format!("**{}** (position {})", song.title, position))
        .color(colors::INFO_BLUE)
}

/// Body of the queue listing: current song, then pending songs by position.
pub fn snapshot_description(snapshot: &QueueSnapshot) -> String {
    let mut description = format!("**▶️ Now playing**\n{}\n", song_line(&snapshot.now_playing));

    if snapshot.pending.is_empty() {
        description.push_str("\n*Nothing queued after this song.*");
        return description;
    }

    description.push_str("\n**📋 Up next**\n");
    for (i, song) in snapshot.pending.iter().take(MAX_LISTED).enumerate() {
        description.push_str(&format!("**{}.** {}\n", i + 1, song_line(song)));
    }

    let hidden = snapshot.pending.len().saturating_sub(MAX_LISTED);
    if hidden > 0 {
        description.push_str(&format!("*...and {} more*", hidden));
    }

    description
}

pub fn create_queue_embed(snapshot: &QueueSnapshot) -> CreateEmbed {
    CreateEmbed::default()
        .title("📋 Queue")
        .description(snapshot_description(snapshot))
        .color(colors::INFO_BLUE)
        .footer(CreateEmbedFooter::new(format!(
            "{} song(s) in queue",
            snapshot.pending.len() + 1
        )))
        .timestamp(Timestamp::now())
}

pub fn help_description(prefix: &str) -> String {
    COMMANDS
        .iter()
        .map(|(name, aliases, about)| {
            let usage = match *name {
                "play" => format!("{}{} <query>", prefix, name),
                "cancel" => format!("{}{} <number>", prefix, name),
                _ => format!("{}{}", prefix, name),
            };
            let aliases = aliases
                .iter()
                .map(|alias| format!("`{}{}`", prefix, alias))
                .collect::<Vec<_>>()
                .join(", ");

            format!("`{}` ({})\n{}", usage, aliases, about)
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub fn create_help_embed(prefix: &str) -> CreateEmbed {
    CreateEmbed::default()
        .title("🎵 Commands")
        .description(help_description(prefix))
        .color(colors::MUSIC_PURPLE)
        .footer(CreateEmbedFooter::new(STANDARD_FOOTER))
}

/// Error embed; user mistakes get a softer color than failures.
pub fn create_error_embed(error: &MusicError) -> CreateEmbed {
    let color = if error.is_user_input() {
        colors::WARNING_ORANGE
    } else {
        colors::ERROR_RED
    };

    CreateEmbed::default()
        .title("❌ Error")
        .description(error.to_string())
        .color(color)
        .timestamp(Timestamp::now())
        .footer(CreateEmbedFooter::new(STANDARD_FOOTER))
}
