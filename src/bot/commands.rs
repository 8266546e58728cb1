use crate::error::MusicError;

/// A prefix text command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Play(String),
    Skip,
    /// `None` when no number was given, `Err` when it was not a number.
    Cancel(Result<usize, MusicError>),
    Queue,
    Help,
}

/// Name and aliases of every command, in help order.
pub const COMMANDS: &[(&str, &[&str], &str)] = &[
    ("play", &["p", "재생"], "Search for a song and pick one of the results"),
    ("skip", &["s", "스킵"], "Skip the current song"),
    ("cancel", &["remove", "취소"], "Remove the queued song at the given position"),
    ("queue", &["q", "대기열"], "Show the current song and what comes next"),
    ("help", &["h", "도움말"], "Show this list"),
];

/// Parses `content` if it starts with `prefix` and names a known command.
pub fn parse(content: &str, prefix: &str) -> Option<Command> {
    let rest = content.trim_start().strip_prefix(prefix)?;

    let mut split = rest.splitn(2, char::is_whitespace);
    let name = split.next().filter(|name| !name.is_empty())?;
    let args = split.next().unwrap_or("").trim();

    match canonical_name(name)? {
        "play" => Some(Command::Play(args.to_string())),
        "skip" => Some(Command::Skip),
        "cancel" => Some(Command::Cancel(parse_position(args))),
        "queue" => Some(Command::Queue),
        "help" => Some(Command::Help),
        _ => None,
    }
}

fn canonical_name(name: &str) -> Option<&'static str> {
    let name = name.to_lowercase();

    COMMANDS
        .iter()
        .find(|(canonical, aliases, _)| *canonical == name || aliases.contains(&name.as_str()))
        .map(|(canonical, _, _)| *canonical)
}

fn parse_position(args: &str) -> Result<usize, MusicError> {
    let first = args.split_whitespace().next().ok_or(MusicError::MissingPosition)?;

    first
        .parse::<usize>()
        .map_err(|_| MusicError::InvalidSelection(first.to_string()))
}
