use thiserror::Error;

/// Errors surfaced by the queue core and the command glue.
///
/// None of these ever aborts the process: user input errors are reported back
/// to the channel, stream and connection errors are absorbed by the
/// skip-and-continue policy of [`crate::audio::player::QueueRegistry`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MusicError {
    #[error("Please type the title of the song to search for")]
    EmptyQuery,

    #[error("No results found for `{0}`")]
    NoResults(String),

    #[error("`{0}` is not one of the listed numbers")]
    InvalidSelection(String),

    #[error("No selection was made in time")]
    SelectionTimeout,

    #[error("You need to join a voice channel first")]
    NotInVoiceChannel,

    #[error("There is no queued song at position {0}")]
    InvalidPosition(usize),

    #[error("Tell me which queued song to cancel, e.g. `cancel 1`")]
    MissingPosition,

    #[error("Nothing is playing right now")]
    NothingPlaying,

    #[error("The queue is full (max {0} songs)")]
    QueueFull(usize),

    #[error("Search failed: {0}")]
    Search(String),

    #[error("Could not open the audio stream: {0}")]
    StreamResolution(String),

    #[error("Voice connection failed: {0}")]
    Connection(String),
}

/// Coarse classification used for logging and recovery decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    UserInput,
    Search,
    StreamResolution,
    Connection,
}

impl MusicError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            MusicError::Search(_) => ErrorKind::Search,
            MusicError::StreamResolution(_) => ErrorKind::StreamResolution,
            MusicError::Connection(_) => ErrorKind::Connection,
            _ => ErrorKind::UserInput,
        }
    }

    pub fn is_user_input(&self) -> bool {
        self.kind() == ErrorKind::UserInput
    }
}

pub type MusicResult<T> = Result<T, MusicError>;
