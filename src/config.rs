use anyhow::Result;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    // Discord
    pub discord_token: String,
    pub command_prefix: String,

    // Search / disambiguation
    pub search_limit: usize,
    pub selection_timeout: Duration,

    // Queue
    pub max_queue_size: usize,
}

impl Config {
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any key lookup (the process environment in
    /// production, a map in tests).
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let discord_token = lookup("DISCORD_TOKEN")
            .filter(|token| !token.trim().is_empty())
            .ok_or_else(|| anyhow::anyhow!("DISCORD_TOKEN is not set"))?;

        let config = Self {
            discord_token,
            command_prefix: lookup("COMMAND_PREFIX").unwrap_or(defaults.command_prefix),
            search_limit: match lookup("SEARCH_LIMIT") {
                Some(val) if !val.trim().is_empty() => val.trim().parse()?,
                _ => defaults.search_limit,
            },
            selection_timeout: match lookup("SELECTION_TIMEOUT") {
                Some(val) if !val.trim().is_empty() => humantime::parse_duration(val.trim())?,
                _ => defaults.selection_timeout,
            },
            max_queue_size: match lookup("MAX_QUEUE_SIZE") {
                Some(val) if !val.trim().is_empty() => val.trim().parse()?,
                _ => defaults.max_queue_size,
            },
        };

        config.validate()?;

        Ok(config)
    }

    /// Validates configuration values for correctness.
    ///
    /// # Validation Rules
    ///
    /// - The command prefix must not be empty or contain whitespace
    /// - The search limit must be between 1 and 9 (answers are a single digit)
    /// - The selection timeout must be longer than zero
    /// - The queue must accept at least one song
    pub fn validate(&self) -> Result<()> {
        if self.command_prefix.is_empty() || self.command_prefix.chars().any(char::is_whitespace) {
            anyhow::bail!("Command prefix must be non-empty and without spaces, got: {:?}", self.command_prefix);
        }

        if !(1..=9).contains(&self.search_limit) {
            anyhow::bail!("Search limit must be between 1 and 9, got: {}", self.search_limit);
        }

        if self.selection_timeout.is_zero() {
            anyhow::bail!("Selection timeout must be greater than 0");
        }

        if self.max_queue_size == 0 {
            anyhow::bail!("Max queue size must be greater than 0");
        }

        Ok(())
    }

    /// Returns a summary of the current configuration for logging.
    ///
    /// The token is never included.
    pub fn summary(&self) -> String {
        format!(
            "Config Summary:\n  \
            Commands: prefix {:?}\n  \
            Search: {} results, {} to choose\n  \
            Queue: {} songs max per guild",
            self.command_prefix,
            self.search_limit,
            humantime::format_duration(self.selection_timeout),
            self.max_queue_size,
        )
    }
}

/// Default configuration values.
///
/// Used as fallbacks when environment variables are not provided.
impl Default for Config {
    fn default() -> Self {
        Self {
            // Discord (no default token - must be provided)
            discord_token: String::new(),
            command_prefix: "!".to_string(),

            search_limit: 5,
            selection_timeout: Duration::from_secs(15),

            max_queue_size: 1000,
        }
    }
}
