//! Companion configuration loaded from environment variables.
//!
//! Follows 12-factor style: all settings come from environment variables
//! (or a `.env` file via `dotenvy`).

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::domain::DEFAULT_HISTORY_CAPACITY;

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per line.
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" | "pretty" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown log format: {other}")),
        }
    }
}

/// Top-level companion configuration.
///
/// Loaded once at startup via [`CompanionConfig::from_env`].
#[derive(Debug, Clone)]
pub struct CompanionConfig {
    /// Socket address to bind the HTTP server to (e.g. `0.0.0.0:3100`).
    pub listen_addr: SocketAddr,

    /// Base URL of the backend serving historical change fetches.
    pub backend_url: String,

    /// Timeout in seconds for one history fetch.
    pub history_fetch_timeout_secs: u64,

    /// Hero definitions document.
    pub heroes_path: PathBuf,

    /// Synergy keyword mapping document.
    pub keyword_mappings_path: PathBuf,

    /// Maximum number of retained change events.
    pub change_history_capacity: usize,

    /// Capacity of the EventBus broadcast channel.
    pub event_bus_capacity: usize,

    /// Whether a match start triggers a catch-up fetch.
    pub catch_up_on_match_start: bool,

    /// Log output format.
    pub log_format: LogFormat,
}

impl CompanionConfig {
    /// Loads configuration from environment variables.
    ///
    /// Falls back to sensible defaults when a variable is not set.
    /// Calls `dotenvy::dotenv().ok()` to optionally load a `.env` file.
    ///
    /// # Errors
    ///
    /// Returns an error if `LISTEN_ADDR` is set but cannot be parsed as
    /// a [`SocketAddr`].
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        dotenvy::dotenv().ok();

        let listen_addr: SocketAddr = std::env::var("LISTEN_ADDR")
            .unwrap_or_else(|_| "0.0.0.0:3100".to_string())
            .parse()?;

        let backend_url = std::env::var("BACKEND_URL")
            .unwrap_or_else(|_| "http://localhost:3000".to_string())
            .trim_end_matches('/')
            .to_string();
        let history_fetch_timeout_secs = parse_env("HISTORY_FETCH_TIMEOUT_SECS", 10);

        let heroes_path = parse_env("HEROES_PATH", PathBuf::from("data/heroes.json"));
        let keyword_mappings_path = parse_env(
            "KEYWORD_MAPPINGS_PATH",
            PathBuf::from("data/synergy_keyword_mappings.json"),
        );

        let change_history_capacity = parse_env("CHANGE_HISTORY_CAPACITY", DEFAULT_HISTORY_CAPACITY);
        let event_bus_capacity = parse_env("EVENT_BUS_CAPACITY", 1024);
        let catch_up_on_match_start = parse_env_bool("CATCH_UP_ON_MATCH_START", true);
        let log_format = parse_env("LOG_FORMAT", LogFormat::Text);

        Ok(Self {
            listen_addr,
            backend_url,
            history_fetch_timeout_secs,
            heroes_path,
            keyword_mappings_path,
            change_history_capacity,
            event_bus_capacity,
            catch_up_on_match_start,
            log_format,
        })
    }

    /// Timeout for one history fetch.
    #[must_use]
    pub const fn history_fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.history_fetch_timeout_secs)
    }
}

impl Default for CompanionConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 3100)),
            backend_url: "http://localhost:3000".to_string(),
            history_fetch_timeout_secs: 10,
            heroes_path: PathBuf::from("data/heroes.json"),
            keyword_mappings_path: PathBuf::from("data/synergy_keyword_mappings.json"),
            change_history_capacity: DEFAULT_HISTORY_CAPACITY,
            event_bus_capacity: 1024,
            catch_up_on_match_start: true,
            log_format: LogFormat::Text,
        }
    }
}

/// Parses an environment variable as `T`, returning `default` on missing
/// or invalid values.
fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Parses an environment variable as a boolean. Accepts `"true"`, `"1"`,
/// `"false"`, `"0"` (case-insensitive). Returns `default` otherwise.
fn parse_env_bool(key: &str, default: bool) -> bool {
    match std::env::var(key).ok().map(|v| v.to_ascii_lowercase()).as_deref() {
        Some("true" | "1") => true,
        Some("false" | "0") => false,
        _ => default,
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn log_format_parses() {
        assert_eq!("JSON".parse::<LogFormat>(), Ok(LogFormat::Json));
        assert_eq!("text".parse::<LogFormat>(), Ok(LogFormat::Text));
        assert!("xml".parse::<LogFormat>().is_err());
    }

    #[test]
    fn missing_variables_fall_back() {
        assert_eq!(parse_env("MATCH_COMPANION_TEST_UNSET_VAR", 42_u32), 42);
        assert!(parse_env_bool("MATCH_COMPANION_TEST_UNSET_BOOL", true));
    }

    #[test]
    fn defaults_match_documented_values() {
        let config = CompanionConfig::default();
        assert_eq!(config.listen_addr.port(), 3100);
        assert_eq!(config.change_history_capacity, 500);
        assert_eq!(config.history_fetch_timeout(), Duration::from_secs(10));
        assert!(config.catch_up_on_match_start);
    }
}
