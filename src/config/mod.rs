//! Application configuration management

use std::env;
use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::Result;
use tracing::{info, warn};

/// Which entity level the missing-content hunt operates on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingMode {
    Artist,
    Album,
    Both,
}

impl MissingMode {
    pub fn includes_artists(self) -> bool {
        matches!(self, MissingMode::Artist | MissingMode::Both)
    }

    pub fn includes_albums(self) -> bool {
        matches!(self, MissingMode::Album | MissingMode::Both)
    }
}

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Lidarr base URL (without the /api/v1 suffix)
    pub api_url: String,

    /// Lidarr API key (X-Api-Key header)
    pub api_key: String,

    /// How many missing-content items to hunt per cycle (0 skips the pass)
    pub hunt_missing_items: usize,

    /// How many below-cutoff albums to hunt per cycle (0 skips the pass)
    pub hunt_upgrade_albums: usize,

    /// Whether the missing hunt targets artists, albums, or both
    pub hunt_missing_mode: MissingMode,

    /// End-of-cycle sleep
    pub sleep_duration: Duration,

    /// Pick candidates at random rather than in list order
    pub random_selection: bool,

    /// Only hunt monitored artists/albums
    pub monitored_only: bool,

    /// Hours between checkpoint resets; 0 or negative never resets
    pub state_reset_interval_hours: i64,

    /// Checkpoint file location
    pub state_file_path: PathBuf,

    /// Wait after an accepted refresh command before searching
    pub command_wait: Duration,

    /// Wait after a failed remote call before moving on
    pub error_wait: Duration,

    /// Lower the default log filter to debug
    ///
    /// main peeks at the raw variable before the subscriber exists; this
    /// field re-parses it so invalid values get the usual warning.
    pub debug_mode: bool,
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// Invalid values never abort startup; they fall back to the documented
    /// default with a warning.
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            api_url: env::var("API_URL")
                .unwrap_or_else(|_| "http://your-lidarr-address:8686".to_string()),

            api_key: env::var("API_KEY").unwrap_or_else(|_| "your-api-key".to_string()),

            hunt_missing_items: parse_or_default("HUNT_MISSING_ITEMS", env_raw("HUNT_MISSING_ITEMS"), 1),

            hunt_upgrade_albums: parse_or_default(
                "HUNT_UPGRADE_ALBUMS",
                env_raw("HUNT_UPGRADE_ALBUMS"),
                0,
            ),

            hunt_missing_mode: parse_mode("HUNT_MISSING_MODE", env_raw("HUNT_MISSING_MODE")),

            sleep_duration: Duration::from_secs(parse_or_default(
                "SLEEP_DURATION",
                env_raw("SLEEP_DURATION"),
                900,
            )),

            random_selection: parse_bool("RANDOM_SELECTION", env_raw("RANDOM_SELECTION"), true),

            monitored_only: parse_bool("MONITORED_ONLY", env_raw("MONITORED_ONLY"), true),

            state_reset_interval_hours: parse_or_default(
                "STATE_RESET_INTERVAL_HOURS",
                env_raw("STATE_RESET_INTERVAL_HOURS"),
                168,
            ),

            state_file_path: env::var("STATE_FILE_PATH")
                .unwrap_or_else(|_| "./data/state.json".to_string())
                .into(),

            command_wait: Duration::from_secs(parse_or_default(
                "COMMAND_WAIT_SECONDS",
                env_raw("COMMAND_WAIT_SECONDS"),
                5,
            )),

            error_wait: Duration::from_secs(parse_or_default(
                "ERROR_WAIT_SECONDS",
                env_raw("ERROR_WAIT_SECONDS"),
                10,
            )),

            debug_mode: parse_bool("DEBUG_MODE", env_raw("DEBUG_MODE"), false),
        })
    }

    /// Log the effective configuration at startup
    pub fn log_summary(&self) {
        info!(api_url = %self.api_url, "Lidarr connection configured");
        info!(
            mode = ?self.hunt_missing_mode,
            missing_items = self.hunt_missing_items,
            upgrade_albums = self.hunt_upgrade_albums,
            "Hunt budgets configured"
        );
        info!(
            monitored_only = self.monitored_only,
            random_selection = self.random_selection,
            "Candidate selection configured"
        );
        info!(
            reset_interval_hours = self.state_reset_interval_hours,
            state_file = %self.state_file_path.display(),
            "Checkpoint configured"
        );
        info!(
            sleep_seconds = self.sleep_duration.as_secs(),
            debug_mode = self.debug_mode,
            "Cycle sleep configured"
        );
    }
}

fn env_raw(key: &str) -> Option<String> {
    env::var(key).ok()
}

/// Parse an environment value, warning and falling back on anything invalid
fn parse_or_default<T: FromStr + Display>(key: &str, raw: Option<String>, default: T) -> T {
    let Some(raw) = raw else {
        return default;
    };
    match raw.trim().parse() {
        Ok(value) => value,
        Err(_) => {
            warn!(key, value = %raw, default = %default, "Invalid value, using default");
            default
        }
    }
}

fn parse_bool(key: &str, raw: Option<String>, default: bool) -> bool {
    let Some(raw) = raw else {
        return default;
    };
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" => true,
        "false" | "0" => false,
        _ => {
            warn!(key, value = %raw, default, "Invalid boolean, using default");
            default
        }
    }
}

fn parse_mode(key: &str, raw: Option<String>) -> MissingMode {
    let Some(raw) = raw else {
        return MissingMode::Artist;
    };
    match raw.trim().to_ascii_lowercase().as_str() {
        "artist" => MissingMode::Artist,
        "album" => MissingMode::Album,
        "both" => MissingMode::Both,
        _ => {
            warn!(key, value = %raw, "Unknown missing mode, defaulting to artist");
            MissingMode::Artist
        }
    }
}
