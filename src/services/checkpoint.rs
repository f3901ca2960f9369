//! Checkpoint persistence
//!
//! A small JSON document tracks which artists/albums have already been hunted
//! so repeated cycles make forward progress instead of re-searching the same
//! items. The file is written once per cycle at a well-defined point; losing
//! it (or finding it malformed) just means starting over with empty state.

use std::collections::BTreeSet;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

/// Processed-item state carried across cycles
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    #[serde(default)]
    pub processed_artists: BTreeSet<i64>,
    #[serde(default)]
    pub processed_albums: BTreeSet<i64>,
    #[serde(default = "Utc::now", deserialize_with = "lenient_reset_time")]
    pub last_reset_time: DateTime<Utc>,
}

/// A corrupt stored timestamp only loses the reset clock, not the processed
/// sets: the clock restarts at load time.
fn lenient_reset_time<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    match DateTime::parse_from_rfc3339(&raw) {
        Ok(parsed) => Ok(parsed.with_timezone(&Utc)),
        Err(e) => {
            warn!(value = %raw, error = %e, "Invalid last reset timestamp, treating as now");
            Ok(Utc::now())
        }
    }
}

impl Checkpoint {
    pub fn new() -> Self {
        Self {
            processed_artists: BTreeSet::new(),
            processed_albums: BTreeSet::new(),
            last_reset_time: Utc::now(),
        }
    }

    /// Clear processed state once the configured interval has elapsed
    ///
    /// An interval of zero or less disables the reset entirely. Returns
    /// whether a reset happened so the caller can log it.
    pub fn maybe_reset(&mut self, interval_hours: i64, now: DateTime<Utc>) -> bool {
        if interval_hours <= 0 {
            return false;
        }
        // intervals too large for TimeDelta mean "never reset"
        let Some(interval) = TimeDelta::try_hours(interval_hours) else {
            return false;
        };
        if now - self.last_reset_time <= interval {
            return false;
        }
        self.processed_artists.clear();
        self.processed_albums.clear();
        self.last_reset_time = now;
        true
    }
}

impl Default for Checkpoint {
    fn default() -> Self {
        Self::new()
    }
}

/// Loads and saves the checkpoint file
#[derive(Debug, Clone)]
pub struct CheckpointStore {
    path: PathBuf,
}

impl CheckpointStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Read the checkpoint; a missing or malformed file yields fresh state
    pub fn load(&self) -> Checkpoint {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "No checkpoint file, starting fresh");
                return Checkpoint::new();
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Failed to read checkpoint, starting fresh");
                return Checkpoint::new();
            }
        };

        match serde_json::from_slice(&bytes) {
            Ok(checkpoint) => checkpoint,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Malformed checkpoint, starting fresh");
                Checkpoint::new()
            }
        }
    }

    /// Persist the checkpoint; failures are logged, never fatal
    pub fn save(&self, checkpoint: &Checkpoint) {
        if let Err(e) = self.write(checkpoint) {
            error!(path = %self.path.display(), error = %e, "Failed to save checkpoint");
        }
    }

    fn write(&self, checkpoint: &Checkpoint) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let json = serde_json::to_vec_pretty(checkpoint).context("Failed to encode checkpoint")?;
        fs::write(&self.path, json)
            .with_context(|| format!("Failed to write {}", self.path.display()))?;
        Ok(())
    }

    #[allow(dead_code)]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = CheckpointStore::new(dir.path().join("state.json"));

        let mut checkpoint = Checkpoint::new();
        checkpoint.processed_artists.extend([3, 1, 2]);
        checkpoint.processed_albums.insert(99);

        store.save(&checkpoint);
        let loaded = store.load();

        assert_eq!(loaded, checkpoint);
    }

    #[test]
    fn test_missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = CheckpointStore::new(dir.path().join("nope.json"));

        let loaded = store.load();
        assert!(loaded.processed_artists.is_empty());
        assert!(loaded.processed_albums.is_empty());
    }

    #[test]
    fn test_malformed_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        fs::write(&path, b"{not json").unwrap();

        let loaded = CheckpointStore::new(&path).load();
        assert!(loaded.processed_artists.is_empty());
        assert!(loaded.processed_albums.is_empty());
    }

    #[test]
    fn test_save_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let store = CheckpointStore::new(dir.path().join("nested/deeper/state.json"));

        store.save(&Checkpoint::new());
        assert!(store.path().exists());
    }

    #[test]
    fn test_reset_only_after_interval() {
        let mut checkpoint = Checkpoint::new();
        checkpoint.processed_artists.insert(1);
        checkpoint.processed_albums.insert(2);

        let start = checkpoint.last_reset_time;

        // within the interval: nothing happens
        assert!(!checkpoint.maybe_reset(24, start + TimeDelta::hours(23)));
        assert_eq!(checkpoint.processed_artists.len(), 1);
        assert_eq!(checkpoint.last_reset_time, start);

        // past the interval: both sets cleared, timestamp advanced
        let later = start + TimeDelta::hours(25);
        assert!(checkpoint.maybe_reset(24, later));
        assert!(checkpoint.processed_artists.is_empty());
        assert!(checkpoint.processed_albums.is_empty());
        assert_eq!(checkpoint.last_reset_time, later);
    }

    #[test]
    fn test_corrupt_reset_timestamp_keeps_processed_sets() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        fs::write(
            &path,
            r#"{"processed_artists": [1, 2], "processed_albums": [9], "last_reset_time": "not-a-date"}"#,
        )
        .unwrap();

        let before = Utc::now();
        let loaded = CheckpointStore::new(&path).load();

        assert_eq!(loaded.processed_artists, BTreeSet::from([1, 2]));
        assert_eq!(loaded.processed_albums, BTreeSet::from([9]));
        // the corrupt clock restarts at load time instead of forcing a reset
        assert!(loaded.last_reset_time >= before);
    }

    #[test]
    fn test_overflowing_interval_never_resets() {
        let mut checkpoint = Checkpoint::new();
        checkpoint.processed_artists.insert(1);

        let later = checkpoint.last_reset_time + TimeDelta::hours(1);
        assert!(!checkpoint.maybe_reset(i64::MAX, later));
        assert_eq!(checkpoint.processed_artists.len(), 1);
    }

    #[test]
    fn test_zero_interval_never_resets() {
        let mut checkpoint = Checkpoint::new();
        checkpoint.processed_artists.insert(1);

        let far_future = checkpoint.last_reset_time + TimeDelta::hours(10_000);
        assert!(!checkpoint.maybe_reset(0, far_future));
        assert!(!checkpoint.maybe_reset(-5, far_future));
        assert_eq!(checkpoint.processed_artists.len(), 1);
    }

    #[test]
    fn test_disk_format_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = CheckpointStore::new(dir.path().join("state.json"));

        let mut checkpoint = Checkpoint::new();
        checkpoint.processed_artists.insert(5);
        store.save(&checkpoint);

        let raw = fs::read_to_string(store.path()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["processed_artists"], serde_json::json!([5]));
        assert_eq!(value["processed_albums"], serde_json::json!([]));
        assert!(value["last_reset_time"].is_string());
    }
}
