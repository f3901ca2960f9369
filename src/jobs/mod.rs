//! The hunt cycle driver
//!
//! One cycle: load checkpoint, reset it if the interval elapsed, run the
//! enabled missing-content and upgrade passes, save the checkpoint, sleep.
//! Pass failures are logged and never break the loop; the checkpoint is only
//! written at the end-of-cycle save point.

pub mod missing;
pub mod upgrade;

use anyhow::Result;
use chrono::Utc;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::services::checkpoint::CheckpointStore;
use crate::services::lidarr::LidarrClient;

/// Run hunt cycles until the process is interrupted
pub async fn run_cycles(
    config: &Config,
    client: &LidarrClient,
    store: &CheckpointStore,
) -> Result<()> {
    loop {
        info!("Starting hunt cycle");

        let mut checkpoint = store.load();
        if checkpoint.maybe_reset(config.state_reset_interval_hours, Utc::now()) {
            info!(
                interval_hours = config.state_reset_interval_hours,
                "Reset interval elapsed, cleared processed state"
            );
        }

        if config.hunt_missing_mode.includes_artists() {
            if let Err(e) = missing::hunt_artists(client, config, &mut checkpoint).await {
                error!(error = %e, "Missing-artist pass failed");
            }
        }

        if config.hunt_missing_mode.includes_albums() {
            if let Err(e) = missing::hunt_albums(client, config, &mut checkpoint).await {
                error!(error = %e, "Missing-album pass failed");
            }
        }

        if let Err(e) = upgrade::hunt_upgrades(client, config).await {
            error!(error = %e, "Upgrade pass failed");
        }

        store.save(&checkpoint);

        info!(
            sleep_seconds = config.sleep_duration.as_secs(),
            "Cycle complete, sleeping"
        );
        tokio::time::sleep(config.sleep_duration).await;
    }
}

/// Refresh an artist and wait out the post-command delay
///
/// Returns false when the refresh was not accepted; the caller skips the
/// candidate without marking it processed so it gets retried next cycle.
pub(crate) async fn refresh_and_wait(
    client: &LidarrClient,
    config: &Config,
    artist_id: i64,
) -> bool {
    match client.refresh_artist(artist_id).await {
        Ok(resp) => {
            info!(artist_id, command_id = resp.id, "RefreshArtist accepted");
            tokio::time::sleep(config.command_wait).await;
            true
        }
        Err(e) => {
            warn!(artist_id, error = %e, "RefreshArtist failed, skipping candidate");
            tokio::time::sleep(config.error_wait).await;
            false
        }
    }
}
