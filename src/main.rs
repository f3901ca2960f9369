//! Harrier - library-completion hunter for Lidarr
//!
//! A long-lived polling daemon that scans a Lidarr catalog for incomplete or
//! below-cutoff content and issues refresh + search commands for a bounded,
//! checkpointed subset each cycle.

mod config;
mod jobs;
mod services;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::services::checkpoint::CheckpointStore;
use crate::services::lidarr::LidarrClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Tracing comes up before the config load so fallback warnings are visible
    let debug_mode = std::env::var("DEBUG_MODE")
        .map(|v| v == "true" || v == "1")
        .unwrap_or(false);
    let default_filter = if debug_mode {
        "harrier=debug"
    } else {
        "harrier=info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Harrier");
    let config = Config::from_env()?;
    config.log_summary();

    let client = LidarrClient::new(&config.api_url, &config.api_key)?;
    let store = CheckpointStore::new(&config.state_file_path);

    // The checkpoint is only written at the end-of-cycle save point, so an
    // interrupt mid-cycle never leaves partial state behind.
    tokio::select! {
        result = jobs::run_cycles(&config, &client, &store) => result,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Received ctrl-c, shutting down");
            Ok(())
        }
    }
}
