//! Missing-content hunt passes
//!
//! Artist mode works off the artist list's own track statistics and fires a
//! MissingAlbumSearch per artist (with an artist-wide AlbumSearch fallback).
//! Album mode walks every artist's albums and fires an AlbumSearch per
//! incomplete album. Candidates are only marked processed once a search
//! command is acknowledged, so failed ones come back next cycle.

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::jobs::refresh_and_wait;
use crate::services::checkpoint::Checkpoint;
use crate::services::lidarr::{Artist, LidarrClient};
use crate::services::selector;

/// An incomplete album queued for hunting
#[derive(Debug, Clone)]
struct AlbumCandidate {
    artist_id: i64,
    artist_name: String,
    album_id: i64,
    album_title: String,
    missing_tracks: i64,
}

/// Hunt artists with missing tracks
///
/// Returns how many artists were newly marked processed.
pub async fn hunt_artists(
    client: &LidarrClient,
    config: &Config,
    checkpoint: &mut Checkpoint,
) -> Result<usize> {
    if config.hunt_missing_items == 0 {
        debug!("Missing-item budget is 0, skipping artist pass");
        return Ok(0);
    }

    let artists = client
        .artists()
        .await
        .context("Artist pass could not fetch the catalog")?;

    let candidates: Vec<Artist> = artists
        .into_iter()
        .filter(|a| !config.monitored_only || a.monitored)
        .filter(|a| selector::is_incomplete(&a.statistics))
        .filter(|a| !checkpoint.processed_artists.contains(&a.id))
        .collect();

    if candidates.is_empty() {
        info!("No unprocessed incomplete artists");
        return Ok(0);
    }

    info!(
        candidates = candidates.len(),
        budget = config.hunt_missing_items,
        "Hunting incomplete artists"
    );

    let picked = selector::select(candidates, config.hunt_missing_items, config.random_selection);

    let mut processed = 0;
    for artist in picked {
        info!(
            artist = %artist.name(),
            artist_id = artist.id,
            missing_tracks = artist.statistics.missing_tracks(),
            "Processing incomplete artist"
        );

        if !refresh_and_wait(client, config, artist.id).await {
            continue;
        }

        match client.missing_album_search(artist.id).await {
            Ok(resp) => {
                info!(command_id = resp.id, "MissingAlbumSearch accepted");
                checkpoint.processed_artists.insert(artist.id);
                processed += 1;
            }
            Err(e) => {
                warn!(error = %e, "MissingAlbumSearch rejected, trying artist-wide AlbumSearch");
                match client.album_search_for_artist(artist.id).await {
                    Ok(resp) => {
                        info!(command_id = resp.id, "Fallback AlbumSearch accepted");
                        checkpoint.processed_artists.insert(artist.id);
                        processed += 1;
                    }
                    Err(e) => {
                        warn!(
                            artist_id = artist.id,
                            error = %e,
                            "Fallback AlbumSearch rejected, leaving artist for next cycle"
                        );
                        tokio::time::sleep(config.error_wait).await;
                    }
                }
            }
        }
    }

    Ok(processed)
}

/// Hunt individual albums with missing tracks
///
/// Returns how many albums were newly marked processed.
pub async fn hunt_albums(
    client: &LidarrClient,
    config: &Config,
    checkpoint: &mut Checkpoint,
) -> Result<usize> {
    if config.hunt_missing_items == 0 {
        debug!("Missing-item budget is 0, skipping album pass");
        return Ok(0);
    }

    let artists = client
        .artists()
        .await
        .context("Album pass could not fetch the catalog")?;

    let mut candidates = Vec::new();
    for artist in &artists {
        if config.monitored_only && !artist.monitored {
            continue;
        }

        let albums = match client.albums_for_artist(artist.id).await {
            Ok(albums) => albums,
            Err(e) => {
                warn!(
                    artist = %artist.name(),
                    artist_id = artist.id,
                    error = %e,
                    "Could not list albums, skipping artist"
                );
                continue;
            }
        };

        for album in albums {
            if checkpoint.processed_albums.contains(&album.id) {
                continue;
            }
            if config.monitored_only && !album.monitored {
                continue;
            }
            if !selector::is_incomplete(&album.statistics) {
                continue;
            }
            candidates.push(AlbumCandidate {
                artist_id: artist.id,
                artist_name: artist.name().to_string(),
                album_id: album.id,
                album_title: album.title().to_string(),
                missing_tracks: album.statistics.missing_tracks(),
            });
        }
    }

    if candidates.is_empty() {
        info!("No unprocessed incomplete albums");
        return Ok(0);
    }

    info!(
        candidates = candidates.len(),
        budget = config.hunt_missing_items,
        "Hunting incomplete albums"
    );

    let picked = selector::select(candidates, config.hunt_missing_items, config.random_selection);

    let mut processed = 0;
    for album in picked {
        info!(
            album = %album.album_title,
            artist = %album.artist_name,
            missing_tracks = album.missing_tracks,
            "Processing incomplete album"
        );

        if !refresh_and_wait(client, config, album.artist_id).await {
            continue;
        }

        match client.album_search(album.album_id).await {
            Ok(resp) => {
                info!(command_id = resp.id, "AlbumSearch accepted");
                checkpoint.processed_albums.insert(album.album_id);
                processed += 1;
            }
            Err(e) => {
                warn!(
                    album_id = album.album_id,
                    error = %e,
                    "AlbumSearch rejected, leaving album for next cycle"
                );
                tokio::time::sleep(config.error_wait).await;
            }
        }
    }

    Ok(processed)
}
