//! Quality-upgrade hunt pass
//!
//! Lidarr already knows which albums sit below their profile cutoff, so this
//! pass walks the paginated wanted/cutoff view instead of re-deriving quality
//! state. Upgrade searches are bounded per cycle but not checkpointed; an
//! album stays in the cutoff view until Lidarr lands a better release.

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::jobs::refresh_and_wait;
use crate::services::lidarr::{CutoffRecord, LidarrClient};
use crate::services::selector;

const CUTOFF_PAGE_SIZE: u32 = 100;

/// A below-cutoff album queued for an upgrade search
#[derive(Debug, Clone)]
struct UpgradeCandidate {
    artist_id: i64,
    artist_name: String,
    album_id: i64,
    album_title: String,
}

/// Hunt albums whose quality is below the profile cutoff
///
/// Returns how many upgrade searches were accepted.
pub async fn hunt_upgrades(client: &LidarrClient, config: &Config) -> Result<usize> {
    if config.hunt_upgrade_albums == 0 {
        debug!("Upgrade budget is 0, skipping upgrade pass");
        return Ok(0);
    }

    let records = fetch_cutoff_records(client).await?;

    let candidates: Vec<UpgradeCandidate> = records
        .into_iter()
        .filter_map(|record| to_candidate(record, config.monitored_only))
        .collect();

    if candidates.is_empty() {
        info!("No albums below cutoff");
        return Ok(0);
    }

    info!(
        candidates = candidates.len(),
        budget = config.hunt_upgrade_albums,
        "Hunting below-cutoff albums"
    );

    let picked = selector::select(
        candidates,
        config.hunt_upgrade_albums,
        config.random_selection,
    );

    let mut processed = 0;
    for album in picked {
        info!(
            album = %album.album_title,
            artist = %album.artist_name,
            "Processing below-cutoff album"
        );

        if !refresh_and_wait(client, config, album.artist_id).await {
            continue;
        }

        match client.album_search(album.album_id).await {
            Ok(resp) => {
                info!(command_id = resp.id, "Upgrade AlbumSearch accepted");
                processed += 1;
            }
            Err(e) => {
                warn!(
                    album_id = album.album_id,
                    error = %e,
                    "Upgrade AlbumSearch rejected"
                );
                tokio::time::sleep(config.error_wait).await;
            }
        }
    }

    info!(processed, "Upgrade pass complete");
    Ok(processed)
}

/// Walk wanted/cutoff pages until a short page signals the end
async fn fetch_cutoff_records(client: &LidarrClient) -> Result<Vec<CutoffRecord>> {
    let mut records = Vec::new();
    let mut page = 1;
    loop {
        let batch = client
            .cutoff_page(page, CUTOFF_PAGE_SIZE)
            .await
            .context("Upgrade pass could not fetch the cutoff-unmet view")?;

        let fetched = batch.records.len();
        debug!(page = batch.page, fetched, "Fetched cutoff-unmet page");
        records.extend(batch.records);

        // a short page, or reaching the reported total, ends the walk
        if fetched < batch.page_size.max(1) as usize || records.len() as u64 >= batch.total_records
        {
            break;
        }
        page += 1;
    }

    debug!(count = records.len(), "Collected cutoff-unmet records");
    Ok(records)
}

/// Records without an embedded artist carry no usable ids and are dropped
fn to_candidate(record: CutoffRecord, monitored_only: bool) -> Option<UpgradeCandidate> {
    let artist = record.artist?;
    if monitored_only && !record.monitored {
        return None;
    }
    Some(UpgradeCandidate {
        artist_id: artist.id,
        artist_name: artist
            .artist_name
            .unwrap_or_else(|| "Unknown Artist".to_string()),
        album_id: record.id,
        album_title: record
            .title
            .unwrap_or_else(|| "Unknown Album".to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::testing;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_upgrade_pass_searches_below_cutoff_album() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/v1/wanted/cutoff")
            .match_query(mockito::Matcher::UrlEncoded("page".into(), "1".into()))
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"page": 1, "pageSize": 100, "totalRecords": 2, "records": [
                    {"id": 41, "title": "Low Bitrate", "monitored": true,
                     "artist": {"id": 7, "artistName": "Plaid"}},
                    {"id": 42, "title": "Unmonitored", "monitored": false,
                     "artist": {"id": 8, "artistName": "Orbital"}}
                ]}"#,
            )
            .create_async()
            .await;
        let command = server
            .mock("POST", "/api/v1/command")
            .with_header("content-type", "application/json")
            .with_body(r#"{"id": 77}"#)
            .expect(2) // refresh + search for the single monitored candidate
            .create_async()
            .await;

        let config = testing::config(&server.url());
        let client = LidarrClient::new(&config.api_url, &config.api_key).unwrap();

        let processed = hunt_upgrades(&client, &config).await.unwrap();

        assert_eq!(processed, 1);
        command.assert_async().await;
    }

    fn cutoff_page_body(page: u32, ids: std::ops::Range<i64>, total: u64) -> String {
        let records: Vec<serde_json::Value> = ids
            .map(|id| {
                serde_json::json!({
                    "id": id,
                    "title": format!("Album {id}"),
                    "monitored": true,
                    "artist": {"id": 1000 + id, "artistName": "Artist"}
                })
            })
            .collect();
        serde_json::json!({
            "page": page,
            "pageSize": 100,
            "totalRecords": total,
            "records": records
        })
        .to_string()
    }

    #[tokio::test]
    async fn test_cutoff_walk_collects_every_page_then_stops() {
        let mut server = mockito::Server::new_async().await;

        // two pages: a full one, then a short one that ends the walk
        server
            .mock("GET", "/api/v1/wanted/cutoff")
            .match_query(mockito::Matcher::UrlEncoded("page".into(), "1".into()))
            .with_header("content-type", "application/json")
            .with_body(cutoff_page_body(1, 0..100, 150))
            .create_async()
            .await;
        let page_two = server
            .mock("GET", "/api/v1/wanted/cutoff")
            .match_query(mockito::Matcher::UrlEncoded("page".into(), "2".into()))
            .with_header("content-type", "application/json")
            .with_body(cutoff_page_body(2, 100..150, 150))
            .create_async()
            .await;
        let page_three = server
            .mock("GET", "/api/v1/wanted/cutoff")
            .match_query(mockito::Matcher::UrlEncoded("page".into(), "3".into()))
            .expect(0)
            .create_async()
            .await;

        let config = testing::config(&server.url());
        let client = LidarrClient::new(&config.api_url, &config.api_key).unwrap();

        let records = fetch_cutoff_records(&client).await.unwrap();

        assert_eq!(records.len(), 150);
        assert_eq!(records[0].id, 0);
        assert_eq!(records[149].id, 149);
        page_two.assert_async().await;
        page_three.assert_async().await;
    }

    #[tokio::test]
    async fn test_zero_budget_skips_upgrade_pass() {
        let mut server = mockito::Server::new_async().await;
        let cutoff = server
            .mock("GET", "/api/v1/wanted/cutoff")
            .expect(0)
            .create_async()
            .await;

        let mut config = testing::config(&server.url());
        config.hunt_upgrade_albums = 0;
        let client = LidarrClient::new(&config.api_url, &config.api_key).unwrap();

        assert_eq!(hunt_upgrades(&client, &config).await.unwrap(), 0);
        cutoff.assert_async().await;
    }

    #[test]
    fn test_record_without_artist_is_dropped() {
        let record = CutoffRecord {
            id: 1,
            title: Some("Orphan".to_string()),
            monitored: true,
            artist: None,
        };
        assert!(to_candidate(record, false).is_none());
    }

    #[test]
    fn test_monitored_only_filters_candidates() {
        let record = CutoffRecord {
            id: 1,
            title: None,
            monitored: false,
            artist: Some(crate::services::lidarr::CutoffArtist {
                id: 2,
                artist_name: None,
            }),
        };
        assert!(to_candidate(record.clone(), true).is_none());

        let candidate = to_candidate(record, false).unwrap();
        assert_eq!(candidate.artist_name, "Unknown Artist");
        assert_eq!(candidate.album_title, "Unknown Album");
    }
}
