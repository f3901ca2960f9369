//! Lidarr v1 API client
//!
//! Thin typed wrapper over the endpoints the hunter needs: catalog listing,
//! the paginated cutoff-unmet view, and the asynchronous command queue.
//! Command acceptance is signaled by an `id` field in the response body, so
//! every command helper returns the parsed [`CommandResponse`] or an error.

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

const API_KEY_HEADER: &str = "X-Api-Key";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Track-completion statistics attached to artists and albums
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Statistics {
    pub track_count: i64,
    pub track_file_count: i64,
}

impl Statistics {
    /// Number of tracks Lidarr knows about but has no file for
    pub fn missing_tracks(&self) -> i64 {
        (self.track_count - self.track_file_count).max(0)
    }
}

/// Artist from `GET /api/v1/artist`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Artist {
    pub id: i64,
    #[serde(default)]
    pub artist_name: Option<String>,
    #[serde(default)]
    pub monitored: bool,
    #[serde(default)]
    pub statistics: Statistics,
}

impl Artist {
    pub fn name(&self) -> &str {
        self.artist_name.as_deref().unwrap_or("Unknown Artist")
    }
}

/// Album from `GET /api/v1/album?artistId={id}`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Album {
    pub id: i64,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub monitored: bool,
    #[serde(default)]
    pub artist_id: i64,
    #[serde(default)]
    pub statistics: Statistics,
}

impl Album {
    pub fn title(&self) -> &str {
        self.title.as_deref().unwrap_or("Unknown Album")
    }
}

/// One page of the cutoff-unmet view (`GET /api/v1/wanted/cutoff`)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CutoffPage {
    pub page: u32,
    pub page_size: u32,
    #[serde(default)]
    pub total_records: u64,
    #[serde(default)]
    pub records: Vec<CutoffRecord>,
}

/// Below-cutoff album record; carries an embedded artist summary
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CutoffRecord {
    pub id: i64,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub monitored: bool,
    #[serde(default)]
    pub artist: Option<CutoffArtist>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CutoffArtist {
    pub id: i64,
    #[serde(default)]
    pub artist_name: Option<String>,
}

/// Acknowledgement for an accepted asynchronous command
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandResponse {
    pub id: i64,
}

/// Lidarr API client
pub struct LidarrClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl LidarrClient {
    pub fn new(base_url: &str, api_key: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}/api/v1/{}", self.base_url, endpoint)
    }

    /// List all artists in the catalog
    pub async fn artists(&self) -> Result<Vec<Artist>> {
        debug!("Fetching artist list from Lidarr");

        let response = self
            .client
            .get(self.url("artist"))
            .header(API_KEY_HEADER, &self.api_key)
            .send()
            .await
            .context("Failed to fetch artists from Lidarr")?;

        if !response.status().is_success() {
            anyhow::bail!("Lidarr artist list failed with status: {}", response.status());
        }

        let artists: Vec<Artist> = response
            .json()
            .await
            .context("Failed to parse Lidarr artist list")?;

        debug!(count = artists.len(), "Lidarr returned artists");
        Ok(artists)
    }

    /// List all albums of one artist
    pub async fn albums_for_artist(&self, artist_id: i64) -> Result<Vec<Album>> {
        debug!(artist_id, "Fetching albums from Lidarr");

        let response = self
            .client
            .get(self.url("album"))
            .query(&[("artistId", artist_id.to_string())])
            .header(API_KEY_HEADER, &self.api_key)
            .send()
            .await
            .context("Failed to fetch albums from Lidarr")?;

        if !response.status().is_success() {
            anyhow::bail!("Lidarr album list failed with status: {}", response.status());
        }

        let albums: Vec<Album> = response
            .json()
            .await
            .context("Failed to parse Lidarr album list")?;

        debug!(artist_id, count = albums.len(), "Lidarr returned albums");
        Ok(albums)
    }

    /// One page of albums whose quality is below the profile cutoff
    pub async fn cutoff_page(&self, page: u32, page_size: u32) -> Result<CutoffPage> {
        debug!(page, page_size, "Fetching cutoff-unmet page from Lidarr");

        let response = self
            .client
            .get(self.url("wanted/cutoff"))
            .query(&[("page", page.to_string()), ("pageSize", page_size.to_string())])
            .header(API_KEY_HEADER, &self.api_key)
            .send()
            .await
            .context("Failed to fetch cutoff-unmet albums from Lidarr")?;

        if !response.status().is_success() {
            anyhow::bail!(
                "Lidarr cutoff-unmet query failed with status: {}",
                response.status()
            );
        }

        response
            .json()
            .await
            .context("Failed to parse Lidarr cutoff-unmet page")
    }

    /// Refresh metadata for an artist
    pub async fn refresh_artist(&self, artist_id: i64) -> Result<CommandResponse> {
        self.command(
            "RefreshArtist",
            json!({ "name": "RefreshArtist", "artistIds": [artist_id] }),
        )
        .await
    }

    /// Search for all missing albums of an artist
    pub async fn missing_album_search(&self, artist_id: i64) -> Result<CommandResponse> {
        self.command(
            "MissingAlbumSearch",
            json!({ "name": "MissingAlbumSearch", "artistIds": [artist_id] }),
        )
        .await
    }

    /// Search for one specific album
    pub async fn album_search(&self, album_id: i64) -> Result<CommandResponse> {
        self.command(
            "AlbumSearch",
            json!({ "name": "AlbumSearch", "albumIds": [album_id] }),
        )
        .await
    }

    /// Artist-wide album search, used as a fallback when MissingAlbumSearch
    /// is rejected
    pub async fn album_search_for_artist(&self, artist_id: i64) -> Result<CommandResponse> {
        self.command(
            "AlbumSearch",
            json!({ "name": "AlbumSearch", "artistIds": [artist_id] }),
        )
        .await
    }

    /// Search for one specific track (for future track-level hunting)
    #[allow(dead_code)]
    pub async fn track_search(&self, track_id: i64) -> Result<CommandResponse> {
        self.command(
            "TrackSearch",
            json!({ "name": "TrackSearch", "trackIds": [track_id] }),
        )
        .await
    }

    async fn command(&self, name: &str, body: serde_json::Value) -> Result<CommandResponse> {
        debug!(command = name, "Submitting Lidarr command");

        let response = self
            .client
            .post(self.url("command"))
            .header(API_KEY_HEADER, &self.api_key)
            .json(&body)
            .send()
            .await
            .with_context(|| format!("Failed to submit {name} command"))?;

        if !response.status().is_success() {
            anyhow::bail!("{name} command failed with status: {}", response.status());
        }

        // A well-formed acknowledgement always carries the queued command id
        let accepted: CommandResponse = response
            .json()
            .await
            .with_context(|| format!("{name} command was not acknowledged with an id"))?;

        debug!(command = name, command_id = accepted.id, "Command accepted");
        Ok(accepted)
    }
}

impl std::fmt::Debug for LidarrClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LidarrClient")
            .field("base_url", &self.base_url)
            .finish()
    }
}
