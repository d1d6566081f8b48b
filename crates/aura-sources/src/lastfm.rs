//! Top artists for a user, from Last.fm through the proxy.

use async_trait::async_trait;
use aura_core::{Artist, Error, Period, Result};
use serde::{Deserialize, Deserializer};
use tracing::{info, warn};

use crate::ProxyClient;

/// Source of a user's ordered top-artists list.
#[async_trait]
pub trait ArtistSource: Send + Sync {
    /// Fetch the list. An empty list is reported as [`Error::NoArtists`];
    /// any other failure as [`Error::UpstreamList`].
    async fn top_artists(&self, user: &str, period: Period, limit: u32) -> Result<Vec<Artist>>;
}

#[derive(Debug, Deserialize)]
struct TopArtistsResponse {
    #[serde(default)]
    artists: Vec<RawArtist>,
}

#[derive(Debug, Deserialize)]
struct RawArtist {
    name: String,
    #[serde(default)]
    url: String,
    #[serde(default, deserialize_with = "count_from_any")]
    playcount: u64,
    #[serde(default)]
    mbid: Option<String>,
}

impl From<RawArtist> for Artist {
    fn from(raw: RawArtist) -> Self {
        let artist = Self::new(raw.name, raw.playcount).with_url(raw.url);
        match raw.mbid {
            Some(mbid) => artist.with_mbid(mbid),
            None => artist,
        }
    }
}

/// Last.fm reports counts as strings.
fn count_from_any<'de, D>(deserializer: D) -> std::result::Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Count {
        Number(u64),
        Text(String),
    }

    Ok(match Count::deserialize(deserializer)? {
        Count::Number(n) => n,
        Count::Text(s) => s.trim().parse().unwrap_or(0),
    })
}

/// Last.fm client.
pub struct LastFmClient {
    client: ProxyClient,
}

impl LastFmClient {
    pub const fn new(client: ProxyClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ArtistSource for LastFmClient {
    async fn top_artists(&self, user: &str, period: Period, limit: u32) -> Result<Vec<Artist>> {
        if user.trim().is_empty() {
            return Err(Error::InvalidArgument("username is empty".to_string()));
        }

        let limit = limit.to_string();
        let query = [
            ("user", user.trim()),
            ("period", period.as_str()),
            ("limit", limit.as_str()),
        ];
        let response = self
            .client
            .get_json::<TopArtistsResponse>("api/lastfm/top-artists", &query)
            .await
            .map_err(|e| {
                warn!(user, "Top artists request failed: {e}");
                Error::UpstreamList(e.to_string())
            })?;

        let artists: Vec<Artist> = response
            .body
            .artists
            .into_iter()
            .filter(|a| !a.name.trim().is_empty())
            .map(Artist::from)
            .collect();

        if artists.is_empty() {
            return Err(Error::NoArtists(user.to_string()));
        }
        info!(user, count = artists.len(), %period, "Fetched top artists");
        Ok(artists)
    }
}
