//! iTunes album artwork, used as an artist image.

use async_trait::async_trait;
use aura_core::{Artist, ImageProvider, MetadataResult, Result};
use serde::Deserialize;
use tracing::debug;

use super::{ImageSource, ProviderImage};
use crate::ProxyClient;

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchResult>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchResult {
    artist_name: Option<String>,
    artwork_url100: Option<String>,
}

/// Searches albums by artist name. Needs no metadata.
pub struct ItunesSource {
    client: ProxyClient,
    tile_size: u32,
}

impl ItunesSource {
    pub const fn new(client: ProxyClient, tile_size: u32) -> Self {
        Self { client, tile_size }
    }
}

#[async_trait]
impl ImageSource for ItunesSource {
    fn provider(&self) -> ImageProvider {
        ImageProvider::Itunes
    }

    async fn fetch(&self, artist: &Artist, _metadata: &MetadataResult) -> Result<ProviderImage> {
        let query = [("term", artist.name.as_str()), ("entity", "album"), ("limit", "10")];
        let response = self
            .client
            .get_json::<SearchResponse>("api/itunes/search", &query)
            .await?;

        let url = pick_artwork(&response.body.results, &artist.name, self.tile_size);
        debug!(artist = %artist.name, found = url.is_some(), "iTunes lookup");
        Ok(url.map_or_else(ProviderImage::none, ProviderImage::url))
    }
}

/// Artwork of the first result credited to exactly this artist, upscaled
/// to the tile size.
fn pick_artwork(results: &[SearchResult], name: &str, size: u32) -> Option<String> {
    let wanted = name.trim().to_lowercase();
    results
        .iter()
        .filter(|r| {
            r.artist_name
                .as_deref()
                .is_some_and(|n| n.trim().to_lowercase() == wanted)
        })
        .find_map(|r| r.artwork_url100.as_deref())
        .filter(|url| !url.is_empty())
        .map(|url| url.replace("100x100", &format!("{size}x{size}")))
}
