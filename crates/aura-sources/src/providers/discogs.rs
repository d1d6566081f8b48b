//! Discogs artist images.

use async_trait::async_trait;
use aura_core::{Artist, ImageCandidate, ImageCandidates, ImageProvider, MetadataResult, Result};
use serde::Deserialize;
use tracing::debug;

use super::{ImageSource, ProviderImage};
use crate::{ProxyClient, RateLimitPolicy, RateLimiter};

#[derive(Debug, Deserialize)]
struct ArtistResponse {
    #[serde(default)]
    images: Vec<DiscogsImage>,
}

#[derive(Debug, Deserialize)]
struct DiscogsImage {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    uri: String,
    #[serde(default)]
    width: u32,
    #[serde(default)]
    height: u32,
}

impl From<DiscogsImage> for ImageCandidate {
    fn from(image: DiscogsImage) -> Self {
        let candidate = Self::new(image.uri, image.width, image.height);
        if image.kind == "primary" {
            candidate.as_primary()
        } else {
            candidate
        }
    }
}

/// Looks up images by Discogs artist id, behind its own rate limiter.
pub struct DiscogsSource {
    client: ProxyClient,
    limiter: RateLimiter,
    floor: u32,
}

impl DiscogsSource {
    pub fn new(client: ProxyClient, floor: u32) -> Self {
        Self {
            client,
            limiter: RateLimiter::new(RateLimitPolicy::DISCOGS),
            floor,
        }
    }
}

#[async_trait]
impl ImageSource for DiscogsSource {
    fn provider(&self) -> ImageProvider {
        ImageProvider::Discogs
    }

    async fn fetch(&self, artist: &Artist, metadata: &MetadataResult) -> Result<ProviderImage> {
        let Some(id) = metadata.discogs_id.as_deref() else {
            debug!(artist = %artist.name, "No Discogs id, skipping");
            return Ok(ProviderImage::none());
        };

        let path = format!("api/discogs/artist/{id}");
        let response: ArtistResponse = self
            .limiter
            .call(|| self.client.get_json(&path, &[]))
            .await?;

        let candidates = ImageCandidates::new(
            response.images.into_iter().map(ImageCandidate::from).collect(),
        );
        let url = candidates.select(self.floor).map(|c| c.url.clone());
        debug!(artist = %artist.name, found = url.is_some(), "Discogs lookup");
        Ok(url.map_or_else(ProviderImage::none, ProviderImage::url))
    }
}
