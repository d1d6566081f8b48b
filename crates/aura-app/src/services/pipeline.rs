//! Cache-first image and metadata fetching.

use std::collections::HashMap;
use std::sync::Arc;

use aura_cache::SessionCaches;
use aura_core::{Artist, ImageProvider, MetadataResult, PersonalitySample};
use aura_sources::{ImageSource, MetadataSource, ProviderImage};
use tracing::debug;

/// Fetches provider images through the session caches.
///
/// Every result, including "no image", is cached before it is returned, so a
/// second fetch for the same artist and provider never reaches the network.
#[derive(Clone)]
pub struct ImagePipeline {
    caches: Arc<SessionCaches>,
    metadata: Arc<dyn MetadataSource>,
    sources: Arc<HashMap<ImageProvider, Arc<dyn ImageSource>>>,
}

impl ImagePipeline {
    pub fn new(
        caches: Arc<SessionCaches>,
        metadata: Arc<dyn MetadataSource>,
        sources: &[Arc<dyn ImageSource>],
    ) -> Self {
        let sources = sources
            .iter()
            .map(|source| (source.provider(), Arc::clone(source)))
            .collect();
        Self {
            caches,
            metadata,
            sources: Arc::new(sources),
        }
    }

    pub fn caches(&self) -> &Arc<SessionCaches> {
        &self.caches
    }

    /// Resolve identifiers for `artist`, at most once per process.
    pub async fn metadata(&self, artist: &Artist) -> MetadataResult {
        let resolver = Arc::clone(&self.metadata);
        self.caches
            .metadata
            .get_or_resolve(&artist.name, || async move {
                resolver.resolve(&artist.name, artist.mbid.as_deref()).await
            })
            .await
    }

    /// Image URL for one artist from one provider, or `None` if it has none.
    pub async fn fetch(&self, artist: &Artist, provider: ImageProvider) -> Option<String> {
        if let Some(cached) = self.caches.images.get(&artist.name, provider) {
            return cached;
        }

        let result = match self.sources.get(&provider) {
            Some(source) => {
                let metadata = if provider.is_independent() {
                    MetadataResult::empty()
                } else {
                    self.metadata(artist).await
                };
                source.fetch(artist, &metadata).await.unwrap_or_else(|e| {
                    debug!(artist = %artist.name, %provider, "Image fetch failed: {e}");
                    ProviderImage::none()
                })
            }
            None => {
                debug!(%provider, "Provider not configured");
                ProviderImage::none()
            }
        };

        if let Some(sample) = result.personality {
            self.caches.personality.insert(sample);
        }
        self.caches
            .images
            .insert(&artist.name, provider, result.url.clone());
        result.url
    }

    /// Personality descriptors for `artist`, weighted by this load's
    /// playcount. Empty when TheAudioDB knows nothing about the artist.
    pub async fn personality(&self, artist: &Artist) -> PersonalitySample {
        if self.caches.personality.get(&artist.name).is_none() {
            self.fetch(artist, ImageProvider::TheAudioDb).await;
        }
        self.caches.personality.get(&artist.name).map_or_else(
            || PersonalitySample::empty(&artist.name, artist.playcount),
            |mut sample| {
                sample.name.clone_from(&artist.name);
                sample.playcount = artist.playcount;
                sample
            },
        )
    }
}
