//! # aura-cache
//!
//! In-memory caches that live as long as the process.
//!
//! Every lookup the pipeline makes is keyed on stable `(artist, provider)`
//! pairs, never on list positions, so results for a previous user can land
//! harmlessly and be reused when the same artist shows up again. Nothing here
//! is cleared when the user changes.

use std::sync::Arc;

use aura_core::{artist_key, ImageProvider, MetadataResult, PersonalitySample};
use dashmap::DashMap;
use tokio::sync::OnceCell;
use tracing::debug;

type PairKey = (String, ImageProvider);

fn pair(artist: &str, provider: ImageProvider) -> PairKey {
    (artist_key(artist), provider)
}

/// Image URL per `(artist, provider)`.
///
/// A stored `None` means the provider confirmed it has no image; a missing
/// entry means the pair has not been attempted yet.
#[derive(Debug, Default)]
pub struct ImageCache {
    entries: DashMap<PairKey, Option<String>>,
}

impl ImageCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// `None` if never attempted, `Some(None)` if confirmed empty.
    pub fn get(&self, artist: &str, provider: ImageProvider) -> Option<Option<String>> {
        self.entries
            .get(&pair(artist, provider))
            .map(|entry| entry.value().clone())
    }

    pub fn insert(&self, artist: &str, provider: ImageProvider, url: Option<String>) {
        self.entries.insert(pair(artist, provider), url);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Whether the overlay region of a tile's image is light.
#[derive(Debug, Default)]
pub struct LuminanceCache {
    entries: DashMap<PairKey, bool>,
}

impl LuminanceCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, artist: &str, provider: ImageProvider) -> Option<bool> {
        self.entries.get(&pair(artist, provider)).map(|e| *e.value())
    }

    pub fn insert(&self, artist: &str, provider: ImageProvider, light: bool) {
        self.entries.insert(pair(artist, provider), light);
    }

    /// Light/dark classification to render with. Providers that cannot be
    /// sampled, and pairs not yet sampled, are dark.
    pub fn is_light(&self, artist: &str, provider: ImageProvider) -> bool {
        provider.supports_pixel_sampling() && self.get(artist, provider).unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Resolved identifiers per artist, resolved at most once per process.
#[derive(Debug, Default)]
pub struct MetadataCache {
    cells: DashMap<String, Arc<OnceCell<MetadataResult>>>,
}

impl MetadataCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn key(artist: &str) -> String {
        format!("{}:mb", artist_key(artist))
    }

    fn cell(&self, artist: &str) -> Arc<OnceCell<MetadataResult>> {
        self.cells.entry(Self::key(artist)).or_default().clone()
    }

    /// Return the cached result, or run `resolve` to produce it.
    ///
    /// Concurrent callers for the same artist share one resolution: the first
    /// runs `resolve`, the others wait for its result.
    pub async fn get_or_resolve<F, Fut>(&self, artist: &str, resolve: F) -> MetadataResult
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = MetadataResult>,
    {
        let cell = self.cell(artist);
        cell.get_or_init(|| async {
            debug!(artist, "Resolving metadata");
            resolve().await
        })
        .await
        .clone()
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// Personality samples per artist.
#[derive(Debug, Default)]
pub struct PersonalityCache {
    entries: DashMap<String, PersonalitySample>,
}

impl PersonalityCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, artist: &str) -> Option<PersonalitySample> {
        self.entries.get(&artist_key(artist)).map(|e| e.value().clone())
    }

    pub fn insert(&self, sample: PersonalitySample) {
        self.entries.insert(artist_key(&sample.name), sample);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// All caches shared by one process.
#[derive(Debug, Default)]
pub struct SessionCaches {
    pub images: ImageCache,
    pub luminance: LuminanceCache,
    pub metadata: MetadataCache,
    pub personality: PersonalityCache,
}

impl SessionCaches {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Get cache statistics.
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            image_count: self.images.len(),
            luminance_count: self.luminance.len(),
            metadata_count: self.metadata.len(),
            personality_count: self.personality.len(),
        }
    }
}

/// Cache statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of `(artist, provider)` image attempts.
    pub image_count: usize,
    /// Number of sampled overlay luminances.
    pub luminance_count: usize,
    /// Number of artists with metadata lookups.
    pub metadata_count: usize,
    /// Number of personality samples.
    pub personality_count: usize,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_confirmed_empty_differs_from_unattempted() {
        let cache = ImageCache::new();
        assert_eq!(cache.get("Low", ImageProvider::Itunes), None);
        cache.insert("Low", ImageProvider::Itunes, None);
        assert_eq!(cache.get("low", ImageProvider::Itunes), Some(None));
        assert_eq!(cache.get("Low", ImageProvider::Discogs), None);
    }

    #[test]
    fn test_luminance_defaults_dark_for_unsampled_providers() {
        let cache = LuminanceCache::new();
        cache.insert("Low", ImageProvider::Discogs, true);
        assert!(!cache.is_light("Low", ImageProvider::Discogs));
        cache.insert("Low", ImageProvider::Itunes, true);
        assert!(cache.is_light("Low", ImageProvider::Itunes));
        assert!(!cache.is_light("Can", ImageProvider::Itunes));
    }

    #[tokio::test]
    async fn test_metadata_resolves_once() {
        let cache = Arc::new(MetadataCache::new());
        let calls = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for name in ["Slowdive", "slowdive", "SLOWDIVE"] {
            let cache = cache.clone();
            let calls = calls.clone();
            handles.push(tokio::spawn(async move {
                cache
                    .get_or_resolve(name, || async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        tokio::task::yield_now().await;
                        MetadataResult {
                            mbid: Some("abc".to_string()),
                            discogs_id: None,
                        }
                    })
                    .await
            }));
        }
        for handle in handles {
            let result = handle.await.unwrap();
            assert_eq!(result.mbid.as_deref(), Some("abc"));
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_stats() {
        let caches = SessionCaches::new();
        caches.images.insert("a", ImageProvider::Itunes, Some("u".into()));
        caches.personality.insert(PersonalitySample::empty("a", 1));
        let stats = caches.stats();
        assert_eq!(stats.image_count, 1);
        assert_eq!(stats.personality_count, 1);
        assert_eq!(stats.metadata_count, 0);
    }
}
