//! Artist image providers.

mod audiodb;
mod discogs;
mod itunes;

pub use audiodb::AudioDbSource;
pub use discogs::DiscogsSource;
pub use itunes::ItunesSource;

use async_trait::async_trait;
use aura_core::{Artist, ImageProvider, MetadataResult, PersonalitySample, Result};

/// What one provider returned for one artist.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProviderImage {
    /// Best image URL, or `None` if the provider has nothing usable.
    pub url: Option<String>,
    /// Mood/genre/style descriptors, for providers that carry them.
    pub personality: Option<PersonalitySample>,
}

impl ProviderImage {
    pub const fn none() -> Self {
        Self {
            url: None,
            personality: None,
        }
    }

    pub const fn url(url: String) -> Self {
        Self {
            url: Some(url),
            personality: None,
        }
    }
}

/// One image provider.
///
/// Independent providers ignore `metadata`; dependent providers return
/// [`ProviderImage::none`] when the id they need is missing.
#[async_trait]
pub trait ImageSource: Send + Sync {
    fn provider(&self) -> ImageProvider;

    async fn fetch(&self, artist: &Artist, metadata: &MetadataResult) -> Result<ProviderImage>;
}
