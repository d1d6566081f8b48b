//! Backend services wiring.
//!
//! - [`Backends`] bundles the network clients behind their traits
//! - [`ImagePipeline`] memoizes provider fetches and metadata resolution

pub mod pipeline;

#[cfg(test)]
pub mod fakes;

pub use pipeline::ImagePipeline;

use std::sync::Arc;

use aura_core::{Config, Result};
use aura_sources::{
    ArtistSource, AudioDbSource, DiscogsSource, HeadlineClient, HeadlineSource, ImageSource,
    ItunesSource, LastFmClient, LuminanceProbe, MetadataSource, MusicBrainzResolver,
    PixelSampler, ProxyClient,
};
use tracing::info;

/// Everything the session talks to over the network.
#[derive(Clone)]
pub struct Backends {
    pub artists: Arc<dyn ArtistSource>,
    pub metadata: Arc<dyn MetadataSource>,
    pub images: Vec<Arc<dyn ImageSource>>,
    pub headline: Arc<dyn HeadlineSource>,
    pub luminance: Arc<dyn LuminanceProbe>,
}

impl Backends {
    /// Build the real clients, all sharing one connection pool.
    pub fn from_config(config: &Config) -> Result<Self> {
        let client = ProxyClient::new(config)?;
        info!(proxy = %config.proxy_base_url, "Using API proxy");

        let images: Vec<Arc<dyn ImageSource>> = vec![
            Arc::new(ItunesSource::new(client.clone(), config.tile_size)),
            Arc::new(DiscogsSource::new(client.clone(), config.image_floor)),
            Arc::new(AudioDbSource::new(client.clone())),
        ];

        Ok(Self {
            artists: Arc::new(LastFmClient::new(client.clone())),
            metadata: Arc::new(MusicBrainzResolver::new(client.clone())),
            images,
            headline: Arc::new(HeadlineClient::new(client.clone())),
            luminance: Arc::new(PixelSampler::new(
                client,
                config.luminance_threshold,
                config.overlay_top,
            )),
        })
    }
}
