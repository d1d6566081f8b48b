//! # aura-sources
//!
//! Clients for everything Aura talks to over the network. All requests go
//! through the API proxy, which holds the third-party credentials.
//!
//! - [`MusicBrainzResolver`] turns an artist name into MusicBrainz and Discogs ids
//! - [`ItunesSource`], [`DiscogsSource`] and [`AudioDbSource`] fetch artist images
//! - [`LastFmClient`] fetches a user's top artists
//! - [`HeadlineClient`] asks the headline generator for a one-liner
//! - [`PixelSampler`] classifies image overlays as light or dark

pub mod client;
pub mod headline;
pub mod lastfm;
pub mod luminance;
pub mod musicbrainz;
pub mod providers;
pub mod rate_limit;

pub use client::{ProxyClient, ProxyResponse};
pub use headline::{headline_or_fallback, HeadlineClient, HeadlineSource};
pub use lastfm::{ArtistSource, LastFmClient};
pub use luminance::{overlay_luminance, LuminanceProbe, PixelSampler};
pub use musicbrainz::{MetadataSource, MusicBrainzResolver};
pub use providers::{AudioDbSource, DiscogsSource, ImageSource, ItunesSource, ProviderImage};
pub use rate_limit::{RateLimitPolicy, RateLimiter};
