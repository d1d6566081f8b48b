//! TheAudioDB artist thumbnails plus mood/genre/style.

use std::time::Duration;

use async_trait::async_trait;
use aura_core::{Artist, ImageProvider, MetadataResult, PersonalitySample, Result};
use serde::Deserialize;
use tracing::debug;

use super::{ImageSource, ProviderImage};
use crate::rate_limit::retry_rate_limited;
use crate::ProxyClient;

/// Wait used when a rate-limit response carries no retry hint.
const DEFAULT_RETRY_WAIT: Duration = Duration::from_secs(2);

#[derive(Debug, Deserialize)]
struct ArtistResponse {
    /// `null` when the id is unknown.
    artists: Option<Vec<AudioDbArtist>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AudioDbArtist {
    str_artist_thumb: Option<String>,
    str_genre: Option<String>,
    str_style: Option<String>,
    str_mood: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl AudioDbArtist {
    fn into_image(self, artist: &Artist) -> ProviderImage {
        ProviderImage {
            url: non_empty(self.str_artist_thumb),
            personality: Some(PersonalitySample {
                name: artist.name.clone(),
                genre: non_empty(self.str_genre),
                style: non_empty(self.str_style),
                mood: non_empty(self.str_mood),
                playcount: artist.playcount,
            }),
        }
    }
}

/// Looks up artists by MusicBrainz id.
pub struct AudioDbSource {
    client: ProxyClient,
}

impl AudioDbSource {
    pub const fn new(client: ProxyClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ImageSource for AudioDbSource {
    fn provider(&self) -> ImageProvider {
        ImageProvider::TheAudioDb
    }

    async fn fetch(&self, artist: &Artist, metadata: &MetadataResult) -> Result<ProviderImage> {
        let Some(mbid) = metadata.mbid.as_deref() else {
            debug!(artist = %artist.name, "No MusicBrainz id, skipping TheAudioDB");
            return Ok(ProviderImage::none());
        };

        let path = format!("api/theaudiodb/artist/{mbid}");
        let response = retry_rate_limited(DEFAULT_RETRY_WAIT, || {
            self.client.get_json::<ArtistResponse>(&path, &[])
        })
        .await?;

        let image = response
            .body
            .artists
            .and_then(|artists| artists.into_iter().next())
            .map_or_else(ProviderImage::none, |a| a.into_image(artist));
        debug!(artist = %artist.name, found = image.url.is_some(), "TheAudioDB lookup");
        Ok(image)
    }
}
