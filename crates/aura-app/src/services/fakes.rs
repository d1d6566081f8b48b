//! In-memory backends for tests.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use aura_core::{
    artist_key, Artist, Error, ImageProvider, MetadataResult, Period, PersonalitySample, Result,
};
use aura_personality::HeadlineRequest;
use aura_sources::{
    ArtistSource, HeadlineSource, ImageSource, LuminanceProbe, MetadataSource, ProviderImage,
};

use super::Backends;

pub struct FakeImages {
    provider: ImageProvider,
    urls: HashMap<String, String>,
    moods: HashMap<String, String>,
    delay: Duration,
    failing: bool,
    calls: AtomicUsize,
}

impl FakeImages {
    pub fn new(provider: ImageProvider) -> Self {
        Self {
            provider,
            urls: HashMap::new(),
            moods: HashMap::new(),
            delay: Duration::ZERO,
            failing: false,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with(mut self, artist: &str, url: &str) -> Self {
        self.urls.insert(artist_key(artist), url.to_string());
        self
    }

    pub fn with_mood(mut self, artist: &str, mood: &str) -> Self {
        self.moods.insert(artist_key(artist), mood.to_string());
        self
    }

    pub const fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub const fn failing(mut self) -> Self {
        self.failing = true;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ImageSource for FakeImages {
    fn provider(&self) -> ImageProvider {
        self.provider
    }

    async fn fetch(&self, artist: &Artist, _metadata: &MetadataResult) -> Result<ProviderImage> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if self.failing {
            return Err(Error::RateLimited {
                retry_after_secs: None,
                remaining: None,
            });
        }
        let key = artist.key();
        let personality = (self.provider == ImageProvider::TheAudioDb).then(|| PersonalitySample {
            name: artist.name.clone(),
            genre: None,
            style: None,
            mood: self.moods.get(&key).cloned(),
            playcount: artist.playcount,
        });
        Ok(ProviderImage {
            url: self.urls.get(&key).cloned(),
            personality,
        })
    }
}

#[derive(Default)]
pub struct FakeMetadata {
    calls: AtomicUsize,
}

impl FakeMetadata {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MetadataSource for FakeMetadata {
    async fn resolve(&self, name: &str, _known_mbid: Option<&str>) -> MetadataResult {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(10)).await;
        let key = artist_key(name);
        MetadataResult {
            mbid: Some(format!("mb-{key}")),
            discogs_id: Some(format!("dc-{key}")),
        }
    }
}

#[derive(Default)]
pub struct FakeArtists {
    users: HashMap<String, Vec<Artist>>,
}

impl FakeArtists {
    pub fn with(mut self, user: &str, artists: Vec<Artist>) -> Self {
        self.users.insert(user.to_string(), artists);
        self
    }
}

#[async_trait]
impl ArtistSource for FakeArtists {
    async fn top_artists(&self, user: &str, _period: Period, limit: u32) -> Result<Vec<Artist>> {
        match self.users.get(user) {
            Some(artists) if artists.is_empty() => Err(Error::NoArtists(user.to_string())),
            Some(artists) => Ok(artists.iter().take(limit as usize).cloned().collect()),
            None => Err(Error::UpstreamList(format!("user {user} not found"))),
        }
    }
}

pub struct FakeHeadline(pub Option<String>);

#[async_trait]
impl HeadlineSource for FakeHeadline {
    async fn headline(&self, request: &HeadlineRequest) -> Result<String> {
        self.0
            .clone()
            .map(|h| format!("{h} #{}", request.seed))
            .ok_or_else(|| Error::Network("headline service down".into()))
    }
}

#[derive(Default)]
pub struct FakeLuminance {
    light: HashSet<String>,
}

impl FakeLuminance {
    pub fn with_light(mut self, url: &str) -> Self {
        self.light.insert(url.to_string());
        self
    }
}

#[async_trait]
impl LuminanceProbe for FakeLuminance {
    async fn is_light(&self, url: &str) -> Result<bool> {
        Ok(self.light.contains(url))
    }
}

/// Backends wired from fakes, keeping handles to the image fakes.
pub struct FakeBackends {
    pub itunes: Arc<FakeImages>,
    pub discogs: Arc<FakeImages>,
    pub audiodb: Arc<FakeImages>,
    pub metadata: Arc<FakeMetadata>,
    pub artists: FakeArtists,
    pub headline: Option<String>,
    pub luminance: FakeLuminance,
}

impl FakeBackends {
    pub fn new(itunes: FakeImages, discogs: FakeImages, audiodb: FakeImages) -> Self {
        Self {
            itunes: Arc::new(itunes),
            discogs: Arc::new(discogs),
            audiodb: Arc::new(audiodb),
            metadata: Arc::new(FakeMetadata::default()),
            artists: FakeArtists::default(),
            headline: Some("Moody".to_string()),
            luminance: FakeLuminance::default(),
        }
    }

    pub fn backends(self) -> Backends {
        Backends {
            artists: Arc::new(self.artists),
            metadata: self.metadata,
            images: vec![self.itunes, self.discogs, self.audiodb],
            headline: Arc::new(FakeHeadline(self.headline)),
            luminance: Arc::new(self.luminance),
        }
    }
}
