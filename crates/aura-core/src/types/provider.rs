//! Image providers and the user's provider priority.

#![allow(clippy::unwrap_used)] // Tests use unwrap for brevity

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::Error;

/// An external source of artist images.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum ImageProvider {
    /// Apple's search API. Needs only the artist name.
    Itunes,
    /// Needs the Discogs id from the metadata resolver.
    Discogs,
    /// Needs the MusicBrainz id. Also carries mood/genre/style.
    #[serde(rename = "theaudiodb", alias = "audiodb")]
    TheAudioDb,
}

impl ImageProvider {
    /// Every provider, in the fixed fallback order.
    pub const ALL: [Self; 3] = [Self::TheAudioDb, Self::Discogs, Self::Itunes];

    /// Whether the provider can be queried without the metadata resolver.
    pub const fn is_independent(self) -> bool {
        matches!(self, Self::Itunes)
    }

    /// Whether the provider's CDN serves images that can be read back for
    /// pixel sampling.
    pub const fn supports_pixel_sampling(self) -> bool {
        matches!(self, Self::Itunes)
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Itunes => "itunes",
            Self::Discogs => "discogs",
            Self::TheAudioDb => "theaudiodb",
        }
    }

    /// Human-readable label.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Itunes => "iTunes",
            Self::Discogs => "Discogs",
            Self::TheAudioDb => "TheAudioDB",
        }
    }
}

impl fmt::Display for ImageProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ImageProvider {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "itunes" => Ok(Self::Itunes),
            "discogs" => Ok(Self::Discogs),
            "theaudiodb" | "audiodb" | "the_audio_db" => Ok(Self::TheAudioDb),
            other => Err(Error::InvalidArgument(format!("unknown provider {other:?}"))),
        }
    }
}

/// Ordered, duplicate-free provider preference. Position 0 is the primary.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(try_from = "Vec<ImageProvider>", into = "Vec<ImageProvider>")]
pub struct ProviderPriority(Vec<ImageProvider>);

impl ProviderPriority {
    pub fn new(order: Vec<ImageProvider>) -> crate::Result<Self> {
        if order.is_empty() {
            return Err(Error::Config("provider priority is empty".into()));
        }
        for (i, provider) in order.iter().enumerate() {
            if order[..i].contains(provider) {
                return Err(Error::Config(format!(
                    "provider {provider} listed more than once"
                )));
            }
        }
        Ok(Self(order))
    }

    /// Parse a comma-separated list such as `itunes,discogs`.
    pub fn parse(list: &str) -> crate::Result<Self> {
        let order = list
            .split(',')
            .filter(|s| !s.trim().is_empty())
            .map(str::parse)
            .collect::<crate::Result<Vec<_>>>()?;
        Self::new(order)
    }

    pub fn primary(&self) -> ImageProvider {
        self.0[0]
    }

    pub fn providers(&self) -> &[ImageProvider] {
        &self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = ImageProvider> + '_ {
        self.0.iter().copied()
    }

    pub fn position(&self, provider: ImageProvider) -> Option<usize> {
        self.0.iter().position(|p| *p == provider)
    }

    pub fn contains(&self, provider: ImageProvider) -> bool {
        self.0.contains(&provider)
    }

    /// Move `provider` to the front, appending it if it was not listed.
    pub fn promote(&mut self, provider: ImageProvider) {
        self.0.retain(|p| *p != provider);
        self.0.insert(0, provider);
    }
}

impl Default for ProviderPriority {
    fn default() -> Self {
        Self(ImageProvider::ALL.to_vec())
    }
}

impl TryFrom<Vec<ImageProvider>> for ProviderPriority {
    type Error = Error;

    fn try_from(order: Vec<ImageProvider>) -> Result<Self, Self::Error> {
        Self::new(order)
    }
}

impl From<ProviderPriority> for Vec<ImageProvider> {
    fn from(priority: ProviderPriority) -> Self {
        priority.0
    }
}

impl fmt::Display for ProviderPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<_> = self.0.iter().map(|p| p.as_str()).collect();
        f.write_str(&names.join(","))
    }
}
