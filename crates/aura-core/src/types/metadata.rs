//! Per-artist metadata gathered from the metadata and image providers.

use serde::{Deserialize, Serialize};

/// Canonical identifiers resolved for one artist.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct MetadataResult {
    /// MusicBrainz artist id.
    pub mbid: Option<String>,
    /// Discogs artist id.
    pub discogs_id: Option<String>,
}

impl MetadataResult {
    pub const fn empty() -> Self {
        Self {
            mbid: None,
            discogs_id: None,
        }
    }
}

/// Raw mood/genre/style descriptors for one artist.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PersonalitySample {
    pub name: String,
    pub genre: Option<String>,
    pub style: Option<String>,
    pub mood: Option<String>,
    pub playcount: u64,
}

impl PersonalitySample {
    /// A sample that carries no descriptors.
    pub fn empty(name: impl Into<String>, playcount: u64) -> Self {
        Self {
            name: name.into(),
            genre: None,
            style: None,
            mood: None,
            playcount,
        }
    }

    pub fn has_data(&self) -> bool {
        self.genre.is_some() || self.style.is_some() || self.mood.is_some()
    }
}
