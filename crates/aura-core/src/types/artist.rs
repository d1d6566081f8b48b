//! Artist type representing one entry of a user's top-artists list.

use serde::{Deserialize, Serialize};

/// A music artist as returned by the top-artists source.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Artist {
    /// Display name.
    pub name: String,
    /// Profile page URL.
    pub url: String,
    /// Number of plays in the selected period.
    pub playcount: u64,
    /// MusicBrainz identifier, when the source already knows it.
    pub mbid: Option<String>,
}

impl Artist {
    pub fn new(name: impl Into<String>, playcount: u64) -> Self {
        Self {
            name: name.into(),
            url: String::new(),
            playcount,
            mbid: None,
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    pub fn with_mbid(mut self, mbid: impl Into<String>) -> Self {
        let mbid = mbid.into();
        self.mbid = (!mbid.trim().is_empty()).then_some(mbid);
        self
    }

    /// Session identity of this artist.
    pub fn key(&self) -> String {
        artist_key(&self.name)
    }
}

/// Case-insensitive identity key for an artist name.
pub fn artist_key(name: &str) -> String {
    name.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_artist_key_ignores_case() {
        let a = Artist::new("Radiohead", 10);
        let b = Artist::new("  RADIOHEAD ", 3);
        assert_eq!(a.key(), b.key());
    }

    #[test]
    fn test_blank_mbid_is_none() {
        let artist = Artist::new("Björk", 1).with_mbid("  ");
        assert_eq!(artist.mbid, None);
        let artist = Artist::new("Björk", 1).with_mbid("87c5dedd");
        assert_eq!(artist.mbid.as_deref(), Some("87c5dedd"));
    }
}
