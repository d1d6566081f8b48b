//! Image candidates returned by providers that expose several images.

#![allow(clippy::unwrap_used)] // Tests use unwrap for brevity

use serde::{Deserialize, Serialize};

/// A candidate image with URL and dimensions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ImageCandidate {
    pub url: String,
    pub width: u32,
    pub height: u32,
    /// Marked by the provider as the canonical image.
    pub primary: bool,
}

impl ImageCandidate {
    pub fn new(url: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            url: url.into(),
            width,
            height,
            primary: false,
        }
    }

    pub const fn as_primary(mut self) -> Self {
        self.primary = true;
        self
    }

    /// Both sides reach the size floor.
    pub const fn meets(&self, floor: u32) -> bool {
        self.width >= floor && self.height >= floor
    }

    const fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }
}

/// Collection of candidate images for one artist.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ImageCandidates(pub Vec<ImageCandidate>);

impl ImageCandidates {
    pub const fn new(candidates: Vec<ImageCandidate>) -> Self {
        Self(candidates)
    }

    /// Pick the image to display given a minimum side length.
    ///
    /// A primary image meeting the floor wins, then the largest image meeting
    /// the floor, then any image with a usable URL.
    pub fn select(&self, floor: u32) -> Option<&ImageCandidate> {
        let usable = || self.0.iter().filter(|c| !c.url.trim().is_empty());

        usable()
            .find(|c| c.primary && c.meets(floor))
            .or_else(|| usable().filter(|c| c.meets(floor)).max_by_key(|c| c.area()))
            .or_else(|| usable().next())
    }

    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
