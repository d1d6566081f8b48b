//! Play-count weighted aggregation of personality samples.

#![allow(clippy::unwrap_used)] // Tests use unwrap for brevity

use std::collections::BTreeMap;

use aura_core::PersonalitySample;
use serde::Serialize;

use crate::{dominant_genre, GenreFamily, Mood};

/// Shown when the headline generator fails or is unreachable.
pub const FALLBACK_HEADLINE: &str = "Your music has a personality all its own";

/// Aggregated mood and genre weights for the artists seen so far.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PersonalityProfile {
    /// Normalized mood weights, summing to 1 when non-empty.
    pub mood_weights: BTreeMap<Mood, f64>,
    /// Normalized genre family weights, summing to 1 when non-empty.
    pub genre_weights: BTreeMap<GenreFamily, f64>,
    pub dominant_genre: Option<GenreFamily>,
}

impl PersonalityProfile {
    pub fn from_samples<'a>(samples: impl IntoIterator<Item = &'a PersonalitySample>) -> Self {
        let mut moods: BTreeMap<Mood, f64> = BTreeMap::new();
        let mut genres: BTreeMap<GenreFamily, f64> = BTreeMap::new();

        for sample in samples {
            // Zero-play artists still count once.
            let weight = sample.playcount.max(1) as f64;
            let family =
                GenreFamily::from_descriptors(sample.genre.as_deref(), sample.style.as_deref());
            let mood = sample
                .mood
                .as_deref()
                .and_then(Mood::normalize)
                .or_else(|| family.map(GenreFamily::default_mood));

            if let Some(mood) = mood {
                *moods.entry(mood).or_default() += weight;
            }
            if let Some(family) = family {
                *genres.entry(family).or_default() += weight;
            }
        }

        normalize(&mut moods);
        normalize(&mut genres);
        let dominant_genre = dominant_genre(&genres);

        Self {
            mood_weights: moods,
            genre_weights: genres,
            dominant_genre,
        }
    }

    /// Heaviest mood, first in declaration order on ties.
    pub fn dominant_mood(&self) -> Option<Mood> {
        self.mood_weights
            .iter()
            .fold(None, |best: Option<(Mood, f64)>, (mood, weight)| match best {
                Some((_, best_weight)) if best_weight >= *weight => best,
                _ => Some((*mood, *weight)),
            })
            .map(|(mood, _)| mood)
    }

    pub fn is_empty(&self) -> bool {
        self.mood_weights.is_empty() && self.genre_weights.is_empty()
    }

    /// Build the headline request. Only aggregate weights leave this crate;
    /// artist names never do.
    pub fn headline_request(&self, seed: u32) -> HeadlineRequest {
        HeadlineRequest {
            moods: self
                .mood_weights
                .iter()
                .map(|(m, w)| (m.as_str().to_string(), round3(*w)))
                .collect(),
            genres: self
                .genre_weights
                .iter()
                .map(|(g, w)| (g.as_str().to_string(), round3(*w)))
                .collect(),
            dominant_genre: self.dominant_genre.map(|g| g.as_str().to_string()),
            dominant_mood: self.dominant_mood().map(|m| m.as_str().to_string()),
            seed,
        }
    }
}

/// Payload sent to the headline generator.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HeadlineRequest {
    pub moods: BTreeMap<String, f64>,
    pub genres: BTreeMap<String, f64>,
    pub dominant_genre: Option<String>,
    pub dominant_mood: Option<String>,
    pub seed: u32,
}

fn normalize<K: Ord>(weights: &mut BTreeMap<K, f64>) {
    let total: f64 = weights.values().sum();
    if total > 0.0 {
        for weight in weights.values_mut() {
            *weight /= total;
        }
    }
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}
