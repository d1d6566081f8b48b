//! Progressive personality refinement for one load.

#![allow(clippy::unwrap_used)] // Tests use unwrap for brevity

use std::collections::BTreeMap;

use aura_core::{artist_key, PersonalitySample};
use tracing::debug;

use crate::{
    blend, HeadlineRequest, Hsl, PersonalityProfile, SeededRng, COLOR_OFFSET, HEADLINE_OFFSET,
};

/// A color change the presenter should animate to.
#[derive(Debug, Clone, PartialEq)]
pub enum ColorUpdate {
    /// Intermediate color, damped by how much data has arrived.
    Progressive { color: Hsl, confidence: f64 },
    /// Conclusive color plus the headline request to send.
    Final {
        color: Hsl,
        profile: PersonalityProfile,
        request: HeadlineRequest,
    },
}

impl ColorUpdate {
    pub const fn color(&self) -> Hsl {
        match self {
            Self::Progressive { color, .. } | Self::Final { color, .. } => *color,
        }
    }
}

/// Collects personality samples as they resolve and decides when the
/// background color should move.
#[derive(Debug, Clone)]
pub struct PersonalityTracker {
    total: usize,
    seed: u32,
    every: usize,
    neutral_saturation: f64,
    samples: BTreeMap<String, PersonalitySample>,
    finalized: bool,
}

impl PersonalityTracker {
    /// `total` is the number of artists on the wall, `every` the progressive
    /// refresh cadence.
    pub fn new(total: usize, seed: u32, every: usize, neutral_saturation: f64) -> Self {
        Self {
            total,
            seed,
            every: every.max(1),
            neutral_saturation,
            samples: BTreeMap::new(),
            finalized: false,
        }
    }

    pub fn resolved(&self) -> usize {
        self.samples.len()
    }

    pub const fn total(&self) -> usize {
        self.total
    }

    pub const fn is_finalized(&self) -> bool {
        self.finalized
    }

    /// Fraction of artists whose personality data has resolved.
    pub fn confidence(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            self.resolved() as f64 / self.total as f64
        }
    }

    pub fn profile(&self) -> PersonalityProfile {
        PersonalityProfile::from_samples(self.samples.values())
    }

    /// Record one artist's sample.
    ///
    /// Returns an update every `every` artists, on the last artist, and
    /// whenever `tiles_settled` is set (metadata arriving after every tile is
    /// already revealed). Repeated samples for the same artist are ignored.
    pub fn record(
        &mut self,
        sample: PersonalitySample,
        tiles_settled: bool,
    ) -> Option<ColorUpdate> {
        if self.finalized {
            return None;
        }
        let key = artist_key(&sample.name);
        if self.samples.contains_key(&key) {
            return None;
        }
        self.samples.insert(key, sample);

        let resolved = self.resolved();
        if resolved >= self.total {
            return Some(self.finalize());
        }
        if resolved % self.every == 0 || tiles_settled {
            let confidence = self.confidence();
            let color = self.color_at(&self.profile(), confidence);
            debug!(resolved, total = self.total, %color, "Progressive color update");
            return Some(ColorUpdate::Progressive { color, confidence });
        }
        None
    }

    /// Compute the conclusive color and headline request. Safe to call early;
    /// the result then reflects only the samples seen so far, at full
    /// confidence.
    pub fn finalize(&mut self) -> ColorUpdate {
        self.finalized = true;
        let profile = self.profile();
        let color = self.color_at(&profile, 1.0);
        let headline_seed = SeededRng::stream(self.seed, HEADLINE_OFFSET).next_u32();
        let request = profile.headline_request(headline_seed);
        debug!(%color, dominant = ?profile.dominant_genre, "Final color");
        ColorUpdate::Final {
            color,
            profile,
            request,
        }
    }

    fn color_at(&self, profile: &PersonalityProfile, confidence: f64) -> Hsl {
        // A fresh color stream each time keeps the final color independent of
        // how many progressive updates happened before it.
        let mut rng = SeededRng::stream(self.seed, COLOR_OFFSET);
        blend(
            &profile.mood_weights,
            confidence,
            self.neutral_saturation,
            &mut rng,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(name: &str, mood: &str) -> PersonalitySample {
        PersonalitySample {
            name: name.to_string(),
            genre: None,
            style: None,
            mood: Some(mood.to_string()),
            playcount: 10,
        }
    }

    #[test]
    fn test_cadence_every_third_and_last() {
        let mut tracker = PersonalityTracker::new(7, 1, 3, 18.0);
        let updates: Vec<bool> = (0..7)
            .map(|i| tracker.record(sample(&format!("a{i}"), "happy"), false).is_some())
            .collect();
        assert_eq!(updates, vec![false, false, true, false, false, true, true]);
        assert!(tracker.is_finalized());
    }

    #[test]
    fn test_late_metadata_updates_immediately() {
        let mut tracker = PersonalityTracker::new(10, 1, 3, 18.0);
        assert!(tracker.record(sample("a", "sad"), true).is_some());
    }

    #[test]
    fn test_duplicates_and_post_final_samples_ignored() {
        let mut tracker = PersonalityTracker::new(2, 1, 3, 18.0);
        assert!(tracker.record(sample("Low", "sad"), false).is_none());
        assert!(tracker.record(sample("LOW", "happy"), true).is_none());
        assert!(matches!(
            tracker.record(sample("Can", "dreamy"), false),
            Some(ColorUpdate::Final { .. })
        ));
        assert!(tracker.record(sample("Fugazi", "angry"), true).is_none());
    }

    #[test]
    fn test_final_is_independent_of_arrival_order() {
        let samples = [sample("a", "happy"), sample("b", "dark"), sample("c", "calm")];
        let mut forward = PersonalityTracker::new(3, 42, 3, 18.0);
        let mut backward = PersonalityTracker::new(3, 42, 3, 18.0);
        let mut last_forward = None;
        let mut last_backward = None;
        for (i, s) in samples.iter().enumerate() {
            last_forward = forward.record(s.clone(), i == 1);
        }
        for s in samples.iter().rev() {
            last_backward = backward.record(s.clone(), false);
        }
        assert_eq!(last_forward.unwrap(), last_backward.unwrap());
    }

    #[test]
    fn test_progressive_is_damped() {
        let mut tracker = PersonalityTracker::new(9, 5, 3, 18.0);
        tracker.record(sample("a", "happy"), false);
        tracker.record(sample("b", "happy"), false);
        let update = tracker.record(sample("c", "happy"), false).unwrap();
        let ColorUpdate::Progressive { color, confidence } = update else {
            unreachable!("expected a progressive update");
        };
        assert!((confidence - 1.0 / 3.0).abs() < 1e-9);
        let full = tracker.finalize().color();
        assert!(color.s < full.s);
    }
}
