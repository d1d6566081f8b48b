//! Mood-weighted color blending.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Mood, SeededRng};

const HUE_JITTER: f64 = 8.0;
const SATURATION_JITTER: f64 = 4.0;
const LIGHTNESS_JITTER: f64 = 3.0;

const SATURATION_BOUNDS: (f64, f64) = (15.0, 85.0);
const LIGHTNESS_BOUNDS: (f64, f64) = (18.0, 62.0);

/// A color in HSL space. Hue in degrees, saturation and lightness in percent.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Hsl {
    pub h: f64,
    pub s: f64,
    pub l: f64,
}

impl Hsl {
    pub const fn new(h: f64, s: f64, l: f64) -> Self {
        Self { h, s, l }
    }

    /// CSS `hsl()` notation.
    pub fn to_css(&self) -> String {
        format!("hsl({:.0}, {:.0}%, {:.0}%)", self.h, self.s, self.l)
    }

    /// Convert to 8-bit sRGB.
    pub fn to_rgb(&self) -> [u8; 3] {
        let s = self.s / 100.0;
        let l = self.l / 100.0;
        let a = s * l.min(1.0 - l);
        let channel = |n: f64| {
            let k = (n + self.h / 30.0).rem_euclid(12.0);
            let v = l - a * (k - 3.0).min(9.0 - k).clamp(-1.0, 1.0);
            (v * 255.0).round().clamp(0.0, 255.0) as u8
        };
        [channel(0.0), channel(8.0), channel(4.0)]
    }

    pub fn to_hex(&self) -> String {
        let [r, g, b] = self.to_rgb();
        format!("#{r:02x}{g:02x}{b:02x}")
    }
}

impl fmt::Display for Hsl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_css())
    }
}

/// Blend a mood distribution into one color.
///
/// Hue is the weighted circular mean of each mood's hue midpoint, so a red
/// and a magenta average to crimson rather than green. Saturation and
/// lightness are weighted means. `confidence` in `[0, 1]` pulls saturation
/// toward `neutral_saturation`; at 1 there is no damping. `rng` supplies the
/// jitter and is always drawn exactly three times.
pub fn blend(
    weights: &BTreeMap<Mood, f64>,
    confidence: f64,
    neutral_saturation: f64,
    rng: &mut SeededRng,
) -> Hsl {
    let total: f64 = weights.values().filter(|w| **w > 0.0).sum();
    let neutral = Mood::Neutral.range();

    let (hue, saturation, lightness) = if total > 0.0 {
        let mut x = 0.0;
        let mut y = 0.0;
        let mut s = 0.0;
        let mut l = 0.0;
        for (mood, weight) in weights.iter().filter(|(_, w)| **w > 0.0) {
            let share = weight / total;
            let range = mood.range();
            let radians = range.hue_mid().to_radians();
            x += share * radians.cos();
            y += share * radians.sin();
            s += share * range.saturation_mid();
            l += share * range.lightness_mid();
        }
        let hue = if x.hypot(y) < 1e-6 {
            // Opposite hues cancel out; keep the heaviest one.
            heaviest(weights).map_or(neutral.hue_mid(), |m| m.range().hue_mid())
        } else {
            y.atan2(x).to_degrees()
        };
        (hue, s, l)
    } else {
        (
            neutral.hue_mid(),
            neutral.saturation_mid(),
            neutral.lightness_mid(),
        )
    };

    let hue = wrap_hue(hue + rng.jitter(HUE_JITTER));
    let saturation = saturation + rng.jitter(SATURATION_JITTER);
    let lightness = lightness + rng.jitter(LIGHTNESS_JITTER);

    let confidence = confidence.clamp(0.0, 1.0);
    let saturation = (saturation - neutral_saturation).mul_add(confidence, neutral_saturation);

    Hsl::new(
        hue,
        saturation.clamp(SATURATION_BOUNDS.0, SATURATION_BOUNDS.1),
        lightness.clamp(LIGHTNESS_BOUNDS.0, LIGHTNESS_BOUNDS.1),
    )
}

fn wrap_hue(hue: f64) -> f64 {
    let wrapped = hue.rem_euclid(360.0);
    // rem_euclid rounds tiny negatives up to exactly 360.
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}

fn heaviest(weights: &BTreeMap<Mood, f64>) -> Option<Mood> {
    weights
        .iter()
        .fold(None, |best: Option<(Mood, f64)>, (mood, weight)| match best {
            Some((_, w)) if w >= *weight => best,
            _ => Some((*mood, *weight)),
        })
        .map(|(mood, _)| mood)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn weights(pairs: &[(Mood, f64)]) -> BTreeMap<Mood, f64> {
        pairs.iter().copied().collect()
    }

    fn hue_distance(a: f64, b: f64) -> f64 {
        let d = (a - b).rem_euclid(360.0);
        d.min(360.0 - d)
    }

    #[test]
    fn test_single_mood_lands_near_its_range() {
        let color = blend(&weights(&[(Mood::Sad, 1.0)]), 1.0, 18.0, &mut SeededRng::new(7));
        assert!(hue_distance(color.h, 220.0) <= HUE_JITTER);
        assert!((color.l - 35.0).abs() <= LIGHTNESS_JITTER);
    }

    #[test]
    fn test_hue_wraps_around_red() {
        // Angry (0°) and romantic (340°) must average near 350°, not 170°.
        let color = blend(
            &weights(&[(Mood::Angry, 0.5), (Mood::Romantic, 0.5)]),
            1.0,
            18.0,
            &mut SeededRng::new(3),
        );
        assert!(hue_distance(color.h, 350.0) <= HUE_JITTER + 0.5, "{color}");
    }

    #[test]
    fn test_low_confidence_damps_saturation() {
        let w = weights(&[(Mood::Happy, 1.0)]);
        let early = blend(&w, 0.1, 18.0, &mut SeededRng::new(5));
        let late = blend(&w, 1.0, 18.0, &mut SeededRng::new(5));
        assert!(early.s < late.s);
        assert!((early.h - late.h).abs() < 1e-9);
    }

    #[test]
    fn test_empty_weights_give_neutral() {
        let color = blend(&BTreeMap::new(), 1.0, 18.0, &mut SeededRng::new(1));
        assert!(hue_distance(color.h, 210.0) <= HUE_JITTER);
        assert!(color.s <= SATURATION_BOUNDS.0 + SATURATION_JITTER);
    }

    #[test]
    fn test_hex_conversion() {
        assert_eq!(Hsl::new(0.0, 100.0, 50.0).to_hex(), "#ff0000");
        assert_eq!(Hsl::new(120.0, 100.0, 25.0).to_hex(), "#008000");
        assert_eq!(Hsl::new(0.0, 0.0, 100.0).to_hex(), "#ffffff");
        assert_eq!(Hsl::new(210.0, 50.0, 40.0).to_css(), "hsl(210, 50%, 40%)");
    }

    proptest! {
        #[test]
        fn prop_blend_is_deterministic_and_bounded(
            seed in any::<u32>(),
            happy in 0.0f64..10.0,
            dark in 0.0f64..10.0,
            confidence in 0.0f64..1.0,
        ) {
            let w = weights(&[(Mood::Happy, happy), (Mood::Dark, dark)]);
            let a = blend(&w, confidence, 18.0, &mut SeededRng::new(seed));
            let b = blend(&w, confidence, 18.0, &mut SeededRng::new(seed));
            prop_assert_eq!(a, b);
            prop_assert!((0.0..360.0).contains(&a.h));
            prop_assert!((SATURATION_BOUNDS.0..=SATURATION_BOUNDS.1).contains(&a.s));
            prop_assert!((LIGHTNESS_BOUNDS.0..=LIGHTNESS_BOUNDS.1).contains(&a.l));
        }
    }
}
