//! Canonical moods and their color ranges.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Hue, saturation and lightness bounds for one mood.
///
/// Hue is in degrees and may run past 360 so ranges can straddle red.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HslRange {
    pub hue: (f64, f64),
    pub saturation: (f64, f64),
    pub lightness: (f64, f64),
}

impl HslRange {
    const fn new(hue: (f64, f64), saturation: (f64, f64), lightness: (f64, f64)) -> Self {
        Self {
            hue,
            saturation,
            lightness,
        }
    }

    /// Hue midpoint, normalized to `[0, 360)`.
    pub fn hue_mid(&self) -> f64 {
        ((self.hue.0 + self.hue.1) / 2.0).rem_euclid(360.0)
    }

    pub fn saturation_mid(&self) -> f64 {
        (self.saturation.0 + self.saturation.1) / 2.0
    }

    pub fn lightness_mid(&self) -> f64 {
        (self.lightness.0 + self.lightness.1) / 2.0
    }
}

/// The fixed set of moods raw vocabulary is folded into.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    Happy,
    Sad,
    Energetic,
    Calm,
    Dark,
    Romantic,
    Angry,
    Dreamy,
    Nostalgic,
    Neutral,
}

impl Mood {
    pub const ALL: [Self; 10] = [
        Self::Happy,
        Self::Sad,
        Self::Energetic,
        Self::Calm,
        Self::Dark,
        Self::Romantic,
        Self::Angry,
        Self::Dreamy,
        Self::Nostalgic,
        Self::Neutral,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Happy => "happy",
            Self::Sad => "sad",
            Self::Energetic => "energetic",
            Self::Calm => "calm",
            Self::Dark => "dark",
            Self::Romantic => "romantic",
            Self::Angry => "angry",
            Self::Dreamy => "dreamy",
            Self::Nostalgic => "nostalgic",
            Self::Neutral => "neutral",
        }
    }

    pub const fn range(self) -> HslRange {
        match self {
            Self::Happy => HslRange::new((40.0, 60.0), (70.0, 90.0), (50.0, 60.0)),
            Self::Sad => HslRange::new((210.0, 230.0), (30.0, 50.0), (30.0, 40.0)),
            Self::Energetic => HslRange::new((0.0, 25.0), (75.0, 95.0), (45.0, 55.0)),
            Self::Calm => HslRange::new((160.0, 190.0), (30.0, 50.0), (45.0, 55.0)),
            Self::Dark => HslRange::new((260.0, 280.0), (30.0, 50.0), (15.0, 25.0)),
            Self::Romantic => HslRange::new((330.0, 350.0), (50.0, 70.0), (45.0, 55.0)),
            Self::Angry => HslRange::new((350.0, 370.0), (80.0, 100.0), (30.0, 40.0)),
            Self::Dreamy => HslRange::new((270.0, 300.0), (40.0, 60.0), (60.0, 70.0)),
            Self::Nostalgic => HslRange::new((25.0, 40.0), (40.0, 60.0), (45.0, 55.0)),
            Self::Neutral => HslRange::new((200.0, 220.0), (5.0, 15.0), (40.0, 50.0)),
        }
    }

    /// Fold a raw mood term into a canonical mood.
    pub fn normalize(raw: &str) -> Option<Self> {
        let term = raw.trim().to_lowercase();
        let mood = match term.as_str() {
            "happy" | "joyful" | "cheerful" | "uplifting" | "euphoric" | "playful" | "fun"
            | "quirky" | "funky" | "upbeat" | "bright" => Self::Happy,
            "sad" | "melancholy" | "melancholic" | "sorrowful" | "gloomy" | "lonely"
            | "bittersweet" | "somber" | "reflective" | "introspective" => Self::Sad,
            "energetic" | "rousing" | "excited" | "powerful" | "epic" | "driving" | "intense"
            | "party" | "exciting" => Self::Energetic,
            "calm" | "relaxed" | "mellow" | "peaceful" | "chill" | "laid back" | "laid-back"
            | "soothing" | "sophisticated" | "cool" | "spiritual" | "warm" => Self::Calm,
            "dark" | "brooding" | "ominous" | "haunting" | "gritty" | "menacing" | "eerie" => {
                Self::Dark
            }
            "romantic" | "sensual" | "sexy" | "tender" | "passionate" | "loving" => {
                Self::Romantic
            }
            "angry" | "aggressive" | "fiery" | "rebellious" | "hostile" | "raw" => Self::Angry,
            "dreamy" | "ethereal" | "hypnotic" | "atmospheric" | "trippy" | "psychedelic"
            | "spacey" => Self::Dreamy,
            "nostalgic" | "wistful" | "sentimental" | "yearning" => Self::Nostalgic,
            "neutral" | "ambivalent" => Self::Neutral,
            _ => return None,
        };
        Some(mood)
    }
}

impl fmt::Display for Mood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
