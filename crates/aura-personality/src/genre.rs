//! Genre families and the dominant-genre rule.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::Mood;

/// The fixed set of genre families raw genre and style terms fold into.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum GenreFamily {
    Rock,
    Pop,
    Electronic,
    HipHop,
    Jazz,
    Classical,
    Metal,
    Folk,
    Rnb,
    Country,
    Latin,
    World,
    Punk,
    Indie,
    /// Mixed listening with no clear leader. Never produced by
    /// normalization.
    Eclectic,
}

/// Substring needles, checked in order. More specific families come first so
/// "synth-pop" is electronic and "hardcore punk" is punk. Needles of three
/// letters or fewer only match whole words.
const NEEDLES: &[(&str, GenreFamily)] = &[
    ("hip hop", GenreFamily::HipHop),
    ("hip-hop", GenreFamily::HipHop),
    ("hiphop", GenreFamily::HipHop),
    ("rap", GenreFamily::HipHop),
    ("trap", GenreFamily::HipHop),
    ("grime", GenreFamily::HipHop),
    ("punk", GenreFamily::Punk),
    ("emo", GenreFamily::Punk),
    ("metal", GenreFamily::Metal),
    ("hardcore", GenreFamily::Metal),
    ("r&b", GenreFamily::Rnb),
    ("rnb", GenreFamily::Rnb),
    ("soul", GenreFamily::Rnb),
    ("funk", GenreFamily::Rnb),
    ("indie", GenreFamily::Indie),
    ("shoegaze", GenreFamily::Indie),
    ("lo-fi", GenreFamily::Indie),
    ("britpop", GenreFamily::Indie),
    ("dancehall", GenreFamily::World),
    ("electro", GenreFamily::Electronic),
    ("techno", GenreFamily::Electronic),
    ("house", GenreFamily::Electronic),
    ("trance", GenreFamily::Electronic),
    ("edm", GenreFamily::Electronic),
    ("dance", GenreFamily::Electronic),
    ("dubstep", GenreFamily::Electronic),
    ("drum and bass", GenreFamily::Electronic),
    ("ambient", GenreFamily::Electronic),
    ("synth", GenreFamily::Electronic),
    ("trip hop", GenreFamily::Electronic),
    ("jazz", GenreFamily::Jazz),
    ("blues", GenreFamily::Jazz),
    ("swing", GenreFamily::Jazz),
    ("bebop", GenreFamily::Jazz),
    ("classical", GenreFamily::Classical),
    ("orchestral", GenreFamily::Classical),
    ("baroque", GenreFamily::Classical),
    ("opera", GenreFamily::Classical),
    ("soundtrack", GenreFamily::Classical),
    ("country", GenreFamily::Country),
    ("bluegrass", GenreFamily::Country),
    ("americana", GenreFamily::Country),
    ("folk", GenreFamily::Folk),
    ("acoustic", GenreFamily::Folk),
    ("singer-songwriter", GenreFamily::Folk),
    ("latin", GenreFamily::Latin),
    ("reggaeton", GenreFamily::Latin),
    ("salsa", GenreFamily::Latin),
    ("bossa", GenreFamily::Latin),
    ("samba", GenreFamily::Latin),
    ("reggae", GenreFamily::World),
    ("afro", GenreFamily::World),
    ("world", GenreFamily::World),
    ("celtic", GenreFamily::World),
    ("rock", GenreFamily::Rock),
    ("grunge", GenreFamily::Rock),
    ("alternative", GenreFamily::Rock),
    ("pop", GenreFamily::Pop),
    ("disco", GenreFamily::Pop),
];

impl GenreFamily {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Rock => "rock",
            Self::Pop => "pop",
            Self::Electronic => "electronic",
            Self::HipHop => "hiphop",
            Self::Jazz => "jazz",
            Self::Classical => "classical",
            Self::Metal => "metal",
            Self::Folk => "folk",
            Self::Rnb => "rnb",
            Self::Country => "country",
            Self::Latin => "latin",
            Self::World => "world",
            Self::Punk => "punk",
            Self::Indie => "indie",
            Self::Eclectic => "eclectic",
        }
    }

    /// Fold a raw genre or style term into a family.
    pub fn normalize(raw: &str) -> Option<Self> {
        let term = raw.trim().to_lowercase();
        if term.is_empty() {
            return None;
        }
        NEEDLES
            .iter()
            .find(|(needle, _)| contains_needle(&term, needle))
            .map(|(_, family)| *family)
    }

    /// Resolve a family from a genre, falling back to a style.
    pub fn from_descriptors(genre: Option<&str>, style: Option<&str>) -> Option<Self> {
        genre
            .and_then(Self::normalize)
            .or_else(|| style.and_then(Self::normalize))
    }

    /// Mood assumed for an artist that has a genre but no mood.
    pub const fn default_mood(self) -> Mood {
        match self {
            Self::Rock | Self::HipHop => Mood::Energetic,
            Self::Pop | Self::Latin => Mood::Happy,
            Self::Electronic | Self::Indie => Mood::Dreamy,
            Self::Jazz | Self::Classical | Self::World => Mood::Calm,
            Self::Metal | Self::Punk => Mood::Angry,
            Self::Folk | Self::Country => Mood::Nostalgic,
            Self::Rnb => Mood::Romantic,
            Self::Eclectic => Mood::Neutral,
        }
    }
}

fn contains_needle(term: &str, needle: &str) -> bool {
    if needle.len() > 3 {
        return term.contains(needle);
    }
    let is_word = |c: char| c.is_alphanumeric();
    term.match_indices(needle).any(|(start, _)| {
        let end = start + needle.len();
        !term[..start].chars().next_back().is_some_and(is_word)
            && !term[end..].chars().next().is_some_and(is_word)
    })
}

impl fmt::Display for GenreFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pick the dominant family from accumulated weights.
///
/// The heaviest family wins unless three or more families are present and
/// the leader holds less than half of the total weight, in which case the
/// profile is eclectic.
pub fn dominant_genre(weights: &BTreeMap<GenreFamily, f64>) -> Option<GenreFamily> {
    let present: Vec<(GenreFamily, f64)> = weights
        .iter()
        .filter(|(_, w)| **w > 0.0)
        .map(|(f, w)| (*f, *w))
        .collect();
    let total: f64 = present.iter().map(|(_, w)| w).sum();

    let (leader, weight) = present
        .iter()
        .copied()
        .fold(None, |best: Option<(GenreFamily, f64)>, (family, weight)| match best {
            Some((_, best_weight)) if best_weight >= weight => best,
            _ => Some((family, weight)),
        })?;

    if present.len() >= 3 && weight / total < 0.5 {
        Some(GenreFamily::Eclectic)
    } else {
        Some(leader)
    }
}
