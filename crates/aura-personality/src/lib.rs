//! Mood/genre personality for Aura.
//!
//! Turns the per-artist mood, genre and style descriptors gathered by the
//! image pipeline into a weighted profile, a blended background color and a
//! request for the headline generator. Everything here is pure and seeded:
//! the same user and listening snapshot always produce the same color.

pub mod blend;
pub mod genre;
pub mod mood;
pub mod prng;
pub mod profile;
pub mod tracker;

pub use blend::{blend, Hsl};
pub use genre::{dominant_genre, GenreFamily};
pub use mood::{HslRange, Mood};
pub use prng::{session_seed, SeededRng, COLOR_OFFSET, HEADLINE_OFFSET};
pub use profile::{HeadlineRequest, PersonalityProfile, FALLBACK_HEADLINE};
pub use tracker::{ColorUpdate, PersonalityTracker};
