//! Core domain types for Aura.

pub mod artist;
pub mod image;
pub mod metadata;
pub mod provider;

pub use artist::{artist_key, Artist};
pub use image::{ImageCandidate, ImageCandidates};
pub use metadata::{MetadataResult, PersonalitySample};
pub use provider::{ImageProvider, ProviderPriority};
