//! Deterministic hash-seeded random numbers.

use aura_core::Artist;

/// Offset added to the session seed for the color stream.
pub const COLOR_OFFSET: u32 = 1;
/// Offset added to the session seed for the headline stream.
pub const HEADLINE_OFFSET: u32 = 2;

/// Hash a string into a 32-bit seed (djb2, xor variant).
pub fn seed_from_str(input: &str) -> u32 {
    input
        .bytes()
        .fold(5381u32, |hash, b| hash.wrapping_mul(33) ^ u32::from(b))
}

/// Seed for one user and listening snapshot.
///
/// Artist order does not matter: pairs are lower-cased and sorted before
/// hashing.
pub fn session_seed(username: &str, artists: &[Artist]) -> u32 {
    let mut pairs: Vec<String> = artists
        .iter()
        .map(|a| format!("{}:{}", a.name.trim().to_lowercase(), a.playcount))
        .collect();
    pairs.sort_unstable();
    seed_from_str(&format!(
        "{}:{}",
        username.trim().to_lowercase(),
        pairs.join("|")
    ))
}

/// Small mulberry32 generator.
#[derive(Debug, Clone)]
pub struct SeededRng {
    state: u32,
}

impl SeededRng {
    pub const fn new(seed: u32) -> Self {
        Self { state: seed }
    }

    /// Generator for one of the session streams.
    pub const fn stream(seed: u32, offset: u32) -> Self {
        Self::new(seed.wrapping_add(offset))
    }

    pub fn next_u32(&mut self) -> u32 {
        self.state = self.state.wrapping_add(0x6D2B_79F5);
        let mut t = self.state;
        t = (t ^ (t >> 15)).wrapping_mul(t | 1);
        t ^= t.wrapping_add((t ^ (t >> 7)).wrapping_mul(t | 61));
        t ^ (t >> 14)
    }

    /// Next value in `[0, 1)`.
    pub fn next_f64(&mut self) -> f64 {
        f64::from(self.next_u32()) / 4_294_967_296.0
    }

    /// Next value in `[-band, band)`.
    pub fn jitter(&mut self, band: f64) -> f64 {
        self.next_f64().mul_add(2.0 * band, -band)
    }
}
