//! Per-tile reveal state machine.
//!
//! A tile starts `Loading` and ends `Revealed` or `NoImage`. While the
//! primary provider is still working through the batch, a tile without a
//! primary image stays `Loading` even if another provider already has one;
//! once the primary is fully loaded, tiles fall back along the priority list.

use std::collections::HashMap;

use aura_core::{artist_key, Artist, ImageProvider, ProviderPriority};
use tracing::debug;

/// What a tile currently shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TileState {
    Loading,
    Revealed { provider: ImageProvider, url: String },
    NoImage,
}

impl TileState {
    pub const fn provider(&self) -> Option<ImageProvider> {
        match self {
            Self::Revealed { provider, .. } => Some(*provider),
            _ => None,
        }
    }

    pub const fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }
}

/// One artist tile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tile {
    pub artist: Artist,
    pub state: TileState,
    /// The visible image's overlay region is light.
    pub light: bool,
}

/// A visible change for the presenter to render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileChange {
    pub index: usize,
    pub artist: String,
    pub state: TileState,
    pub light: bool,
}

/// Result of recording one provider attempt.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordOutcome {
    pub changes: Vec<TileChange>,
    /// Set when this attempt completed the provider's pass over the batch.
    pub completed: Option<ImageProvider>,
}

/// View state for every tile of one load.
#[derive(Debug, Clone)]
pub struct TileBoard {
    tiles: Vec<Tile>,
    index: HashMap<String, usize>,
    /// Attempted `(tile, provider)` pairs; `None` means confirmed empty.
    results: HashMap<(usize, ImageProvider), Option<String>>,
    light: HashMap<(usize, ImageProvider), bool>,
    attempts: HashMap<ImageProvider, usize>,
    priority: ProviderPriority,
}

impl TileBoard {
    /// Build a board. Repeated artists (by case-insensitive name) keep their
    /// first position only.
    pub fn new(artists: &[Artist], priority: ProviderPriority) -> Self {
        let mut tiles = Vec::with_capacity(artists.len());
        let mut index = HashMap::new();
        for artist in artists {
            let key = artist.key();
            if index.contains_key(&key) {
                debug!(artist = %artist.name, "Skipping duplicate artist");
                continue;
            }
            index.insert(key, tiles.len());
            tiles.push(Tile {
                artist: artist.clone(),
                state: TileState::Loading,
                light: false,
            });
        }
        Self {
            tiles,
            index,
            results: HashMap::new(),
            light: HashMap::new(),
            attempts: HashMap::new(),
            priority,
        }
    }

    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub const fn priority(&self) -> &ProviderPriority {
        &self.priority
    }

    pub fn tile(&self, artist: &str) -> Option<&Tile> {
        self.index.get(&artist_key(artist)).map(|&i| &self.tiles[i])
    }

    /// Every artist has been attempted against `provider`.
    pub fn is_fully_loaded(&self, provider: ImageProvider) -> bool {
        self.attempts.get(&provider).copied().unwrap_or(0) >= self.tiles.len()
    }

    /// No tile is still loading.
    pub fn is_settled(&self) -> bool {
        self.tiles.iter().all(|t| !t.state.is_loading())
    }

    /// Record one provider's result for one artist.
    ///
    /// Only the first result per pair counts; later ones are ignored.
    pub fn record(
        &mut self,
        artist: &str,
        provider: ImageProvider,
        url: Option<String>,
    ) -> RecordOutcome {
        let Some(&i) = self.index.get(&artist_key(artist)) else {
            return RecordOutcome::default();
        };
        if self.results.contains_key(&(i, provider)) {
            return RecordOutcome::default();
        }
        self.results.insert((i, provider), url);

        let was_loaded = self.is_fully_loaded(provider);
        *self.attempts.entry(provider).or_default() += 1;

        if !was_loaded && self.is_fully_loaded(provider) {
            debug!(%provider, "Provider fully loaded");
            // Fallback may now be allowed on any tile.
            RecordOutcome {
                changes: self.reevaluate(),
                completed: Some(provider),
            }
        } else {
            RecordOutcome {
                changes: self.refresh(i).into_iter().collect(),
                completed: None,
            }
        }
    }

    /// Record the overlay classification for a tile's image.
    pub fn set_light(
        &mut self,
        artist: &str,
        provider: ImageProvider,
        light: bool,
    ) -> Option<TileChange> {
        let &i = self.index.get(&artist_key(artist))?;
        self.light.insert((i, provider), light);
        self.refresh(i)
    }

    /// Replace the provider priority and re-evaluate every tile.
    pub fn set_priority(&mut self, priority: ProviderPriority) -> Vec<TileChange> {
        self.priority = priority;
        self.reevaluate()
    }

    /// Make `provider` primary, keeping the rest of the order.
    pub fn promote(&mut self, provider: ImageProvider) -> Vec<TileChange> {
        let mut priority = self.priority.clone();
        priority.promote(provider);
        self.set_priority(priority)
    }

    /// Re-derive every tile's state, returning the tiles that changed.
    pub fn reevaluate(&mut self) -> Vec<TileChange> {
        (0..self.tiles.len()).filter_map(|i| self.refresh(i)).collect()
    }

    fn refresh(&mut self, i: usize) -> Option<TileChange> {
        let state = self.derive(i);
        let light = state
            .provider()
            .filter(|p| p.supports_pixel_sampling())
            .and_then(|p| self.light.get(&(i, p)).copied())
            .unwrap_or(false);

        let tile = &mut self.tiles[i];
        if tile.state == state && tile.light == light {
            return None;
        }
        tile.state = state.clone();
        tile.light = light;
        Some(TileChange {
            index: i,
            artist: tile.artist.name.clone(),
            state,
            light,
        })
    }

    fn image(&self, i: usize, provider: ImageProvider) -> Option<&String> {
        self.results.get(&(i, provider)).and_then(Option::as_ref)
    }

    fn derive(&self, i: usize) -> TileState {
        let primary = self.priority.primary();
        if let Some(url) = self.image(i, primary) {
            return TileState::Revealed {
                provider: primary,
                url: url.clone(),
            };
        }
        if !self.is_fully_loaded(primary) {
            return TileState::Loading;
        }

        // Priority order first, then any provider the list leaves out.
        let fallbacks = self.priority.iter().chain(
            ImageProvider::ALL
                .into_iter()
                .filter(|p| !self.priority.contains(*p)),
        );
        let mut pending = false;
        for provider in fallbacks {
            match self.results.get(&(i, provider)) {
                Some(Some(url)) => {
                    return TileState::Revealed {
                        provider,
                        url: url.clone(),
                    }
                }
                Some(None) => {}
                None => pending = true,
            }
        }
        if pending {
            TileState::Loading
        } else {
            TileState::NoImage
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use ImageProvider::{Discogs, Itunes, TheAudioDb};

    fn artists(names: &[&str]) -> Vec<Artist> {
        names.iter().map(|n| Artist::new(*n, 10)).collect()
    }

    fn priority(order: &[ImageProvider]) -> ProviderPriority {
        ProviderPriority::new(order.to_vec()).unwrap()
    }

    fn url(s: &str) -> Option<String> {
        Some(s.to_string())
    }

    #[test]
    fn test_primary_image_reveals_immediately() {
        let mut board = TileBoard::new(
            &artists(&["A", "B"]),
            priority(&[Itunes, Discogs, TheAudioDb]),
        );
        let outcome = board.record("A", Itunes, url("a.jpg"));
        assert_eq!(outcome.changes.len(), 1);
        assert_eq!(
            outcome.changes[0].state,
            TileState::Revealed {
                provider: Itunes,
                url: "a.jpg".into()
            }
        );
        assert!(outcome.completed.is_none());
    }

    #[test]
    fn test_secondary_waits_for_primary_to_finish() {
        let mut board = TileBoard::new(
            &artists(&["A", "B"]),
            priority(&[Itunes, Discogs, TheAudioDb]),
        );
        assert!(board.record("A", Discogs, url("d.jpg")).changes.is_empty());
        assert!(board.record("A", Itunes, None).changes.is_empty());
        assert!(board.tile("A").unwrap().state.is_loading());

        // B finishing the iTunes pass unlocks fallback for A.
        let outcome = board.record("B", Itunes, url("b.jpg"));
        assert_eq!(outcome.completed, Some(Itunes));
        assert_eq!(board.tile("A").unwrap().state.provider(), Some(Discogs));
        assert_eq!(board.tile("B").unwrap().state.provider(), Some(Itunes));
    }

    #[test]
    fn test_fallback_to_discogs_when_itunes_has_none() {
        let mut board = TileBoard::new(&artists(&["X"]), priority(&[Itunes, Discogs, TheAudioDb]));
        board.record("X", Itunes, None);
        assert!(board.tile("X").unwrap().state.is_loading());
        let outcome = board.record("X", Discogs, url("x.jpg"));
        assert_eq!(outcome.completed, Some(Discogs));
        assert_eq!(
            board.tile("X").unwrap().state,
            TileState::Revealed {
                provider: Discogs,
                url: "x.jpg".into()
            }
        );
    }

    #[test]
    fn test_no_image_once_every_provider_is_empty() {
        let mut board = TileBoard::new(&artists(&["X"]), priority(&[Itunes, Discogs, TheAudioDb]));
        board.record("X", Itunes, None);
        board.record("X", Discogs, None);
        assert!(board.tile("X").unwrap().state.is_loading());
        board.record("X", TheAudioDb, None);
        assert_eq!(board.tile("X").unwrap().state, TileState::NoImage);
        assert!(board.is_settled());
    }

    #[test]
    fn test_switch_to_unfinished_provider_reverts_to_loading() {
        let mut board = TileBoard::new(
            &artists(&["A", "B"]),
            priority(&[Itunes, Discogs, TheAudioDb]),
        );
        board.record("A", Itunes, url("a-it.jpg"));
        board.record("B", Itunes, url("b-it.jpg"));
        board.record("A", Discogs, url("a-dc.jpg"));

        let changes = board.promote(Discogs);
        // A has a Discogs image; B must wait for Discogs instead of showing iTunes.
        assert_eq!(changes.len(), 2);
        assert_eq!(board.tile("A").unwrap().state.provider(), Some(Discogs));
        assert!(board.tile("B").unwrap().state.is_loading());

        // Switching back is instant and never passes through Loading.
        let changes = board.promote(Itunes);
        assert!(changes.iter().all(|c| !c.state.is_loading()));
        assert_eq!(board.tile("B").unwrap().state.provider(), Some(Itunes));
    }

    #[test]
    fn test_primary_image_never_regresses() {
        let mut board = TileBoard::new(
            &artists(&["A", "B"]),
            priority(&[TheAudioDb, Discogs, Itunes]),
        );
        board.record("A", TheAudioDb, url("a.jpg"));
        for provider in [Discogs, Itunes] {
            board.record("A", provider, None);
            board.record("B", provider, url("b.jpg"));
        }
        assert_eq!(board.tile("A").unwrap().state.provider(), Some(TheAudioDb));
    }

    #[test]
    fn test_confirmed_empty_is_never_shown() {
        let mut board = TileBoard::new(&artists(&["A"]), priority(&[Itunes, Discogs, TheAudioDb]));
        board.record("A", Itunes, None);
        board.record("A", Itunes, url("late.jpg"));
        board.record("A", TheAudioDb, url("adb.jpg"));
        assert_eq!(board.tile("A").unwrap().state.provider(), Some(TheAudioDb));
    }

    #[test]
    fn test_light_only_for_sampled_provider_on_display() {
        let mut board = TileBoard::new(&artists(&["A"]), priority(&[Itunes, Discogs]));
        board.record("A", Itunes, url("a.jpg"));
        let change = board.set_light("A", Itunes, true).unwrap();
        assert!(change.light);

        board.record("A", Discogs, url("d.jpg"));
        board.set_light("A", Discogs, true);
        board.promote(Discogs);
        assert!(!board.tile("A").unwrap().light);
    }

    #[test]
    fn test_duplicate_artists_share_a_tile() {
        let board = TileBoard::new(&artists(&["Low", "LOW", "Can"]), ProviderPriority::default());
        assert_eq!(board.len(), 2);
    }

    #[test]
    fn test_unknown_artist_is_ignored() {
        let mut board = TileBoard::new(&artists(&["A"]), ProviderPriority::default());
        assert_eq!(board.record("Z", Itunes, url("z.jpg")), RecordOutcome::default());
    }
}
