//! Output side of the session.

use aura_core::{Error, ImageProvider};
use aura_personality::ColorUpdate;
use aura_reveal::{Tile, TileChange, TileState};
use tracing::{debug, info};

/// Receives every visible change the session produces.
pub trait Presenter: Send {
    /// A new wall of tiles, all loading.
    fn wall(&mut self, username: &str, tiles: &[Tile]);

    fn tile(&mut self, change: &TileChange);

    /// The displayed provider changed; `automatic` is set for rotation.
    fn provider(&mut self, provider: ImageProvider, automatic: bool);

    fn color(&mut self, update: &ColorUpdate);

    fn headline(&mut self, text: &str);

    /// A failure the user should see.
    fn error(&mut self, error: &Error);
}

/// Prints the wall to stdout as it reveals.
#[derive(Debug, Default)]
pub struct TerminalPresenter;

impl TerminalPresenter {
    pub const fn new() -> Self {
        Self
    }

    fn describe(state: &TileState, light: bool) -> String {
        match state {
            TileState::Loading => "loading".to_string(),
            TileState::NoImage => "no image".to_string(),
            TileState::Revealed { provider, url } => {
                let backdrop = if light { " [dark backdrop]" } else { "" };
                format!("{} {url}{backdrop}", provider.label())
            }
        }
    }
}

impl Presenter for TerminalPresenter {
    fn wall(&mut self, username: &str, tiles: &[Tile]) {
        println!("\n{username}'s top {} artists", tiles.len());
        for (i, tile) in tiles.iter().enumerate() {
            println!("  {:>2}. {} ({} plays)", i + 1, tile.artist.name, tile.artist.playcount);
        }
    }

    fn tile(&mut self, change: &TileChange) {
        debug!(
            index = change.index,
            artist = %change.artist,
            state = ?change.state,
            "Tile changed"
        );
        if change.state.is_loading() {
            return;
        }
        println!(
            "  {:>2}. {:<28} {}",
            change.index + 1,
            change.artist,
            Self::describe(&change.state, change.light)
        );
    }

    fn provider(&mut self, provider: ImageProvider, automatic: bool) {
        let how = if automatic { "rotating to" } else { "showing" };
        println!("-- {how} {} --", provider.label());
    }

    fn color(&mut self, update: &ColorUpdate) {
        match update {
            ColorUpdate::Progressive { color, confidence } => {
                info!(%color, confidence, "Background color");
            }
            ColorUpdate::Final { color, profile, .. } => {
                let genre = profile
                    .dominant_genre
                    .map_or_else(|| "unknown".to_string(), |g| g.to_string());
                println!("Color: {} ({}), dominant genre: {genre}", color.to_hex(), color.to_css());
            }
        }
    }

    fn headline(&mut self, text: &str) {
        println!("\n  \"{text}\"\n");
    }

    fn error(&mut self, error: &Error) {
        eprintln!("aura: {error}");
    }
}
