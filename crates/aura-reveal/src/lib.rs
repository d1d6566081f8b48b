//! # aura-reveal
//!
//! Pure view-state for the artist wall: which image each tile shows, when it
//! may fall back to a secondary provider, and when the displayed provider
//! rotates on its own. Nothing here touches the network or the clock except
//! through the instants callers pass in.

pub mod board;
pub mod rotation;

pub use board::{RecordOutcome, Tile, TileBoard, TileChange, TileState};
pub use rotation::{RotationController, RotationState};
