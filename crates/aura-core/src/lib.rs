//! # aura-core
//!
//! Core types, configuration, and error handling for the Aura artist wall.

pub mod config;
pub mod error;
pub mod types;

pub use config::{Config, Period};
pub use error::{Error, HttpError, Result};
pub use types::*;
