//! Session state and the event loop that owns it.

pub mod session;

pub use session::{Session, SessionCommand};
