//! Interaction-replay compositor.
//!
//! Replays a recorded cursor session (movement samples and clicks) onto a
//! pixel surface: an interpolated cursor sprite, an optional trail and
//! animated click effects, driven by a playback clock.

pub mod config;
pub mod error;
pub mod events;
pub mod rendering;

pub use config::ReplayConfig;
pub use error::{ReplayError, ReplayResult};
pub use events::{ClickEvent, ClickKind, EventLog, MoveSample};
