//! Play/stop view-model for a single streamed episode, with a terminal front end.
//!
//! The [`viewmodel`] module is the core: observable `is_playing`/`current_status`
//! state driven by user commands and by notifications from a [`player::MediaEngine`].

pub mod app;
pub mod config;
pub mod error;
pub mod events;
pub mod input;
pub mod logging;
pub mod player;
pub mod ui;
pub mod viewmodel;

pub use error::{EngineError, PlaybackError};
pub use events::EngineEvent;
pub use player::MediaEngine;
pub use viewmodel::{PlaybackViewModel, Snapshot, ViewModelHandle};
