use crossterm::event::KeyEvent;
use std::time::Duration;

/// Notifications pushed by a playback engine to its subscribers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineEvent {
    PositionChanged { position: Duration, duration: Duration },
    MediaItemFinished,
}

#[derive(Debug, Clone)]
pub enum AppEvent {
    // From input thread
    Input(KeyEvent),
    Resize(u16, u16),

    // From command tasks
    CommandFailed(String),
}
