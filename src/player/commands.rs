use std::path::PathBuf;
use std::time::Duration;

use tokio::sync::oneshot;

use crate::error::EngineError;

#[derive(Debug)]
pub enum PlayerCommand {
    /// Replace whatever is playing with the file at `path`. `epoch` is the
    /// engine request counter at the time the start was issued.
    Load {
        path: PathBuf,
        epoch: u64,
        reply: oneshot::Sender<Result<(), EngineError>>,
    },
    Stop {
        reply: oneshot::Sender<()>,
    },
}

/// Position and duration of whatever the player thread is currently playing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Timeline {
    pub position: Duration,
    pub duration: Duration,
}
