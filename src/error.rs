use symphonia::core::errors::Error as SymphoniaError;

/// Failures reported by a [`MediaEngine`](crate::player::MediaEngine).
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("Failed to download media: {0}")]
    Download(#[from] reqwest::Error),

    #[error("Media cache I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to decode media: {0}")]
    Decode(#[from] SymphoniaError),

    #[error("Audio output error: {0}")]
    Output(String),

    #[error("No playable audio track found")]
    NoAudioTrack,

    #[error("Start was superseded by a later request")]
    Superseded,

    #[error("Playback engine is not running")]
    NotRunning,

    #[error("Engine call did not complete: {0}")]
    Aborted(String),
}

/// Errors surfaced to whoever invoked a view-model command.
#[derive(Debug, thiserror::Error)]
pub enum PlaybackError {
    #[error("Playback failed for {url}: {source}")]
    PlaybackFailed {
        url: String,
        #[source]
        source: EngineError,
    },

    #[error("Failed to stop playback: {0}")]
    StopFailed(#[source] EngineError),

    #[error("View-model has been shut down")]
    Closed,
}

pub type Result<T> = std::result::Result<T, PlaybackError>;
