use async_trait::async_trait;
use std::time::Duration;
use tokio::sync::broadcast;

use crate::error::EngineError;
use crate::events::EngineEvent;

/// The playback service a view-model delegates all audio handling to.
///
/// Implementations own fetching, buffering and decoding. Callers only ever see
/// start/stop requests, the current timeline and a stream of [`EngineEvent`]s.
#[async_trait]
pub trait MediaEngine: Send + Sync {
    /// Begin streaming `url`. Resolves once the engine has accepted the stream,
    /// which may be before audio is audible.
    async fn start(&self, url: &str) -> Result<(), EngineError>;

    async fn stop(&self) -> Result<(), EngineError>;

    fn current_position(&self) -> Duration;

    fn current_duration(&self) -> Duration;

    /// Both position and item-finished notifications arrive on this receiver.
    fn subscribe(&self) -> broadcast::Receiver<EngineEvent>;
}
