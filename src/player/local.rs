use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, mpsc};
use std::thread::JoinHandle;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{broadcast, oneshot};
use tracing::debug;

use crate::error::EngineError;
use crate::events::EngineEvent;
use crate::player::commands::{PlayerCommand, Timeline};
use crate::player::engine::MediaEngine;
use crate::player::fetch::MediaFetcher;
use crate::player::thread;

const EVENT_CAPACITY: usize = 64;

/// Engine backed by a local player thread: fetch into the cache, then decode
/// and play from disk.
pub struct LocalEngine {
    commands: mpsc::Sender<PlayerCommand>,
    events: broadcast::Sender<EngineEvent>,
    timeline: Arc<Mutex<Timeline>>,
    fetcher: MediaFetcher,
    /// Bumped by every start and stop; a start only proceeds while it still
    /// holds the latest value.
    epoch: Arc<AtomicU64>,
    _player: JoinHandle<()>,
}

impl LocalEngine {
    pub fn spawn(cache_dir: impl Into<PathBuf>) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let timeline = Arc::new(Mutex::new(Timeline::default()));
        let epoch = Arc::new(AtomicU64::new(0));

        let player = thread::spawn(cmd_rx, events.clone(), timeline.clone(), epoch.clone());
        let fetcher = MediaFetcher::new(cache_dir);
        debug!(cache_dir = %fetcher.cache_dir().display(), "Local engine started");

        Self {
            commands: cmd_tx,
            events,
            timeline,
            fetcher,
            epoch,
            _player: player,
        }
    }

    fn timeline(&self) -> Timeline {
        self.timeline.lock().map(|t| *t).unwrap_or_default()
    }
}

#[async_trait]
impl MediaEngine for LocalEngine {
    async fn start(&self, url: &str) -> Result<(), EngineError> {
        let epoch = self.epoch.fetch_add(1, Ordering::SeqCst) + 1;

        let fetched = self.fetcher.fetch(url).await;
        if self.epoch.load(Ordering::SeqCst) != epoch {
            debug!(url, "Start superseded while fetching");
            return Err(EngineError::Superseded);
        }
        let path = fetched?;

        let (reply, ack) = oneshot::channel();
        self.commands
            .send(PlayerCommand::Load { path, epoch, reply })
            .map_err(|_| EngineError::NotRunning)?;

        ack.await.map_err(|_| EngineError::NotRunning)?
    }

    async fn stop(&self) -> Result<(), EngineError> {
        self.epoch.fetch_add(1, Ordering::SeqCst);

        let (reply, ack) = oneshot::channel();
        self.commands
            .send(PlayerCommand::Stop { reply })
            .map_err(|_| EngineError::NotRunning)?;

        ack.await.map_err(|_| EngineError::NotRunning)
    }

    fn current_position(&self) -> Duration {
        self.timeline().position
    }

    fn current_duration(&self) -> Duration {
        self.timeline().duration
    }

    fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.events.subscribe()
    }
}
