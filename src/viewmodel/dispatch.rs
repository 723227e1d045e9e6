use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::task::{Id, JoinError, JoinSet};
use tracing::{debug, info, warn};

use crate::error::{EngineError, PlaybackError, Result};
use crate::events::EngineEvent;
use crate::player::MediaEngine;
use crate::viewmodel::state::{PlaybackViewModel, Snapshot};

enum Message {
    Play(oneshot::Sender<Result<()>>),
    Stop(oneshot::Sender<Result<()>>),
    Snapshot(oneshot::Sender<Snapshot>),
    Shutdown(oneshot::Sender<()>),
}

type EngineResult = std::result::Result<(), EngineError>;

/// Caller waiting on an engine call in the dispatcher's `JoinSet`, keyed by
/// task id so it is answered even when the task panics.
enum PendingCall {
    Start {
        request: u64,
        reply: oneshot::Sender<Result<()>>,
    },
    Stop {
        reply: oneshot::Sender<Result<()>>,
    },
}

/// Engine notification subscription, released when dropped.
struct EngineSubscription {
    rx: broadcast::Receiver<EngineEvent>,
}

impl EngineSubscription {
    fn acquire(engine: &dyn MediaEngine) -> Self {
        debug!("Subscribed to engine notifications");
        Self {
            rx: engine.subscribe(),
        }
    }

    /// `None` once the engine has dropped its sender.
    async fn next(&mut self) -> Option<EngineEvent> {
        loop {
            match self.rx.recv().await {
                Ok(event) => return Some(event),
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Engine notifications lagged");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }
}

impl Drop for EngineSubscription {
    fn drop(&mut self) {
        debug!("Released engine notification subscription");
    }
}

/// Cloneable front end of a running view-model.
///
/// All state lives in a single dispatcher task. Commands, engine notifications
/// and engine call completions are applied there one at a time, notifications
/// first when several are ready. The task ends on [`shutdown`](Self::shutdown)
/// or once every handle is dropped; either way the engine subscription is
/// released.
#[derive(Clone)]
pub struct ViewModelHandle {
    tx: mpsc::UnboundedSender<Message>,
    is_playing: watch::Receiver<bool>,
    current_status: watch::Receiver<String>,
    media_url: Arc<str>,
}

/// Build a view-model for `media_url` and start its dispatcher.
///
/// Must be called from within a tokio runtime. The engine subscription is
/// taken before this returns, so no notification sent afterwards is missed.
pub fn spawn(engine: Arc<dyn MediaEngine>, media_url: impl Into<String>) -> ViewModelHandle {
    let view_model = PlaybackViewModel::new(media_url);
    let subscription = EngineSubscription::acquire(engine.as_ref());
    let (tx, rx) = mpsc::unbounded_channel();

    let handle = ViewModelHandle {
        tx,
        is_playing: view_model.subscribe_is_playing(),
        current_status: view_model.subscribe_current_status(),
        media_url: Arc::from(view_model.media_url()),
    };

    let dispatcher = Dispatcher {
        view_model,
        engine,
        subscription: Some(subscription),
        pending: JoinSet::new(),
        calls: HashMap::new(),
    };
    tokio::spawn(dispatcher.run(rx));

    handle
}

impl ViewModelHandle {
    pub async fn play(&self) -> Result<()> {
        self.request(Message::Play).await?
    }

    pub async fn stop(&self) -> Result<()> {
        self.request(Message::Stop).await?
    }

    /// Both fields as seen by the dispatcher after everything queued ahead of
    /// this call has been applied.
    pub async fn snapshot(&self) -> Result<Snapshot> {
        self.request(Message::Snapshot).await
    }

    /// Stop the dispatcher and release the engine subscription. Later commands
    /// fail with [`PlaybackError::Closed`].
    pub async fn shutdown(&self) -> Result<()> {
        self.request(Message::Shutdown).await
    }

    pub fn is_playing(&self) -> bool {
        *self.is_playing.borrow()
    }

    pub fn current_status(&self) -> String {
        self.current_status.borrow().clone()
    }

    pub fn subscribe_is_playing(&self) -> watch::Receiver<bool> {
        self.is_playing.clone()
    }

    pub fn subscribe_current_status(&self) -> watch::Receiver<String> {
        self.current_status.clone()
    }

    pub fn media_url(&self) -> &str {
        &self.media_url
    }

    async fn request<T>(&self, message: impl FnOnce(oneshot::Sender<T>) -> Message) -> Result<T> {
        let (reply, response) = oneshot::channel();
        self.tx
            .send(message(reply))
            .map_err(|_| PlaybackError::Closed)?;
        response.await.map_err(|_| PlaybackError::Closed)
    }
}

struct Dispatcher {
    view_model: PlaybackViewModel,
    engine: Arc<dyn MediaEngine>,
    subscription: Option<EngineSubscription>,
    pending: JoinSet<EngineResult>,
    calls: HashMap<Id, PendingCall>,
}

impl Dispatcher {
    async fn run(mut self, mut rx: mpsc::UnboundedReceiver<Message>) {
        info!(url = self.view_model.media_url(), "View-model started");

        loop {
            tokio::select! {
                biased;

                event = next_event(&mut self.subscription) => self.on_engine_event(event),

                Some(done) = self.pending.join_next_with_id(), if !self.pending.is_empty() => {
                    self.on_completion(done)
                }

                message = rx.recv() => match message {
                    Some(Message::Shutdown(reply)) => {
                        self.teardown();
                        let _ = reply.send(());
                        return;
                    }
                    Some(message) => self.on_message(message),
                    None => break,
                },
            }
        }

        self.teardown();
    }

    fn on_message(&mut self, message: Message) {
        match message {
            Message::Play(reply) => {
                let request = self.view_model.begin_play();
                let url = self.view_model.media_url().to_string();
                info!(request, url = %url, "Play requested");

                let engine = self.engine.clone();
                let task = self.pending.spawn(async move { engine.start(&url).await });
                self.calls.insert(task.id(), PendingCall::Start { request, reply });
            }
            Message::Stop(reply) => {
                self.view_model.begin_stop();
                info!("Stop requested");

                let engine = self.engine.clone();
                let task = self.pending.spawn(async move { engine.stop().await });
                self.calls.insert(task.id(), PendingCall::Stop { reply });
            }
            Message::Snapshot(reply) => {
                let _ = reply.send(self.view_model.snapshot());
            }
            Message::Shutdown(reply) => {
                // Handled by the run loop; answer anyway.
                let _ = reply.send(());
            }
        }
    }

    fn on_engine_event(&mut self, event: Option<EngineEvent>) {
        match event {
            Some(EngineEvent::PositionChanged { position, duration }) => {
                self.view_model.on_position_changed(position, duration);
            }
            Some(EngineEvent::MediaItemFinished) => {
                info!("Media item finished");
                self.view_model.on_item_finished();
            }
            None => {
                warn!("Engine closed its notification stream");
                self.subscription = None;
            }
        }
    }

    fn on_completion(&mut self, done: std::result::Result<(Id, EngineResult), JoinError>) {
        let (id, result) = match done {
            Ok(finished) => finished,
            Err(e) => {
                warn!(error = %e, "Engine call task failed");
                (e.id(), Err(EngineError::Aborted(e.to_string())))
            }
        };
        let Some(call) = self.calls.remove(&id) else {
            return;
        };

        match (call, result) {
            (PendingCall::Start { request, reply }, Ok(())) => {
                debug!(request, "Engine accepted stream");
                let _ = reply.send(Ok(()));
            }
            (PendingCall::Start { request, reply }, Err(source)) => {
                if self.view_model.on_play_failed(request) {
                    warn!(request, error = %source, "Playback failed to start");
                    let _ = reply.send(Err(PlaybackError::PlaybackFailed {
                        url: self.view_model.media_url().to_string(),
                        source,
                    }));
                } else {
                    debug!(request, error = %source, "Superseded start ended");
                    let _ = reply.send(Ok(()));
                }
            }
            (PendingCall::Stop { reply }, Ok(())) => {
                let _ = reply.send(Ok(()));
            }
            (PendingCall::Stop { reply }, Err(source)) => {
                warn!(error = %source, "Engine failed to stop");
                let _ = reply.send(Err(PlaybackError::StopFailed(source)));
            }
        }
    }

    fn teardown(&mut self) {
        self.subscription = None;
        self.pending.abort_all();
        self.calls.clear();
        info!("View-model shut down");
    }
}

async fn next_event(subscription: &mut Option<EngineSubscription>) -> Option<EngineEvent> {
    match subscription {
        Some(subscription) => subscription.next().await,
        None => std::future::pending().await,
    }
}
