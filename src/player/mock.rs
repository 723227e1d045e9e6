use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Notify, broadcast};

use crate::error::EngineError;
use crate::events::EngineEvent;
use crate::player::commands::Timeline;
use crate::player::engine::MediaEngine;

/// Scriptable stand-in for a real engine. Records every request and lets the
/// caller push notifications by hand.
pub struct MockEngine {
    events: broadcast::Sender<EngineEvent>,
    timeline: Mutex<Timeline>,
    urls: Mutex<Vec<String>>,
    start_calls: AtomicUsize,
    stop_calls: AtomicUsize,
    start_entered: Notify,
    start_gate: Option<Notify>,
    fail_start: bool,
    fail_stop: bool,
    panic_start: bool,
}

impl MockEngine {
    pub fn new() -> Self {
        MockEngineBuilder::new().build()
    }

    pub fn emit_position(&self, position: Duration, duration: Duration) {
        if let Ok(mut timeline) = self.timeline.lock() {
            *timeline = Timeline { position, duration };
        }
        let _ = self
            .events
            .send(EngineEvent::PositionChanged { position, duration });
    }

    pub fn emit_finished(&self) {
        if let Ok(mut timeline) = self.timeline.lock() {
            *timeline = Timeline::default();
        }
        let _ = self.events.send(EngineEvent::MediaItemFinished);
    }

    pub fn start_calls(&self) -> usize {
        self.start_calls.load(Ordering::SeqCst)
    }

    pub fn stop_calls(&self) -> usize {
        self.stop_calls.load(Ordering::SeqCst)
    }

    pub fn requested_urls(&self) -> Vec<String> {
        self.urls.lock().map(|u| u.clone()).unwrap_or_default()
    }

    /// Number of live notification subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.events.receiver_count()
    }

    /// Resolves once `start` has been entered (immediately if it already was).
    pub async fn wait_for_start(&self) {
        self.start_entered.notified().await;
    }

    /// Lets one held `start` call resolve.
    pub fn release_start(&self) {
        if let Some(gate) = &self.start_gate {
            gate.notify_one();
        }
    }
}

impl Default for MockEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MediaEngine for MockEngine {
    async fn start(&self, url: &str) -> Result<(), EngineError> {
        self.start_calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut urls) = self.urls.lock() {
            urls.push(url.to_string());
        }
        self.start_entered.notify_one();

        if let Some(gate) = &self.start_gate {
            gate.notified().await;
        }

        if self.panic_start {
            panic!("mock engine panicked in start");
        }
        if self.fail_start {
            Err(EngineError::Output("mock start failure".to_string()))
        } else {
            Ok(())
        }
    }

    async fn stop(&self) -> Result<(), EngineError> {
        self.stop_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_stop {
            Err(EngineError::NotRunning)
        } else {
            Ok(())
        }
    }

    fn current_position(&self) -> Duration {
        self.timeline.lock().map(|t| t.position).unwrap_or_default()
    }

    fn current_duration(&self) -> Duration {
        self.timeline.lock().map(|t| t.duration).unwrap_or_default()
    }

    fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.events.subscribe()
    }
}

pub struct MockEngineBuilder {
    fail_start: bool,
    fail_stop: bool,
    hold_start: bool,
    panic_start: bool,
}

impl MockEngineBuilder {
    pub fn new() -> Self {
        Self {
            fail_start: false,
            fail_stop: false,
            hold_start: false,
            panic_start: false,
        }
    }

    pub fn fail_start(mut self) -> Self {
        self.fail_start = true;
        self
    }

    pub fn fail_stop(mut self) -> Self {
        self.fail_stop = true;
        self
    }

    pub fn panic_start(mut self) -> Self {
        self.panic_start = true;
        self
    }

    /// Keep every `start` pending until [`MockEngine::release_start`].
    pub fn hold_start(mut self) -> Self {
        self.hold_start = true;
        self
    }

    pub fn build(self) -> MockEngine {
        let (events, _) = broadcast::channel(64);
        MockEngine {
            events,
            timeline: Mutex::new(Timeline::default()),
            urls: Mutex::new(Vec::new()),
            start_calls: AtomicUsize::new(0),
            stop_calls: AtomicUsize::new(0),
            start_entered: Notify::new(),
            start_gate: self.hold_start.then(Notify::new),
            fail_start: self.fail_start,
            fail_stop: self.fail_stop,
            panic_start: self.panic_start,
        }
    }
}

impl Default for MockEngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}
