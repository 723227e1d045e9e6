use crossterm::event::{self, Event, KeyEventKind};
use std::thread::JoinHandle;
use tokio::sync::mpsc;
use tracing::warn;

use crate::events::AppEvent;

/// Blocking terminal reader; ends when the event loop drops its receiver.
pub fn spawn(event_tx: mpsc::UnboundedSender<AppEvent>) -> JoinHandle<()> {
    std::thread::spawn(move || {
        loop {
            let event = match event::read() {
                Ok(Event::Key(key_event)) if key_event.kind == KeyEventKind::Press => {
                    AppEvent::Input(key_event)
                }
                Ok(Event::Resize(width, height)) => AppEvent::Resize(width, height),
                Ok(_) => continue,
                Err(e) => {
                    warn!(error = %e, "Terminal input failed");
                    break;
                }
            };

            if event_tx.send(event).is_err() {
                break;
            }
        }
    })
}
