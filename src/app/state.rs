use std::sync::Arc;
use std::time::Duration;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tokio::sync::mpsc;
use tracing::error;

use crate::events::AppEvent;
use crate::player::MediaEngine;
use crate::ui::loading::Spinner;
use crate::ui::notifications::NotificationManager;
use crate::viewmodel::{DOWNLOADING_STATUS, ViewModelHandle};

/// The one screen of the player. Owns the view-model for its whole lifetime.
pub struct App {
    pub view_model: ViewModelHandle,
    pub engine: Arc<dyn MediaEngine>,

    pub notifications: NotificationManager,
    pub spinner: Spinner,

    pub should_quit: bool,

    // Command tasks report failures back through the event loop
    event_tx: mpsc::UnboundedSender<AppEvent>,
}

impl App {
    pub fn new(
        view_model: ViewModelHandle,
        engine: Arc<dyn MediaEngine>,
        event_tx: mpsc::UnboundedSender<AppEvent>,
    ) -> Self {
        Self {
            view_model,
            engine,
            notifications: NotificationManager::new(),
            spinner: Spinner::new(),
            should_quit: false,
            event_tx,
        }
    }

    pub fn handle_input(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.should_quit = true;
            }
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Char('p') | KeyCode::Enter => self.play(),
            KeyCode::Char('s') => self.stop(),
            KeyCode::Char(' ') => {
                if self.view_model.is_playing() {
                    self.stop();
                } else {
                    self.play();
                }
            }
            _ => {}
        }
    }

    /// Fire-and-forget, like a bound UI command. Failures come back as
    /// [`AppEvent::CommandFailed`].
    pub fn play(&self) {
        let view_model = self.view_model.clone();
        let event_tx = self.event_tx.clone();
        tokio::spawn(async move {
            if let Err(e) = view_model.play().await {
                let _ = event_tx.send(AppEvent::CommandFailed(e.to_string()));
            }
        });
    }

    pub fn stop(&self) {
        let view_model = self.view_model.clone();
        let event_tx = self.event_tx.clone();
        tokio::spawn(async move {
            if let Err(e) = view_model.stop().await {
                let _ = event_tx.send(AppEvent::CommandFailed(e.to_string()));
            }
        });
    }

    pub fn on_command_failed(&mut self, message: String) {
        error!(error = %message, "Command failed");
        self.notifications.error(message);
    }

    pub fn tick(&mut self) {
        self.notifications.tick();
        if self.is_downloading() {
            self.spinner.tick();
        } else {
            self.spinner.reset();
        }
    }

    pub fn is_downloading(&self) -> bool {
        self.view_model.is_playing() && self.view_model.current_status() == DOWNLOADING_STATUS
    }

    /// Engine timeline as `(position, duration)`.
    pub fn progress(&self) -> (Duration, Duration) {
        (
            self.engine.current_position(),
            self.engine.current_duration(),
        )
    }
}
