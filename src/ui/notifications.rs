use std::time::{Duration, Instant};

const MAX_VISIBLE: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Error,
}

impl NotificationLevel {
    pub fn prefix(&self) -> &'static str {
        match self {
            NotificationLevel::Info => "INFO",
            NotificationLevel::Error => "ERROR",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Notification {
    pub level: NotificationLevel,
    pub text: String,
    pub created_at: Instant,
    pub duration: Duration,
}

impl Notification {
    pub fn is_expired(&self) -> bool {
        self.created_at.elapsed() >= self.duration
    }
}

/// Short-lived messages drawn over the screen, newest last.
#[derive(Debug, Default)]
pub struct NotificationManager {
    notifications: Vec<Notification>,
}

impl NotificationManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notify(
        &mut self,
        level: NotificationLevel,
        text: impl Into<String>,
        duration: Duration,
    ) {
        self.notifications.push(Notification {
            level,
            text: text.into(),
            created_at: Instant::now(),
            duration,
        });
        if self.notifications.len() > MAX_VISIBLE {
            let excess = self.notifications.len() - MAX_VISIBLE;
            self.notifications.drain(..excess);
        }
    }

    pub fn info(&mut self, text: impl Into<String>) {
        self.notify(NotificationLevel::Info, text, Duration::from_secs(2));
    }

    pub fn error(&mut self, text: impl Into<String>) {
        self.notify(NotificationLevel::Error, text, Duration::from_secs(5));
    }

    pub fn tick(&mut self) {
        self.notifications.retain(|n| !n.is_expired());
    }

    pub fn active_notifications(&self) -> &[Notification] {
        &self.notifications
    }
}
