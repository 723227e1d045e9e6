use std::time::Duration;

use tokio::sync::watch;
use tracing::debug;

use crate::viewmodel::observable::Observable;
use crate::viewmodel::remaining_time_label;

pub const DOWNLOADING_STATUS: &str = "Downloading...";

/// Consistent read of both observable fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub is_playing: bool,
    pub current_status: String,
}

/// Play/stop state for one screen.
///
/// Transitions are synchronous; awaiting the engine is the dispatcher's job.
/// Every Play and Stop bumps `request`, so a start that resolves after a later
/// request can tell it has been superseded.
#[derive(Debug)]
pub struct PlaybackViewModel {
    is_playing: Observable<bool>,
    current_status: Observable<String>,
    media_url: String,
    request: u64,
}

impl PlaybackViewModel {
    pub fn new(media_url: impl Into<String>) -> Self {
        Self {
            is_playing: Observable::new(false),
            current_status: Observable::new(String::new()),
            media_url: media_url.into(),
            request: 0,
        }
    }

    pub fn media_url(&self) -> &str {
        &self.media_url
    }

    pub fn is_playing(&self) -> bool {
        self.is_playing.get()
    }

    pub fn current_status(&self) -> String {
        self.current_status.get()
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            is_playing: self.is_playing(),
            current_status: self.current_status(),
        }
    }

    pub fn subscribe_is_playing(&self) -> watch::Receiver<bool> {
        self.is_playing.subscribe()
    }

    pub fn subscribe_current_status(&self) -> watch::Receiver<String> {
        self.current_status.subscribe()
    }

    /// Enter the downloading state. Returns the request number the engine
    /// start belongs to.
    pub fn begin_play(&mut self) -> u64 {
        self.request += 1;
        self.is_playing.set(true);
        self.current_status.set(DOWNLOADING_STATUS.to_string());
        self.request
    }

    pub fn begin_stop(&mut self) {
        self.request += 1;
        self.reset();
    }

    pub fn on_position_changed(&mut self, position: Duration, duration: Duration) {
        if self.is_playing() {
            self.current_status.set(remaining_time_label(position, duration));
        }
    }

    pub fn on_item_finished(&mut self) {
        self.current_status.set(String::new());
        self.is_playing.set(false);
    }

    /// Roll back a failed start. Returns false when a later Play or Stop
    /// already took over, in which case the state is left alone.
    pub fn on_play_failed(&mut self, request: u64) -> bool {
        if request != self.request {
            debug!(request, latest = self.request, "Ignoring failure of superseded start");
            return false;
        }
        self.reset();
        true
    }

    fn reset(&mut self) {
        self.is_playing.set(false);
        self.current_status.set(String::new());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secs(s: u64) -> Duration {
        Duration::from_secs(s)
    }

    #[test]
    fn test_begin_play_sets_downloading() {
        let mut vm = PlaybackViewModel::new("http://example.com/a.mp3");
        vm.begin_play();

        assert!(vm.is_playing());
        assert_eq!(vm.current_status(), DOWNLOADING_STATUS);
    }

    #[test]
    fn test_position_while_playing_updates_status() {
        let mut vm = PlaybackViewModel::new("u");
        vm.begin_play();
        vm.on_position_changed(secs(47), secs(125));

        assert_eq!(vm.current_status(), "Time Remaining: 01:18");
    }

    #[test]
    fn test_position_while_idle_leaves_status() {
        let mut vm = PlaybackViewModel::new("u");
        let mut status = vm.subscribe_current_status();

        vm.on_position_changed(secs(10), secs(100));

        assert_eq!(vm.current_status(), "");
        assert!(!status.has_changed().unwrap());
        assert_eq!(status.borrow_and_update().as_str(), "");
    }

    #[test]
    fn test_position_after_finish_is_ignored() {
        let mut vm = PlaybackViewModel::new("u");
        vm.begin_play();
        vm.on_item_finished();
        vm.on_position_changed(secs(1), secs(2));

        assert_eq!(
            vm.snapshot(),
            Snapshot {
                is_playing: false,
                current_status: String::new()
            }
        );
    }

    #[test]
    fn test_item_finished_resets_from_any_status() {
        let mut vm = PlaybackViewModel::new("u");
        vm.begin_play();
        vm.on_position_changed(secs(3), secs(600));
        assert_ne!(vm.current_status(), "");

        vm.on_item_finished();
        assert!(!vm.is_playing());
        assert_eq!(vm.current_status(), "");
    }

    #[test]
    fn test_stop_resets_state() {
        let mut vm = PlaybackViewModel::new("u");
        vm.begin_play();
        vm.begin_stop();

        assert_eq!(
            vm.snapshot(),
            Snapshot {
                is_playing: false,
                current_status: String::new()
            }
        );
    }

    #[test]
    fn test_play_failure_rolls_back_latest_request() {
        let mut vm = PlaybackViewModel::new("u");
        let request = vm.begin_play();

        assert!(vm.on_play_failed(request));
        assert!(!vm.is_playing());
        assert_eq!(vm.current_status(), "");
    }

    #[test]
    fn test_play_failure_ignored_when_superseded() {
        let mut vm = PlaybackViewModel::new("u");
        let first = vm.begin_play();
        vm.begin_play();

        assert!(!vm.on_play_failed(first));
        assert!(vm.is_playing());
        assert_eq!(vm.current_status(), DOWNLOADING_STATUS);
    }

    #[test]
    fn test_repeated_play_notifies_once() {
        let mut vm = PlaybackViewModel::new("u");
        let mut playing = vm.subscribe_is_playing();

        vm.begin_play();
        assert!(playing.has_changed().unwrap());
        playing.borrow_and_update();

        vm.begin_play();
        assert!(!playing.has_changed().unwrap());
    }
}
