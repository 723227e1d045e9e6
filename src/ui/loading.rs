use std::time::{Duration, Instant};

const FRAMES: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// Braille spinner shown while a stream is downloading.
pub struct Spinner {
    current_frame: usize,
    last_update: Instant,
    frame_duration: Duration,
}

impl Spinner {
    pub fn new() -> Self {
        Self {
            current_frame: 0,
            last_update: Instant::now(),
            frame_duration: Duration::from_millis(80),
        }
    }

    pub fn tick(&mut self) {
        if self.last_update.elapsed() >= self.frame_duration {
            self.current_frame = (self.current_frame + 1) % FRAMES.len();
            self.last_update = Instant::now();
        }
    }

    pub fn reset(&mut self) {
        self.current_frame = 0;
    }

    pub fn frame(&self) -> &'static str {
        FRAMES[self.current_frame]
    }
}

impl Default for Spinner {
    fn default() -> Self {
        Self::new()
    }
}
