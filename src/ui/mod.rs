pub mod loading;
pub mod notifications;
pub mod render;
pub mod theme;

use std::time::Duration;

/// `MM:SS`, or `H:MM:SS` once the span reaches an hour.
pub fn format_duration(duration: Duration) -> String {
    let total = duration.as_secs();
    let (hours, minutes, seconds) = (total / 3600, (total % 3600) / 60, total % 60);
    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!("{:02}:{:02}", minutes, seconds)
    }
}
