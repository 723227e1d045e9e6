pub mod dispatch;
pub mod observable;
pub mod state;

use std::time::Duration;

pub use dispatch::{ViewModelHandle, spawn};
pub use observable::Observable;
pub use state::{DOWNLOADING_STATUS, PlaybackViewModel, Snapshot};

/// `"Time Remaining: MM:SS"` for whatever is left of `duration`.
///
/// Minutes and seconds are the components of the remaining span, truncated to
/// whole seconds; hours are dropped. A position past the end reads as `00:00`.
pub fn remaining_time_label(position: Duration, duration: Duration) -> String {
    let remaining = duration.saturating_sub(position).as_secs();
    format!(
        "Time Remaining: {:02}:{:02}",
        (remaining / 60) % 60,
        remaining % 60
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remaining_label_basic() {
        let label = remaining_time_label(Duration::from_secs(47), Duration::from_secs(125));
        assert_eq!(label, "Time Remaining: 01:18");
    }

    #[test]
    fn test_remaining_label_truncates_fractions() {
        let label =
            remaining_time_label(Duration::from_millis(500), Duration::from_millis(60_999));
        assert_eq!(label, "Time Remaining: 01:00");
    }

    #[test]
    fn test_remaining_label_drops_hours() {
        // 1h 02m 03s remaining
        let label = remaining_time_label(Duration::ZERO, Duration::from_secs(3723));
        assert_eq!(label, "Time Remaining: 02:03");
    }

    #[test]
    fn test_remaining_label_matches_components_for_many_spans() {
        for duration in [0u64, 59, 60, 61, 599, 3599, 3600, 7322, 86_399] {
            for position in [0u64, 1, 30, 59, duration / 2, duration] {
                if position > duration {
                    continue;
                }
                let remaining = duration - position;
                let expected = format!(
                    "Time Remaining: {:02}:{:02}",
                    (remaining % 3600) / 60,
                    remaining % 60
                );
                assert_eq!(
                    remaining_time_label(
                        Duration::from_secs(position),
                        Duration::from_secs(duration)
                    ),
                    expected
                );
            }
        }
    }

    #[test]
    fn test_remaining_label_past_end_is_zero() {
        let label = remaining_time_label(Duration::from_secs(130), Duration::from_secs(125));
        assert_eq!(label, "Time Remaining: 00:00");
    }
}
