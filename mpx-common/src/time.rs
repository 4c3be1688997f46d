//! Timestamp and timecode utilities

use chrono::{DateTime, Utc};
use std::time::Duration;

/// Get current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Convert milliseconds to duration
pub fn millis_to_duration(millis: u64) -> Duration {
    Duration::from_millis(millis)
}

/// Convert duration to whole milliseconds, saturating at `u64::MAX`
pub fn duration_to_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Format a position as an SMPTE timecode `HH:MM:SS:FF`
///
/// Returns an empty string when the frame rate is not positive.
pub fn smpte_timecode(position: Duration, frame_rate: f64) -> String {
    if !(frame_rate.is_finite() && frame_rate > 0.0) {
        return String::new();
    }

    let total_seconds = position.as_secs();
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;
    let frames_per_second = frame_rate.round().max(1.0) as u64;
    let frame = ((position.subsec_nanos() as f64 / 1_000_000_000.0) * frame_rate).floor() as u64;

    format!(
        "{:02}:{:02}:{:02}:{:02}",
        hours,
        minutes,
        seconds,
        frame.min(frames_per_second - 1)
    )
}
