//! Time formatting utilities

use std::time::Duration;

/// Format seconds the way the transcoder expects them on the command line.
///
/// Whole seconds are printed without a fraction so that the command line of a
/// uniform plan reads `-ss 60 -t 30`.
pub fn format_transcoder_seconds(seconds: f64) -> String {
    if seconds.fract() == 0.0 {
        format!("{}", seconds as u64)
    } else {
        let formatted = format!("{:.3}", seconds);
        formatted.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}

/// Format elapsed wall-clock time for log lines
pub fn format_elapsed(elapsed: Duration) -> String {
    if elapsed.as_secs() >= 60 {
        let total_seconds = elapsed.as_secs();
        format!("{}m{:02}s", total_seconds / 60, total_seconds % 60)
    } else {
        format!("{:.3}s", elapsed.as_secs_f64())
    }
}

/// Milliseconds of a duration, saturating
pub fn as_millis_u64(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
}
