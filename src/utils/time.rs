// src/utils/time.rs

/// Formats remaining seconds as "MM:SS" for countdown displays.
pub fn format_remaining(seconds: i64) -> String {
    let seconds = seconds.max(0);
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}
