//! Human-readable presentation of schedule windows

use super::models::ScheduleWindow;

/// Shown when an instant could not be resolved to a window
pub const UNAVAILABLE_PERIOD: &str = "Airing Period: unavailable";

/// Formats a window as `"Airing Period: June, 23 - June, 29"` using the UTC
/// dates of its start and end.
pub fn format_airing_period(window: &ScheduleWindow) -> String {
    format!(
        "Airing Period: {} - {}",
        window.start.format("%B, %d"),
        window.end.format("%B, %d")
    )
}

/// Like [`format_airing_period`], with an explicit unavailable state instead
/// of a guessed neighbouring week.
pub fn format_period_or_unavailable(window: Option<&ScheduleWindow>) -> String {
    match window {
        Some(window) => format_airing_period(window),
        None => UNAVAILABLE_PERIOD.to_string(),
    }
}
