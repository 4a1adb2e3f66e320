//! Countdown display helpers.

/// Format seconds as `MM:SS`.
///
/// ```
/// use memory_match::timing::format_clock;
///
/// assert_eq!(format_clock(125), "02:05");
/// assert_eq!(format_clock(0), "00:00");
/// ```
#[must_use]
pub fn format_clock(seconds: u32) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}
