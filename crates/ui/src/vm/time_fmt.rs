use chrono::{DateTime, Utc};

#[must_use]
pub fn format_datetime(value: DateTime<Utc>) -> String {
    value.format("%Y-%m-%d %H:%M UTC").to_string()
}

/// Countdown label such as `0:42`.
#[must_use]
pub fn format_countdown(seconds: u64) -> String {
    let minutes = seconds / 60;
    let remainder = seconds % 60;
    format!("{minutes}:{remainder:02}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::time::fixed_now;

    #[test]
    fn formats_are_stable() {
        assert_eq!(format_datetime(fixed_now()), "2023-11-14 22:13 UTC");
        assert_eq!(format_countdown(60), "1:00");
        assert_eq!(format_countdown(9), "0:09");
    }
}
