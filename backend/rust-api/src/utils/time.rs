/// Formats a countdown as `M:SS`. Minutes are not zero-padded and keep growing past 59.
pub fn format_remaining(seconds: u32) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

/// Stopwatch-style formatting: `H:MM:SS` from one hour on, `M:SS` below.
pub fn format_elapsed(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;
    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, secs)
    } else {
        format!("{}:{:02}", minutes, secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remaining_has_no_leading_zero_on_minutes() {
        assert_eq!(format_remaining(300), "5:00");
        assert_eq!(format_remaining(61), "1:01");
        assert_eq!(format_remaining(9), "0:09");
        assert_eq!(format_remaining(0), "0:00");
        assert_eq!(format_remaining(900), "15:00");
    }

    #[test]
    fn elapsed_switches_to_hours() {
        assert_eq!(format_elapsed(59), "0:59");
        assert_eq!(format_elapsed(3599), "59:59");
        assert_eq!(format_elapsed(3600), "1:00:00");
        assert_eq!(format_elapsed(3725), "1:02:05");
    }
}
