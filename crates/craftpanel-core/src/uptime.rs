//! Uptime formatting.

const SECS_PER_DAY: u64 = 86_400;

/// Render whole seconds as `[Dd ]HH:MM:SS`, omitting the day prefix when zero.
pub fn format_uptime(total_secs: u64) -> String {
    let days = total_secs / SECS_PER_DAY;
    let rest = total_secs % SECS_PER_DAY;
    let (hours, minutes, seconds) = (rest / 3600, (rest % 3600) / 60, rest % 60);
    if days > 0 {
        format!("{days}d {hours:02}:{minutes:02}:{seconds:02}")
    } else {
        format!("{hours:02}:{minutes:02}:{seconds:02}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_uptime() {
        assert_eq!(format_uptime(0), "00:00:00");
        assert_eq!(format_uptime(59), "00:00:59");
        assert_eq!(format_uptime(3_661), "01:01:01");
        assert_eq!(format_uptime(86_399), "23:59:59");
        assert_eq!(format_uptime(86_400), "1d 00:00:00");
        assert_eq!(format_uptime(3 * 86_400 + 7_322), "3d 02:02:02");
    }
}
