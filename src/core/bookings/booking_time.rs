// Parsing and formatting of the free-text times users type into modals and
// slash command options. All times are UTC.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, TimeZone, Utc};

/// Parse a start time like `2024-03-01` or `2024-03-01 18:30`.
/// A bare date means midnight UTC.
pub fn parse_start(input: &str) -> Option<DateTime<Utc>> {
    let input = input.trim();

    for format in ["%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(input, format) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }

    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}

/// Parse a duration string like "3d", "12h", "90m", "2 days" into a Duration.
/// A bare number is read as days, which is how bookings are usually sized.
/// Values chrono can't represent are rejected.
pub fn parse_duration(input: &str) -> Option<Duration> {
    let input = input.trim().to_lowercase();
    if input.is_empty() {
        return None;
    }

    if let Ok(days) = input.parse::<i64>() {
        return Duration::try_days(days);
    }

    parse_compact_format(&input).or_else(|| parse_verbose_format(&input))
}

/// Parse compact formats like "30m", "2h", "1d", "1w"
fn parse_compact_format(input: &str) -> Option<Duration> {
    let (num_str, minutes_per_unit) = if let Some(n) = input.strip_suffix('m') {
        (n, 1)
    } else if let Some(n) = input.strip_suffix('h') {
        (n, 60)
    } else if let Some(n) = input.strip_suffix('d') {
        (n, 60 * 24)
    } else if let Some(n) = input.strip_suffix('w') {
        (n, 60 * 24 * 7)
    } else {
        return None;
    };

    let number: i64 = num_str.trim().parse().ok()?;
    Duration::try_minutes(number.checked_mul(minutes_per_unit)?)
}

/// Parse verbose formats like "30 minutes", "2 hours", "1 day"
fn parse_verbose_format(input: &str) -> Option<Duration> {
    let parts: Vec<&str> = input.split_whitespace().collect();

    if parts.len() != 2 {
        return None;
    }

    let number: i64 = parts[0].parse().ok()?;
    let minutes_per_unit = match parts[1] {
        "minute" | "minutes" | "min" | "mins" => 1,
        "hour" | "hours" | "hr" | "hrs" => 60,
        "day" | "days" => 60 * 24,
        "week" | "weeks" => 60 * 24 * 7,
        _ => return None,
    };

    Duration::try_minutes(number.checked_mul(minutes_per_unit)?)
}

/// Format a number of minutes into a human-readable string
pub fn format_minutes(total_minutes: i64) -> String {
    let plural = |n: i64| if n == 1 { "" } else { "s" };

    if total_minutes < 60 {
        format!("{} minute{}", total_minutes, plural(total_minutes))
    } else if total_minutes < 60 * 24 {
        let hours = total_minutes / 60;
        let mins = total_minutes % 60;
        if mins > 0 {
            format!(
                "{} hour{} and {} minute{}",
                hours,
                plural(hours),
                mins,
                plural(mins)
            )
        } else {
            format!("{} hour{}", hours, plural(hours))
        }
    } else {
        let days = total_minutes / (60 * 24);
        let hours = (total_minutes % (60 * 24)) / 60;
        if hours > 0 {
            format!(
                "{} day{} and {} hour{}",
                days,
                plural(days),
                hours,
                plural(hours)
            )
        } else {
            format!("{} day{}", days, plural(days))
        }
    }
}
