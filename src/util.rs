use chrono::{Datelike, NaiveDate};

/// Human duration for route cards: "1h 30m", "2h", "45m"
pub fn format_minutes(minutes: u32) -> String {
    let hours = minutes / 60;
    let mins = minutes % 60;

    match (hours, mins) {
        (0, m) => format!("{m}m"),
        (h, 0) => format!("{h}h"),
        (h, m) => format!("{h}h {m}m"),
    }
}

/// Compact total for the profile header: "1h30m", "2h", "45m"
pub fn format_hours(minutes: u64) -> String {
    let hours = minutes / 60;
    let mins = minutes % 60;

    match (hours, mins) {
        (0, m) => format!("{m}m"),
        (h, 0) => format!("{h}h"),
        (h, m) => format!("{h}h{m}m"),
    }
}

/// Countdown clock, "MM:SS". Minutes are not wrapped into hours.
pub fn format_clock(seconds: u32) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

/// "Today", "Yesterday", "3 days ago", or "M/D" once a week has passed
pub fn relative_day_text(day: NaiveDate, today: NaiveDate) -> String {
    let diff = (today - day).num_days();

    match diff {
        d if d <= 0 => "Today".to_string(),
        1 => "Yesterday".to_string(),
        d if d < 7 => format!("{d} days ago"),
        _ => format!("{}/{}", day.month(), day.day()),
    }
}
