use chrono::{Datelike, Duration, FixedOffset, NaiveDate, TimeZone};
use itertools::Itertools;
use std::collections::BTreeMap;
use url::Url;

use crate::records::FocusRecord;
use crate::util::{format_hours, format_minutes, relative_day_text};

const SHARE_BASE_URL: &str = "https://twitter.com/intent/tweet";
/// Minutes of focus that fill a week-chart bar
const WEEK_BAR_FULL_MINUTES: f64 = 120.0;
const WEEK_BAR_MIN_PERCENT: u32 = 10;
pub const CALENDAR_CELLS: usize = 42;
pub const RECENT_FLIGHTS: usize = 5;

/// Completed flights that ended on one calendar day
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DayGroup {
    /// In history order, newest first
    pub records: Vec<FocusRecord>,
    pub total_duration: u32,
}

/// Calendar day an epoch-millisecond instant falls on in `tz`
pub fn local_day(epoch_ms: i64, tz: &FixedOffset) -> Option<NaiveDate> {
    tz.timestamp_millis_opt(epoch_ms)
        .single()
        .map(|dt| dt.date_naive())
}

/// Bucket completed records by the day they ended on
pub fn group_by_day(history: &[FocusRecord], tz: &FixedOffset) -> BTreeMap<NaiveDate, DayGroup> {
    let mut groups: BTreeMap<NaiveDate, DayGroup> = BTreeMap::new();

    for record in history.iter().filter(|r| r.completed) {
        let Some(day) = local_day(record.ended_at_epoch_ms, tz) else {
            continue;
        };
        let group = groups.entry(day).or_default();
        group.total_duration += record.duration_min;
        group.records.push(record.clone());
    }

    groups
}

/// Consecutive days with at least one completed flight, counted back from
/// `today`. An empty today does not break the streak; counting then starts
/// at yesterday.
pub fn consecutive_day_streak(history: &[FocusRecord], today: NaiveDate, tz: &FixedOffset) -> u32 {
    let groups = group_by_day(history, tz);

    let mut day = if groups.contains_key(&today) {
        today
    } else {
        today - Duration::days(1)
    };

    let mut streak = 0;
    while groups.contains_key(&day) {
        streak += 1;
        day = day - Duration::days(1);
    }
    streak
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProfileSummary {
    pub flights: usize,
    pub total_minutes: u64,
    pub total_distance_km: u64,
    pub streak: u32,
}

impl ProfileSummary {
    pub fn total_time_text(&self) -> String {
        format_hours(self.total_minutes)
    }
}

pub fn profile_summary(
    history: &[FocusRecord],
    total_minutes: u64,
    today: NaiveDate,
    tz: &FixedOffset,
) -> ProfileSummary {
    let completed = history.iter().filter(|r| r.completed);

    ProfileSummary {
        flights: completed.clone().count(),
        total_minutes,
        total_distance_km: completed.map(|r| r.distance_km as u64).sum(),
        streak: consecutive_day_streak(history, today, tz),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WeekDay {
    pub date: NaiveDate,
    pub label: &'static str,
    pub minutes: u32,
    pub bar_percent: u32,
    pub is_today: bool,
}

/// Focus minutes for each day of the current week, Sunday first
pub fn week_summary(history: &[FocusRecord], today: NaiveDate, tz: &FixedOffset) -> Vec<WeekDay> {
    const LABELS: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

    let groups = group_by_day(history, tz);
    let start = today - Duration::days(today.weekday().num_days_from_sunday() as i64);

    LABELS
        .into_iter()
        .enumerate()
        .map(|(offset, label)| {
            let date = start + Duration::days(offset as i64);
            let minutes = groups.get(&date).map_or(0, |g| g.total_duration);
            WeekDay {
                date,
                label,
                minutes,
                bar_percent: bar_percent(minutes),
                is_today: date == today,
            }
        })
        .collect()
}

fn bar_percent(minutes: u32) -> u32 {
    let pct = (minutes as f64 / WEEK_BAR_FULL_MINUTES * 100.0).round() as u32;
    pct.clamp(WEEK_BAR_MIN_PERCENT, 100)
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecentFlight<'a> {
    pub record: &'a FocusRecord,
    pub date_text: String,
}

/// The newest `n` records, with a human date
pub fn recent_flights<'a>(
    history: &'a [FocusRecord],
    n: usize,
    today: NaiveDate,
    tz: &FixedOffset,
) -> Vec<RecentFlight<'a>> {
    history
        .iter()
        .take(n)
        .map(|record| RecentFlight {
            record,
            date_text: local_day(record.ended_at_epoch_ms, tz)
                .map(|day| relative_day_text(day, today))
                .unwrap_or_default(),
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct CalendarDay {
    pub date: NaiveDate,
    pub in_month: bool,
    pub is_today: bool,
    pub flights: usize,
    pub minutes: u32,
}

impl CalendarDay {
    pub fn has_focus(&self) -> bool {
        self.flights > 0
    }
}

/// First day of the month `delta` months away from the one containing `date`
pub fn shift_month(date: NaiveDate, delta: i32) -> NaiveDate {
    let months = date.year() * 12 + date.month0() as i32 + delta;
    let year = months.div_euclid(12);
    let month = months.rem_euclid(12) as u32 + 1;
    NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(date)
}

/// Six weeks of days covering the month of `month_of`, starting on the
/// Sunday on or before the 1st
pub fn month_grid(
    month_of: NaiveDate,
    today: NaiveDate,
    groups: &BTreeMap<NaiveDate, DayGroup>,
) -> Vec<CalendarDay> {
    let first = shift_month(month_of, 0);
    let start = first - Duration::days(first.weekday().num_days_from_sunday() as i64);

    (0..CALENDAR_CELLS as i64)
        .map(|offset| {
            let date = start + Duration::days(offset);
            let group = groups.get(&date);
            CalendarDay {
                date,
                in_month: date.month() == first.month() && date.year() == first.year(),
                is_today: date == today,
                flights: group.map_or(0, |g| g.records.len()),
                minutes: group.map_or(0, |g| g.total_duration),
            }
        })
        .collect()
}

pub fn total_focus_days(groups: &BTreeMap<NaiveDate, DayGroup>) -> usize {
    groups.len()
}

pub fn focus_days_in_month(groups: &BTreeMap<NaiveDate, DayGroup>, month_of: NaiveDate) -> usize {
    groups
        .keys()
        .filter(|d| d.year() == month_of.year() && d.month() == month_of.month())
        .count()
}

/// Summary shown when a calendar day is selected
pub fn day_detail(date: NaiveDate, group: Option<&DayGroup>) -> String {
    let header = date.format("%B %-d, %Y").to_string();
    let Some(group) = group.filter(|g| !g.records.is_empty()) else {
        return format!("{header}\nNo flights on this day");
    };

    let flights = group
        .records
        .iter()
        .map(|r| format!("{} → {} ({})", r.from_city, r.to_city, format_minutes(r.duration_min)))
        .join("\n");

    format!(
        "{header}\n{} flight{}, {} focused\n{flights}",
        group.records.len(),
        if group.records.len() == 1 { "" } else { "s" },
        format_minutes(group.total_duration),
    )
}

pub fn share_message(flights: usize, total_minutes: u64) -> String {
    format!(
        "I've completed {flights} focus flights on FocusFlight, {} in total!",
        format_hours(total_minutes)
    )
}

pub fn share_url(message: &str) -> Option<String> {
    Url::parse_with_params(SHARE_BASE_URL, &[("text", message)])
        .ok()
        .map(|url| url.to_string())
}
