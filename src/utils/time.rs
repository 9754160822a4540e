use chrono::{Datelike, NaiveDate};

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// This is the standard way of naming a single day inside a month record. The format is
/// `{year}-{month}-{day}` with a 1-based month and no zero padding. Stored data depends on this
/// exact shape, so it must not be changed to the padded display format.
pub fn day_key(date: NaiveDate) -> String {
    format!("{}-{}-{}", date.year(), date.month(), date.day())
}

/// Name of the local store entry holding a whole month. `month` is 0-based.
pub fn month_storage_key(year: i32, month: u32) -> String {
    format!("consistency-{}-{}", year, month + 1)
}

/// Returns the first day of a 0-based month, if the month exists.
pub fn month_start(year: i32, month: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month + 1, 1)
}

/// Number of days in a 0-based month. Computed as "day 0 of the next month", i.e. the day before
/// the first of the following month.
pub fn days_in_month(year: i32, month: u32) -> Option<u32> {
    let (next_year, next_month) = match month {
        11 => (year + 1, 0),
        0..11 => (year, month + 1),
        _ => return None,
    };
    month_start(next_year, next_month)?
        .pred_opt()
        .map(|last| last.day())
}

pub fn month_name(month: u32) -> &'static str {
    MONTH_NAMES[(month % 12) as usize]
}

/// Date line shown above the task list, e.g. `Monday, 19/10/2026`.
pub fn date_banner(date: NaiveDate) -> String {
    format!("{}, {}", date.format("%A"), date.format("%d/%m/%Y"))
}
