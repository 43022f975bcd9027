//! Calendar helpers shared by availability, overtime and recurrence.

use chrono::{Datelike, NaiveDate, TimeDelta, Weekday};

/// Monday on or before `date`.
///
/// # Examples
/// ```
/// use chrono::NaiveDate;
/// use carerota::domain::calendar::week_start;
///
/// let sunday = NaiveDate::from_ymd_opt(2024, 1, 7).unwrap();
/// assert_eq!(week_start(sunday), NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
/// ```
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - TimeDelta::days(i64::from(date.weekday().num_days_from_monday()))
}

/// ISO weekday number, Monday = 1 through Sunday = 7.
pub fn iso_weekday_number(weekday: Weekday) -> i16 {
    match weekday {
        Weekday::Mon => 1,
        Weekday::Tue => 2,
        Weekday::Wed => 3,
        Weekday::Thu => 4,
        Weekday::Fri => 5,
        Weekday::Sat => 6,
        Weekday::Sun => 7,
    }
}

/// Inverse of [`iso_weekday_number`].
pub fn weekday_from_iso_number(number: i16) -> Option<Weekday> {
    match number {
        1 => Some(Weekday::Mon),
        2 => Some(Weekday::Tue),
        3 => Some(Weekday::Wed),
        4 => Some(Weekday::Thu),
        5 => Some(Weekday::Fri),
        6 => Some(Weekday::Sat),
        7 => Some(Weekday::Sun),
        _ => None,
    }
}
