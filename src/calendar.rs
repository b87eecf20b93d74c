//! Calendar boundary.
//!
//! Every conversion from an instant to a calendar day goes through this
//! module. Attendance dates are IST (UTC+05:30) days regardless of where the
//! server runs, so a punch at 00:10 IST is filed under the IST date even
//! though it is still the previous day in UTC.

use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDate, NaiveTime, Utc, Weekday};
use derive_more::Display;
use std::sync::RwLock;

/// Offset of Indian Standard Time from UTC, in seconds.
const IST_OFFSET_SECS: i32 = 5 * 3600 + 30 * 60;

pub const WEEKDAY_NAMES: [&str; 7] = [
    "Sunday",
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
];

const WEEKDAYS: [Weekday; 7] = [
    Weekday::Sun,
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
];

pub fn ist() -> FixedOffset {
    FixedOffset::east_opt(IST_OFFSET_SECS).expect("IST offset is within ±24h")
}

/// IST calendar date of an instant.
pub fn ist_date(instant: DateTime<Utc>) -> NaiveDate {
    instant.with_timezone(&ist()).date_naive()
}

pub fn weekday_name(weekday: Weekday) -> &'static str {
    WEEKDAY_NAMES[weekday.num_days_from_sunday() as usize]
}

/// Parses a full weekday name (`"Monday"`), ignoring case and surrounding
/// whitespace.
pub fn parse_weekday(name: &str) -> Option<Weekday> {
    let name = name.trim();
    WEEKDAY_NAMES
        .iter()
        .position(|candidate| candidate.eq_ignore_ascii_case(name))
        .map(|idx| WEEKDAYS[idx])
}

/// Parses an office clock time in `HH:MM` form.
pub fn parse_clock_time(value: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(value.trim(), "%H:%M").ok()
}

#[derive(Debug, Display, PartialEq, Eq)]
pub enum CalendarError {
    #[display(fmt = "Invalid month '{}', expected YYYY-MM", _0)]
    InvalidMonth(String),
}

/// Inclusive range of IST calendar days.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// The whole calendar month described by a `YYYY-MM` string.
    pub fn from_month(month: &str) -> Result<Self, CalendarError> {
        let invalid = || CalendarError::InvalidMonth(month.to_string());

        let (year, month_num) = month.trim().split_once('-').ok_or_else(invalid)?;
        if year.len() != 4 || month_num.len() != 2 {
            return Err(invalid());
        }
        let year: i32 = year.parse().map_err(|_| invalid())?;
        let month_num: u32 = month_num.parse().map_err(|_| invalid())?;

        let start = NaiveDate::from_ymd_opt(year, month_num, 1).ok_or_else(invalid)?;
        let next_month = if month_num == 12 {
            NaiveDate::from_ymd_opt(year + 1, 1, 1)
        } else {
            NaiveDate::from_ymd_opt(year, month_num + 1, 1)
        }
        .ok_or_else(invalid)?;

        Ok(Self {
            start,
            end: next_month - Duration::days(1),
        })
    }

    /// The calendar month containing `date`.
    pub fn month_of(date: NaiveDate) -> Self {
        let start = date.with_day(1).unwrap_or(date);
        let end = start
            .checked_add_months(chrono::Months::new(1))
            .and_then(|next| next.pred_opt())
            .unwrap_or(date);
        Self { start, end }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Every day in the range, `start` and `end` included. Empty when
    /// `end` precedes `start`.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let end = self.end;
        self.start.iter_days().take_while(move |d| *d <= end)
    }

    pub fn label(&self) -> String {
        self.start.format("%Y-%m").to_string()
    }
}

/// Source of the current instant for request handlers.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock pinned to an instant that can be moved by hand.
pub struct FixedClock {
    instant: RwLock<DateTime<Utc>>,
}

impl FixedClock {
    pub fn new(instant: DateTime<Utc>) -> Self {
        Self {
            instant: RwLock::new(instant),
        }
    }

    pub fn set(&self, instant: DateTime<Utc>) {
        *self.instant.write().expect("clock lock poisoned") = instant;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.instant.read().expect("clock lock poisoned")
    }
}
