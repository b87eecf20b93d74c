use std::collections::HashSet;

use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use utoipa::ToSchema;

use super::hours::{net_working_hours, round2};
use super::status::aggregate_lunch;
use crate::calendar::DateRange;
use crate::model::attendance::AttendanceRecord;
use crate::model::profile::{Holiday, StaffProfile};

pub const DEFAULT_DAILY_HOURS: f64 = 8.0;

/// Expected-vs-actual rollup for a date range. Hour totals are rounded to
/// 2 decimals; the underlying sums are taken over unrounded values.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct Statistics {
    #[schema(example = 21)]
    pub expected_working_days: u32,
    #[schema(example = 9.0)]
    pub expected_daily_hours: f64,
    #[schema(example = 189.0)]
    pub expected_total_hours: f64,
    /// Sum of stored (gross) working hours.
    #[schema(example = 172.5)]
    pub total_hours_worked: f64,
    /// Same sum with each day's lunch breaks taken out.
    #[schema(example = 160.75)]
    pub total_net_hours_worked: f64,
    #[schema(example = 19)]
    pub completed_days: u32,
    #[schema(example = 1)]
    pub leave_days: u32,
}

/// Office-out minus office-in in hours, or 8 when the profile has no usable
/// office hours. An office-out earlier than office-in is an overnight shift.
pub fn expected_daily_hours(profile: &StaffProfile) -> f64 {
    match profile.office_hours() {
        Some((time_in, time_out)) => {
            let mut minutes = (time_out - time_in).num_minutes();
            if minutes <= 0 {
                minutes += 24 * 60;
            }
            minutes as f64 / 60.0
        }
        None => DEFAULT_DAILY_HOURS,
    }
}

pub fn is_expected_working_day(
    date: NaiveDate,
    profile: &StaffProfile,
    holidays: &HashSet<NaiveDate>,
) -> bool {
    profile.works_on(date.weekday()) && !holidays.contains(&date)
}

pub fn compute_expected_statistics(
    records: &[AttendanceRecord],
    profile: &StaffProfile,
    holidays: &[Holiday],
    range: DateRange,
) -> Statistics {
    let holiday_dates: HashSet<NaiveDate> = holidays.iter().map(|h| h.date).collect();

    let expected_working_days = range
        .days()
        .filter(|d| is_expected_working_day(*d, profile, &holiday_dates))
        .count() as u32;

    let expected_daily_hours = expected_daily_hours(profile);
    let expected_total_hours = expected_working_days as f64 * expected_daily_hours;

    let in_range: Vec<&AttendanceRecord> =
        records.iter().filter(|r| range.contains(r.date)).collect();

    let total_hours_worked: f64 = in_range
        .iter()
        .map(|r| r.working_hours.unwrap_or(0.0))
        .sum();

    let total_net_hours_worked: f64 = in_range
        .iter()
        .map(|r| {
            let (_, lunch_minutes) = aggregate_lunch(&r.lunch_breaks);
            net_working_hours(r.working_hours, lunch_minutes).unwrap_or(0.0)
        })
        .sum();

    let completed_days = in_range.iter().filter(|r| r.is_completed()).count() as u32;
    let leave_days = in_range.iter().filter(|r| r.is_leave()).count() as u32;

    Statistics {
        expected_working_days,
        expected_daily_hours,
        expected_total_hours: round2(expected_total_hours),
        total_hours_worked: round2(total_hours_worked),
        total_net_hours_worked: round2(total_net_hours_worked),
        completed_days,
        leave_days,
    }
}
