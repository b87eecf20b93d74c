use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use utoipa::ToSchema;

use super::hours::{lunch_duration_minutes, net_working_hours, round2};
use crate::model::attendance::{AttendanceRecord, LunchBreak, WorkDone};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AttendanceStatus {
    NotPunchedIn,
    OnLeave,
    PunchedOut,
    OnLunchBreak,
    PunchedIn,
}

/// Status of one day plus the figures derived alongside it.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct DailyStatus {
    pub status: AttendanceStatus,
    #[schema(example = "doctor visit", nullable = true)]
    pub leave_reason: Option<String>,
    /// Breaks with `duration` filled in wherever an end time is known.
    pub lunch_breaks: Vec<LunchBreak>,
    #[schema(example = 45)]
    pub total_lunch_minutes: i64,
    #[schema(example = 9.0, nullable = true)]
    pub working_hours: Option<f64>,
    #[schema(example = 8.25, nullable = true)]
    pub net_working_hours: Option<f64>,
}

/// Fills missing durations on ended breaks and sums all durations.
pub fn aggregate_lunch(breaks: &[LunchBreak]) -> (Vec<LunchBreak>, i64) {
    let breaks: Vec<LunchBreak> = breaks
        .iter()
        .cloned()
        .map(|mut lunch| {
            if lunch.duration.is_none() {
                lunch.duration = lunch
                    .lunch_end_time
                    .map(|end| lunch_duration_minutes(lunch.lunch_start_time, end));
            }
            lunch
        })
        .collect();

    let total = breaks.iter().filter_map(|b| b.duration).sum();
    (breaks, total)
}

/// Derives the status of a day from its record, if one exists.
///
/// Leave wins over every punch field. An unfinished record from a past day
/// stays `PunchedIn`; an open lunch break only counts on the current day.
pub fn derive_daily_status(record: Option<&AttendanceRecord>, is_today: bool) -> DailyStatus {
    let Some(record) = record else {
        return DailyStatus {
            status: AttendanceStatus::NotPunchedIn,
            leave_reason: None,
            lunch_breaks: Vec::new(),
            total_lunch_minutes: 0,
            working_hours: None,
            net_working_hours: None,
        };
    };

    let (lunch_breaks, total_lunch_minutes) = aggregate_lunch(&record.lunch_breaks);

    let mut leave_reason = None;
    let status = match record.work_entry() {
        Some(WorkDone::Leave { reason }) => {
            leave_reason = reason;
            AttendanceStatus::OnLeave
        }
        _ if record.punch_out_time.is_some() => AttendanceStatus::PunchedOut,
        // a bare row with neither leave nor punch-in
        _ if record.punch_in_time.is_none() => AttendanceStatus::NotPunchedIn,
        _ if is_today && record.active_lunch_break().is_some() => AttendanceStatus::OnLunchBreak,
        _ => AttendanceStatus::PunchedIn,
    };

    DailyStatus {
        status,
        leave_reason,
        lunch_breaks,
        total_lunch_minutes,
        working_hours: record.working_hours,
        net_working_hours: net_working_hours(record.working_hours, total_lunch_minutes).map(round2),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, NaiveDate, TimeZone, Utc};
    use std::str::FromStr;

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 4, 1, h, m, 0).unwrap()
    }

    fn record() -> AttendanceRecord {
        AttendanceRecord {
            id: 1,
            user_id: 7,
            date: NaiveDate::from_ymd_opt(2024, 4, 1).unwrap(),
            punch_in_time: Some(at(3, 30)),
            punch_out_time: None,
            punch_in_location: None,
            punch_out_location: None,
            working_hours: None,
            work_done: None,
            lunch_breaks: Vec::new(),
        }
    }

    fn lunch(id: u64, start: DateTime<Utc>, end: Option<DateTime<Utc>>, duration: Option<i64>) -> LunchBreak {
        LunchBreak {
            id,
            attendance_id: 1,
            lunch_start_time: start,
            lunch_end_time: end,
            duration,
        }
    }

    #[test]
    fn missing_record_is_not_punched_in() {
        let status = derive_daily_status(None, true);
        assert_eq!(status.status, AttendanceStatus::NotPunchedIn);
        assert_eq!(status.total_lunch_minutes, 0);
        assert_eq!(status.net_working_hours, None);
    }

    #[test]
    fn leave_marker_wins_over_punch_fields() {
        let mut rec = record();
        rec.punch_in_time = None;
        rec.work_done = Some("ON_LEAVE: doctor visit".to_string());
        let status = derive_daily_status(Some(&rec), true);
        assert_eq!(status.status, AttendanceStatus::OnLeave);
        assert_eq!(status.leave_reason.as_deref(), Some("doctor visit"));

        // even a closed record reads as leave when marked
        rec.punch_in_time = Some(at(3, 30));
        rec.punch_out_time = Some(at(12, 30));
        assert_eq!(
            derive_daily_status(Some(&rec), false).status,
            AttendanceStatus::OnLeave
        );
    }

    #[test]
    fn punched_out_record() {
        let mut rec = record();
        rec.punch_out_time = Some(at(12, 30));
        rec.working_hours = Some(9.0);
        rec.work_done = Some("shipped release".to_string());
        let status = derive_daily_status(Some(&rec), true);
        assert_eq!(status.status, AttendanceStatus::PunchedOut);
        assert_eq!(status.net_working_hours, Some(9.0));
    }

    #[test]
    fn open_lunch_only_counts_today() {
        let mut rec = record();
        rec.lunch_breaks.push(lunch(1, at(7, 0), None, None));

        assert_eq!(
            derive_daily_status(Some(&rec), true).status,
            AttendanceStatus::OnLunchBreak
        );
        assert_eq!(
            derive_daily_status(Some(&rec), false).status,
            AttendanceStatus::PunchedIn
        );
    }

    #[test]
    fn closed_lunch_today_is_punched_in() {
        let mut rec = record();
        rec.lunch_breaks.push(lunch(1, at(7, 0), Some(at(7, 30)), Some(30)));
        assert_eq!(
            derive_daily_status(Some(&rec), true).status,
            AttendanceStatus::PunchedIn
        );
    }

    #[test]
    fn lunch_minutes_sum_stored_and_computed_durations() {
        let mut rec = record();
        rec.punch_out_time = Some(at(12, 30));
        rec.working_hours = Some(9.0);
        rec.lunch_breaks = vec![
            lunch(1, at(6, 0), Some(at(6, 15)), Some(15)),
            lunch(2, at(7, 0), Some(at(7, 20)), Some(20)),
            lunch(3, at(8, 0), Some(at(9, 0)), None),
        ];

        let status = derive_daily_status(Some(&rec), true);
        assert_eq!(status.total_lunch_minutes, 95);
        assert_eq!(status.lunch_breaks[2].duration, Some(60));
        // 9h less 95 minutes, rounded
        assert_eq!(status.net_working_hours, Some(7.42));
    }

    #[test]
    fn every_shape_maps_to_exactly_one_status() {
        let shapes = [
            (None, None, None, false),
            (Some(at(3, 0)), None, None, false),
            (Some(at(3, 0)), None, None, true),
            (Some(at(3, 0)), Some(at(12, 0)), None, false),
            (Some(at(3, 0)), Some(at(12, 0)), Some("ON_LEAVE"), true),
            (None, None, Some("ON_LEAVE: sick"), false),
        ];
        for (punch_in, punch_out, work_done, with_lunch) in shapes {
            let mut rec = record();
            rec.punch_in_time = punch_in;
            rec.punch_out_time = punch_out;
            rec.work_done = work_done.map(str::to_string);
            if with_lunch {
                rec.lunch_breaks.push(lunch(1, at(7, 0), None, None));
            }
            for is_today in [true, false] {
                let status = derive_daily_status(Some(&rec), is_today).status;
                let parsed = AttendanceStatus::from_str(&status.to_string()).unwrap();
                assert_eq!(parsed, status);
                if work_done.is_some_and(|w| w.starts_with("ON_LEAVE")) {
                    assert_eq!(status, AttendanceStatus::OnLeave);
                }
            }
        }
    }
}
