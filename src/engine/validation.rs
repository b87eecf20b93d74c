//! Preconditions for the attendance write actions.
//!
//! A day moves through `no record -> punched in (-> on lunch -> punched in)*
//! -> punched out`, or straight to leave. These checks are the only place the
//! transitions are policed; storage enforces (staff, date) uniqueness on top.

use chrono::{DateTime, Datelike, NaiveDate, Utc};

use super::error::PunchError;
use crate::calendar::{ist_date, weekday_name};
use crate::model::attendance::{AttendanceRecord, LEAVE_SENTINEL, LunchBreak};
use crate::model::profile::{Holiday, StaffProfile};

pub fn validate_punch_in(
    now: DateTime<Utc>,
    profile: &StaffProfile,
    today_holiday: Option<&Holiday>,
    existing: Option<&AttendanceRecord>,
) -> Result<(), PunchError> {
    let weekday = ist_date(now).weekday();
    if !profile.works_on(weekday) {
        return Err(PunchError::NotAWorkingDay {
            today: weekday_name(weekday),
            allowed: profile.working_day_names().join(", "),
        });
    }

    if let Some(holiday) = today_holiday {
        return Err(PunchError::IsHoliday {
            name: holiday.name.clone(),
        });
    }

    match existing {
        None => Ok(()),
        Some(record) if record.is_leave() => Err(PunchError::OnLeave),
        Some(record) if record.punch_out_time.is_some() => Err(PunchError::AlreadyCompleted),
        Some(_) => Err(PunchError::AlreadyPunchedIn),
    }
}

/// Returns the punch-in instant of the open record being closed.
pub fn validate_punch_out(
    record: Option<&AttendanceRecord>,
    now: DateTime<Utc>,
) -> Result<DateTime<Utc>, PunchError> {
    let punch_in = open_record(record)?
        .punch_in_time
        .ok_or(PunchError::NoActiveAttendance)?;

    if now < punch_in {
        return Err(PunchError::PunchOutBeforePunchIn);
    }
    Ok(punch_in)
}

pub fn validate_lunch_start(record: Option<&AttendanceRecord>) -> Result<(), PunchError> {
    let record = open_record(record)?;
    if record.active_lunch_break().is_some() {
        return Err(PunchError::LunchAlreadyActive);
    }
    Ok(())
}

pub fn validate_lunch_end(record: Option<&AttendanceRecord>) -> Result<&LunchBreak, PunchError> {
    open_record(record)?
        .active_lunch_break()
        .ok_or(PunchError::NoActiveLunchBreak)
}

/// Trims a work-done note; blank notes become `None`. Notes may not carry
/// the leave marker, which would turn a worked day into leave.
pub fn validate_work_done(text: Option<&str>) -> Result<Option<String>, PunchError> {
    match text.map(str::trim).filter(|t| !t.is_empty()) {
        Some(t) if t.starts_with(LEAVE_SENTINEL) => Err(PunchError::ReservedWorkDone),
        Some(t) => Ok(Some(t.to_string())),
        None => Ok(None),
    }
}

pub fn validate_leave(
    existing: Option<&AttendanceRecord>,
    date: NaiveDate,
) -> Result<(), PunchError> {
    match existing {
        Some(_) => Err(PunchError::RecordExists { date }),
        None => Ok(()),
    }
}

fn open_record(record: Option<&AttendanceRecord>) -> Result<&AttendanceRecord, PunchError> {
    match record {
        Some(r) if r.is_punched_in() && !r.is_leave() => Ok(r),
        _ => Err(PunchError::NoActiveAttendance),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn profile(days: &[&str]) -> StaffProfile {
        StaffProfile {
            user_id: 7,
            full_name: "Asha Rao".to_string(),
            working_days: days.iter().map(|d| d.to_string()).collect(),
            office_time_in: Some("09:00".to_string()),
            office_time_out: Some("18:00".to_string()),
            salary: 40000.0,
        }
    }

    // 2024-04-01 is a Monday; 04:00 UTC is 09:30 IST
    fn monday_morning() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 4, 1, 4, 0, 0).unwrap()
    }

    fn tuesday_morning() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 4, 2, 4, 0, 0).unwrap()
    }

    fn open(now: DateTime<Utc>) -> AttendanceRecord {
        AttendanceRecord {
            id: 1,
            user_id: 7,
            date: ist_date(now),
            punch_in_time: Some(now),
            punch_out_time: None,
            punch_in_location: None,
            punch_out_location: None,
            working_hours: None,
            work_done: None,
            lunch_breaks: Vec::new(),
        }
    }

    #[test]
    fn punch_in_allowed_on_clear_working_day() {
        assert_eq!(
            validate_punch_in(monday_morning(), &profile(&["Monday"]), None, None),
            Ok(())
        );
    }

    #[test]
    fn punch_in_on_non_working_day_names_allowed_days() {
        let err = validate_punch_in(tuesday_morning(), &profile(&["Monday"]), None, None)
            .unwrap_err();
        assert_eq!(
            err,
            PunchError::NotAWorkingDay {
                today: "Tuesday",
                allowed: "Monday".to_string()
            }
        );
        assert!(err.to_string().contains("Monday"));
    }

    #[test]
    fn weekday_is_taken_in_ist() {
        // Monday 20:00 UTC is already Tuesday 01:30 in IST
        let late = Utc.with_ymd_and_hms(2024, 4, 1, 20, 0, 0).unwrap();
        assert!(matches!(
            validate_punch_in(late, &profile(&["Monday"]), None, None),
            Err(PunchError::NotAWorkingDay { today: "Tuesday", .. })
        ));
    }

    #[test]
    fn punch_in_on_holiday() {
        let holiday = Holiday {
            date: ist_date(monday_morning()),
            name: "Holi".to_string(),
        };
        let err = validate_punch_in(monday_morning(), &profile(&["Monday"]), Some(&holiday), None)
            .unwrap_err();
        assert_eq!(
            err,
            PunchError::IsHoliday {
                name: "Holi".to_string()
            }
        );
    }

    #[test]
    fn second_punch_in_is_rejected() {
        let now = monday_morning();
        let existing = open(now);
        assert_eq!(
            validate_punch_in(now, &profile(&["Monday"]), None, Some(&existing)),
            Err(PunchError::AlreadyPunchedIn)
        );

        let mut closed = existing.clone();
        closed.punch_out_time = Some(now + chrono::Duration::hours(9));
        assert_eq!(
            validate_punch_in(now, &profile(&["Monday"]), None, Some(&closed)),
            Err(PunchError::AlreadyCompleted)
        );

        let mut leave = existing;
        leave.punch_in_time = None;
        leave.work_done = Some("ON_LEAVE".to_string());
        assert_eq!(
            validate_punch_in(now, &profile(&["Monday"]), None, Some(&leave)),
            Err(PunchError::OnLeave)
        );
    }

    #[test]
    fn punch_out_needs_open_record() {
        let now = monday_morning();
        assert_eq!(
            validate_punch_out(None, now),
            Err(PunchError::NoActiveAttendance)
        );

        let rec = open(now);
        let later = now + chrono::Duration::hours(8);
        assert_eq!(validate_punch_out(Some(&rec), later), Ok(now));
        assert_eq!(
            validate_punch_out(Some(&rec), now - chrono::Duration::minutes(1)),
            Err(PunchError::PunchOutBeforePunchIn)
        );

        let mut closed = rec;
        closed.punch_out_time = Some(later);
        assert_eq!(
            validate_punch_out(Some(&closed), later),
            Err(PunchError::NoActiveAttendance)
        );
    }

    #[test]
    fn lunch_transitions() {
        let now = monday_morning();
        let mut rec = open(now);
        assert_eq!(validate_lunch_start(Some(&rec)), Ok(()));
        assert_eq!(
            validate_lunch_end(Some(&rec)).unwrap_err(),
            PunchError::NoActiveLunchBreak
        );

        rec.lunch_breaks.push(LunchBreak {
            id: 3,
            attendance_id: rec.id,
            lunch_start_time: now,
            lunch_end_time: None,
            duration: None,
        });
        assert_eq!(
            validate_lunch_start(Some(&rec)),
            Err(PunchError::LunchAlreadyActive)
        );
        assert_eq!(validate_lunch_end(Some(&rec)).map(|b| b.id), Ok(3));

        assert_eq!(
            validate_lunch_start(None),
            Err(PunchError::NoActiveAttendance)
        );
    }

    #[test]
    fn work_done_cannot_impersonate_leave() {
        assert_eq!(validate_work_done(None), Ok(None));
        assert_eq!(validate_work_done(Some("   ")), Ok(None));
        assert_eq!(
            validate_work_done(Some(" fixed bug ")),
            Ok(Some("fixed bug".to_string()))
        );
        assert_eq!(
            validate_work_done(Some("ON_LEAVE tomorrow")),
            Err(PunchError::ReservedWorkDone)
        );
    }

    #[test]
    fn leave_needs_empty_day() {
        let now = monday_morning();
        let date = ist_date(now);
        assert_eq!(validate_leave(None, date), Ok(()));
        assert_eq!(
            validate_leave(Some(&open(now)), date),
            Err(PunchError::RecordExists { date })
        );
    }
}
