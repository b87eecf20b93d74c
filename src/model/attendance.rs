use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Leading marker on `work_done` that turns a record into a leave day.
pub const LEAVE_SENTINEL: &str = "ON_LEAVE";

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct GeoPoint {
    #[schema(example = 23.8103)]
    pub latitude: f64,
    #[schema(example = 90.4125)]
    pub longitude: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct LunchBreak {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = 10)]
    pub attendance_id: u64,
    #[schema(example = "2026-01-05T07:30:00Z", format = "date-time", value_type = String)]
    pub lunch_start_time: DateTime<Utc>,
    #[schema(example = "2026-01-05T08:00:00Z", format = "date-time", value_type = String, nullable = true)]
    pub lunch_end_time: Option<DateTime<Utc>>,
    /// Minutes, stored when the break ends.
    #[schema(example = 30, nullable = true)]
    pub duration: Option<i64>,
}

impl LunchBreak {
    pub fn is_active(&self) -> bool {
        self.lunch_end_time.is_none()
    }
}

/// One staff member's attendance for one IST calendar day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AttendanceRecord {
    #[schema(example = 10)]
    pub id: u64,
    #[schema(example = 1000)]
    pub user_id: u64,
    #[schema(example = "2026-01-05", format = "date", value_type = String)]
    pub date: NaiveDate,
    #[schema(example = "2026-01-05T03:30:00Z", format = "date-time", value_type = String, nullable = true)]
    pub punch_in_time: Option<DateTime<Utc>>,
    #[schema(example = "2026-01-05T12:30:00Z", format = "date-time", value_type = String, nullable = true)]
    pub punch_out_time: Option<DateTime<Utc>>,
    pub punch_in_location: Option<GeoPoint>,
    pub punch_out_location: Option<GeoPoint>,
    /// Gross hours between punch-in and punch-out, stored at punch-out.
    #[schema(example = 9.0, nullable = true)]
    pub working_hours: Option<f64>,
    #[schema(example = "Reviewed ticket backlog", nullable = true)]
    pub work_done: Option<String>,
    pub lunch_breaks: Vec<LunchBreak>,
}

impl AttendanceRecord {
    pub fn work_entry(&self) -> Option<WorkDone> {
        self.work_done.as_deref().map(WorkDone::parse)
    }

    pub fn is_leave(&self) -> bool {
        matches!(self.work_entry(), Some(WorkDone::Leave { .. }))
    }

    pub fn is_punched_in(&self) -> bool {
        self.punch_in_time.is_some() && self.punch_out_time.is_none()
    }

    pub fn is_completed(&self) -> bool {
        self.punch_in_time.is_some() && self.punch_out_time.is_some()
    }

    pub fn active_lunch_break(&self) -> Option<&LunchBreak> {
        self.lunch_breaks.iter().find(|b| b.is_active())
    }
}

/// Typed view of the free-text `work_done` column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkDone {
    Leave { reason: Option<String> },
    Worked(String),
}

impl WorkDone {
    pub fn parse(text: &str) -> Self {
        match text.strip_prefix(LEAVE_SENTINEL) {
            Some(rest) => {
                let reason = rest.trim_start_matches(':').trim();
                WorkDone::Leave {
                    reason: (!reason.is_empty()).then(|| reason.to_string()),
                }
            }
            None => WorkDone::Worked(text.to_string()),
        }
    }

    /// Storage form; leave becomes `ON_LEAVE` or `ON_LEAVE: <reason>`.
    pub fn encode(&self) -> String {
        match self {
            WorkDone::Leave { reason: Some(reason) } => format!("{LEAVE_SENTINEL}: {reason}"),
            WorkDone::Leave { reason: None } => LEAVE_SENTINEL.to_string(),
            WorkDone::Worked(text) => text.clone(),
        }
    }
}

/// Fields needed to create a record, either at punch-in or when marking leave.
#[derive(Debug, Clone)]
pub struct NewAttendance {
    pub user_id: u64,
    pub date: NaiveDate,
    pub punch_in_time: Option<DateTime<Utc>>,
    pub punch_in_location: Option<GeoPoint>,
    pub work_done: Option<String>,
}

/// Fields written when a record is closed at punch-out.
#[derive(Debug, Clone)]
pub struct PunchOut {
    pub punch_out_time: DateTime<Utc>,
    pub punch_out_location: Option<GeoPoint>,
    pub working_hours: f64,
    pub work_done: Option<String>,
}
