use chrono::NaiveDate;
use derive_more::Display;
use strum::IntoStaticStr;

/// Business-rule violations for attendance actions. Every variant is
/// something the staff member can fix; none of them are retried.
#[derive(Debug, Clone, PartialEq, Display, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum PunchError {
    #[display(
        fmt = "{} is not one of your working days. Allowed days: {}",
        today,
        allowed
    )]
    NotAWorkingDay { today: &'static str, allowed: String },

    #[display(fmt = "Today is a holiday ({}). Punch-in is not allowed", name)]
    IsHoliday { name: String },

    #[display(fmt = "You have already punched in today")]
    AlreadyPunchedIn,

    #[display(fmt = "Attendance for today is already completed")]
    AlreadyCompleted,

    #[display(fmt = "You are marked on leave today")]
    OnLeave,

    #[display(fmt = "No active attendance found for today")]
    NoActiveAttendance,

    #[display(fmt = "No active lunch break found")]
    NoActiveLunchBreak,

    #[display(fmt = "A lunch break is already in progress")]
    LunchAlreadyActive,

    #[display(fmt = "Punch-out time cannot be earlier than punch-in time")]
    PunchOutBeforePunchIn,

    #[display(fmt = "Work done notes cannot start with ON_LEAVE")]
    ReservedWorkDone,

    #[display(fmt = "An attendance record already exists for {}", date)]
    RecordExists { date: NaiveDate },
}

impl PunchError {
    /// Stable snake_case code, e.g. `already_punched_in`.
    pub fn code(&self) -> &'static str {
        self.into()
    }
}

impl std::error::Error for PunchError {}
