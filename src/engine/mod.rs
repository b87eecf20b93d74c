//! Attendance status engine: pure derivations over attendance records.

pub mod error;
pub mod hours;
pub mod statistics;
pub mod status;
pub mod validation;

pub use error::PunchError;
pub use hours::{compute_working_hours, lunch_duration_minutes, round2};
pub use statistics::{Statistics, compute_expected_statistics};
pub use status::{AttendanceStatus, DailyStatus, derive_daily_status};
pub use validation::{
    validate_leave, validate_lunch_end, validate_lunch_start, validate_punch_in,
    validate_punch_out, validate_work_done,
};
