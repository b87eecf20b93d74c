//! Storage collaborator for attendance data.
//!
//! The engine never touches storage; handlers load what it needs through
//! [`AttendanceStore`] and persist what it derives. Backends must enforce at
//! most one attendance record per (user, date) and report a violation as
//! [`StoreError::Duplicate`].

use chrono::{DateTime, NaiveDate, Utc};
use derive_more::Display;
use futures::future::BoxFuture;

use crate::calendar::DateRange;
use crate::model::attendance::{AttendanceRecord, LunchBreak, NewAttendance, PunchOut};
use crate::model::profile::{Holiday, StaffProfile};

pub mod memory;
pub mod mysql;

pub use memory::MemoryStore;
pub use mysql::MySqlStore;

#[derive(Debug, Display)]
pub enum StoreError {
    #[display(fmt = "Duplicate attendance record")]
    Duplicate,
    #[display(fmt = "Database error: {}", _0)]
    Database(sqlx::Error),
}

impl std::error::Error for StoreError {}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &e {
            // the (user_id, date) key
            if db_err.is_unique_violation() {
                return StoreError::Duplicate;
            }
        }
        StoreError::Database(e)
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

pub trait AttendanceStore: Send + Sync {
    fn find_profile(&self, user_id: u64) -> BoxFuture<'_, StoreResult<Option<StaffProfile>>>;

    fn list_profiles(&self) -> BoxFuture<'_, StoreResult<Vec<StaffProfile>>>;

    fn find_holiday(&self, date: NaiveDate) -> BoxFuture<'_, StoreResult<Option<Holiday>>>;

    fn list_holidays(&self, range: DateRange) -> BoxFuture<'_, StoreResult<Vec<Holiday>>>;

    /// The user's record for one date, lunch breaks included.
    fn find_record(
        &self,
        user_id: u64,
        date: NaiveDate,
    ) -> BoxFuture<'_, StoreResult<Option<AttendanceRecord>>>;

    /// The user's records inside `range`, ordered by date.
    fn list_records(
        &self,
        user_id: u64,
        range: DateRange,
    ) -> BoxFuture<'_, StoreResult<Vec<AttendanceRecord>>>;

    /// Every user's record for one date.
    fn list_records_on(&self, date: NaiveDate) -> BoxFuture<'_, StoreResult<Vec<AttendanceRecord>>>;

    fn create_record(&self, new: NewAttendance) -> BoxFuture<'_, StoreResult<AttendanceRecord>>;

    /// Closes a record that has no punch-out yet. `false` when nothing matched.
    fn close_record(&self, record_id: u64, punch_out: PunchOut) -> BoxFuture<'_, StoreResult<bool>>;

    /// Opens a break on a record that is not punched out and has no active
    /// break. `None` when either condition fails at write time.
    fn start_lunch(
        &self,
        record_id: u64,
        start: DateTime<Utc>,
    ) -> BoxFuture<'_, StoreResult<Option<LunchBreak>>>;

    /// Ends an active break. `false` when it was already ended or is missing.
    fn end_lunch(
        &self,
        lunch_id: u64,
        end: DateTime<Utc>,
        duration: i64,
    ) -> BoxFuture<'_, StoreResult<bool>>;

    /// Removes a record owned by `user_id` together with its lunch breaks.
    fn delete_record(&self, user_id: u64, record_id: u64) -> BoxFuture<'_, StoreResult<bool>>;
}
