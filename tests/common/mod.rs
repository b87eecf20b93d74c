#![allow(dead_code)]

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use futures::FutureExt;
use futures::future::BoxFuture;
use jsonwebtoken::{EncodingKey, Header, encode};

use staff_attendance::auth::jwt::Claims;
use staff_attendance::calendar::{DateRange, FixedClock, ist};
use staff_attendance::config::Config;
use staff_attendance::model::attendance::{AttendanceRecord, LunchBreak, NewAttendance, PunchOut};
use staff_attendance::model::profile::{Holiday, StaffProfile};
use staff_attendance::model::role::Role;
use staff_attendance::store::{AttendanceStore, MemoryStore, StoreResult};

pub const SECRET: &str = "test-secret";
pub const STAFF_ID: u64 = 1000;
pub const OTHER_STAFF_ID: u64 = 1001;
pub const ADMIN_ID: u64 = 1;

/// Shared state behind one test app: in-memory store, movable clock, config.
pub struct TestContext {
    pub store: Arc<MemoryStore>,
    pub clock: Arc<FixedClock>,
    pub config: Config,
}

impl TestContext {
    /// Two weekday staff (09:00-18:00) and a holiday on Monday 2024-04-08.
    /// The clock starts on Tuesday 2024-04-02 09:00 IST.
    pub fn new() -> Self {
        let store = MemoryStore::new();
        store.insert_profile(weekday_profile(STAFF_ID, "Asha Rao"));
        store.insert_profile(weekday_profile(OTHER_STAFF_ID, "Vikram Das"));
        store.insert_holiday(Holiday {
            date: date(2024, 4, 8),
            name: "Founders Day".to_string(),
        });

        Self {
            store: Arc::new(store),
            clock: Arc::new(FixedClock::new(at_ist(2024, 4, 2, 9, 0))),
            config: Config {
                database_url: "mysql://unused".to_string(),
                jwt_secret: SECRET.to_string(),
                server_addr: "127.0.0.1:0".to_string(),
                rate_protected_per_min: 0,
                api_prefix: "/api".to_string(),
                log_dir: "logs".to_string(),
            },
        }
    }

    pub fn set_time(&self, instant: DateTime<Utc>) {
        self.clock.set(instant);
    }
}

pub fn weekday_profile(user_id: u64, name: &str) -> StaffProfile {
    StaffProfile {
        user_id,
        full_name: name.to_string(),
        working_days: ["Monday", "Tuesday", "Wednesday", "Thursday", "Friday"]
            .iter()
            .map(|d| d.to_string())
            .collect(),
        office_time_in: Some("09:00".to_string()),
        office_time_out: Some("18:00".to_string()),
        salary: 45000.0,
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// An IST wall-clock time as a UTC instant.
pub fn at_ist(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
    ist()
        .with_ymd_and_hms(y, m, d, h, min, 0)
        .unwrap()
        .with_timezone(&Utc)
}

/// A closed record worked from 09:00 IST for `hours`.
pub fn worked_day(user_id: u64, day: NaiveDate, hours: f64) -> AttendanceRecord {
    let punch_in = ist()
        .from_local_datetime(&day.and_hms_opt(9, 0, 0).unwrap())
        .unwrap()
        .with_timezone(&Utc);
    let punch_out = punch_in + chrono::Duration::minutes((hours * 60.0) as i64);
    AttendanceRecord {
        id: 0,
        user_id,
        date: day,
        punch_in_time: Some(punch_in),
        punch_out_time: Some(punch_out),
        punch_in_location: None,
        punch_out_location: None,
        working_hours: Some(hours),
        work_done: Some("Regular work".to_string()),
        lunch_breaks: Vec::new(),
    }
}

pub fn leave_day(user_id: u64, day: NaiveDate) -> AttendanceRecord {
    AttendanceRecord {
        id: 0,
        user_id,
        date: day,
        punch_in_time: None,
        punch_out_time: None,
        punch_in_location: None,
        punch_out_location: None,
        working_hours: None,
        work_done: Some("ON_LEAVE: family event".to_string()),
        lunch_breaks: Vec::new(),
    }
}

pub fn token(user_id: u64, role: Role) -> String {
    let claims = Claims {
        user_id,
        sub: format!("user{user_id}"),
        role: role as u8,
        exp: 4_102_444_800, // 2100-01-01
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .expect("encode token")
}

pub fn bearer(user_id: u64, role: Role) -> (&'static str, String) {
    ("Authorization", format!("Bearer {}", token(user_id, role)))
}

/// How [`StaleStore`] misreports a record to the handler.
#[derive(Clone, Copy)]
pub enum StaleView {
    /// The record looks missing, as if another request created it after the read.
    Missing,
    /// The record looks free of lunch breaks, as if one was opened after the read.
    WithoutLunch,
    /// The record looks open, as if it was punched out after the read.
    StillOpen,
}

/// Delegates to a [`MemoryStore`] but serves `find_record` from an older
/// snapshot, so writes run into state a concurrent request already changed.
pub struct StaleStore {
    pub inner: Arc<MemoryStore>,
    pub view: StaleView,
}

impl AttendanceStore for StaleStore {
    fn find_profile(&self, user_id: u64) -> BoxFuture<'_, StoreResult<Option<StaffProfile>>> {
        self.inner.find_profile(user_id)
    }

    fn list_profiles(&self) -> BoxFuture<'_, StoreResult<Vec<StaffProfile>>> {
        self.inner.list_profiles()
    }

    fn find_holiday(&self, date: NaiveDate) -> BoxFuture<'_, StoreResult<Option<Holiday>>> {
        self.inner.find_holiday(date)
    }

    fn list_holidays(&self, range: DateRange) -> BoxFuture<'_, StoreResult<Vec<Holiday>>> {
        self.inner.list_holidays(range)
    }

    fn find_record(
        &self,
        user_id: u64,
        date: NaiveDate,
    ) -> BoxFuture<'_, StoreResult<Option<AttendanceRecord>>> {
        let view = self.view;
        self.inner
            .find_record(user_id, date)
            .map(move |found| {
                found.map(|record| match view {
                    StaleView::Missing => None,
                    StaleView::WithoutLunch => record.map(|mut r| {
                        r.lunch_breaks.clear();
                        r
                    }),
                    StaleView::StillOpen => record.map(|mut r| {
                        r.punch_out_time = None;
                        r.working_hours = None;
                        r
                    }),
                })
            })
            .boxed()
    }

    fn list_records(
        &self,
        user_id: u64,
        range: DateRange,
    ) -> BoxFuture<'_, StoreResult<Vec<AttendanceRecord>>> {
        self.inner.list_records(user_id, range)
    }

    fn list_records_on(&self, date: NaiveDate) -> BoxFuture<'_, StoreResult<Vec<AttendanceRecord>>> {
        self.inner.list_records_on(date)
    }

    fn create_record(&self, new: NewAttendance) -> BoxFuture<'_, StoreResult<AttendanceRecord>> {
        self.inner.create_record(new)
    }

    fn close_record(&self, record_id: u64, punch_out: PunchOut) -> BoxFuture<'_, StoreResult<bool>> {
        self.inner.close_record(record_id, punch_out)
    }

    fn start_lunch(
        &self,
        record_id: u64,
        start: DateTime<Utc>,
    ) -> BoxFuture<'_, StoreResult<Option<LunchBreak>>> {
        self.inner.start_lunch(record_id, start)
    }

    fn end_lunch(
        &self,
        lunch_id: u64,
        end: DateTime<Utc>,
        duration: i64,
    ) -> BoxFuture<'_, StoreResult<bool>> {
        self.inner.end_lunch(lunch_id, end, duration)
    }

    fn delete_record(&self, user_id: u64, record_id: u64) -> BoxFuture<'_, StoreResult<bool>> {
        self.inner.delete_record(user_id, record_id)
    }
}

/// An open record punched in at 09:00 IST.
pub fn open_day(user_id: u64, day: NaiveDate) -> AttendanceRecord {
    let mut record = worked_day(user_id, day, 0.0);
    record.punch_out_time = None;
    record.working_hours = None;
    record.work_done = None;
    record
}
