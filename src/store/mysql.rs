use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use futures::future::BoxFuture;
use sqlx::{FromRow, MySqlPool};
use tracing::debug;

use super::{AttendanceStore, StoreResult};
use crate::calendar::DateRange;
use crate::model::attendance::{AttendanceRecord, GeoPoint, LunchBreak, NewAttendance, PunchOut};
use crate::model::profile::{Holiday, StaffProfile};

const ATTENDANCE_COLUMNS: &str = r#"
    id, user_id, date, punch_in_time, punch_out_time,
    punch_in_lat, punch_in_lng, punch_out_lat, punch_out_lng,
    working_hours, work_done
"#;

#[derive(FromRow)]
struct AttendanceRow {
    id: u64,
    user_id: u64,
    date: NaiveDate,
    punch_in_time: Option<DateTime<Utc>>,
    punch_out_time: Option<DateTime<Utc>>,
    punch_in_lat: Option<f64>,
    punch_in_lng: Option<f64>,
    punch_out_lat: Option<f64>,
    punch_out_lng: Option<f64>,
    working_hours: Option<f64>,
    work_done: Option<String>,
}

impl AttendanceRow {
    fn into_record(self, lunch_breaks: Vec<LunchBreak>) -> AttendanceRecord {
        AttendanceRecord {
            id: self.id,
            user_id: self.user_id,
            date: self.date,
            punch_in_time: self.punch_in_time,
            punch_out_time: self.punch_out_time,
            punch_in_location: geo(self.punch_in_lat, self.punch_in_lng),
            punch_out_location: geo(self.punch_out_lat, self.punch_out_lng),
            working_hours: self.working_hours,
            work_done: self.work_done,
            lunch_breaks,
        }
    }
}

#[derive(FromRow)]
struct LunchRow {
    id: u64,
    attendance_id: u64,
    lunch_start_time: DateTime<Utc>,
    lunch_end_time: Option<DateTime<Utc>>,
    duration: Option<i32>,
}

impl From<LunchRow> for LunchBreak {
    fn from(row: LunchRow) -> Self {
        LunchBreak {
            id: row.id,
            attendance_id: row.attendance_id,
            lunch_start_time: row.lunch_start_time,
            lunch_end_time: row.lunch_end_time,
            duration: row.duration.map(i64::from),
        }
    }
}

#[derive(FromRow)]
struct ProfileRow {
    user_id: u64,
    full_name: String,
    /// Comma-separated weekday names.
    working_days: Option<String>,
    office_time_in: Option<String>,
    office_time_out: Option<String>,
    salary: Option<f64>,
}

impl From<ProfileRow> for StaffProfile {
    fn from(row: ProfileRow) -> Self {
        StaffProfile {
            user_id: row.user_id,
            full_name: row.full_name,
            working_days: row
                .working_days
                .unwrap_or_default()
                .split(',')
                .map(str::trim)
                .filter(|d| !d.is_empty())
                .map(str::to_string)
                .collect(),
            office_time_in: row.office_time_in,
            office_time_out: row.office_time_out,
            salary: row.salary.unwrap_or(0.0),
        }
    }
}

#[derive(FromRow)]
struct HolidayRow {
    date: NaiveDate,
    name: String,
}

fn geo(lat: Option<f64>, lng: Option<f64>) -> Option<GeoPoint> {
    Some(GeoPoint {
        latitude: lat?,
        longitude: lng?,
    })
}

/// MySQL-backed store. Relies on a unique key over `attendance(user_id, date)`
/// and on `lunch_breaks.attendance_id` referencing `attendance.id`.
#[derive(Clone)]
pub struct MySqlStore {
    pool: MySqlPool,
}

impl MySqlStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    async fn attach_lunch_breaks(
        &self,
        rows: Vec<AttendanceRow>,
    ) -> StoreResult<Vec<AttendanceRecord>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = vec!["?"; rows.len()].join(", ");
        let sql = format!(
            r#"
            SELECT id, attendance_id, lunch_start_time, lunch_end_time, duration
            FROM lunch_breaks
            WHERE attendance_id IN ({})
            ORDER BY lunch_start_time ASC
            "#,
            placeholders
        );
        debug!(sql = %sql, records = rows.len(), "Fetching lunch breaks");

        let mut query = sqlx::query_as::<_, LunchRow>(&sql);
        for row in &rows {
            query = query.bind(row.id);
        }
        let lunch_rows = query.fetch_all(&self.pool).await?;

        let mut by_record: HashMap<u64, Vec<LunchBreak>> = HashMap::new();
        for lunch in lunch_rows {
            by_record
                .entry(lunch.attendance_id)
                .or_default()
                .push(lunch.into());
        }

        Ok(rows
            .into_iter()
            .map(|row| {
                let breaks = by_record.remove(&row.id).unwrap_or_default();
                row.into_record(breaks)
            })
            .collect())
    }
}

impl AttendanceStore for MySqlStore {
    fn find_profile(&self, user_id: u64) -> BoxFuture<'_, StoreResult<Option<StaffProfile>>> {
        Box::pin(async move {
            let row = sqlx::query_as::<_, ProfileRow>(
                r#"
                SELECT user_id, full_name, working_days, office_time_in, office_time_out, salary
                FROM staff_profiles
                WHERE user_id = ?
                "#,
            )
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
            Ok(row.map(StaffProfile::from))
        })
    }

    fn list_profiles(&self) -> BoxFuture<'_, StoreResult<Vec<StaffProfile>>> {
        Box::pin(async move {
            let rows = sqlx::query_as::<_, ProfileRow>(
                r#"
                SELECT user_id, full_name, working_days, office_time_in, office_time_out, salary
                FROM staff_profiles
                ORDER BY full_name ASC
                "#,
            )
            .fetch_all(&self.pool)
            .await?;
            Ok(rows.into_iter().map(StaffProfile::from).collect())
        })
    }

    fn find_holiday(&self, date: NaiveDate) -> BoxFuture<'_, StoreResult<Option<Holiday>>> {
        Box::pin(async move {
            let row = sqlx::query_as::<_, HolidayRow>(
                "SELECT date, name FROM holidays WHERE date = ? LIMIT 1",
            )
            .bind(date)
            .fetch_optional(&self.pool)
            .await?;
            Ok(row.map(|h| Holiday {
                date: h.date,
                name: h.name,
            }))
        })
    }

    fn list_holidays(&self, range: DateRange) -> BoxFuture<'_, StoreResult<Vec<Holiday>>> {
        Box::pin(async move {
            let rows = sqlx::query_as::<_, HolidayRow>(
                "SELECT date, name FROM holidays WHERE date BETWEEN ? AND ? ORDER BY date ASC",
            )
            .bind(range.start)
            .bind(range.end)
            .fetch_all(&self.pool)
            .await?;
            Ok(rows
                .into_iter()
                .map(|h| Holiday {
                    date: h.date,
                    name: h.name,
                })
                .collect())
        })
    }

    fn find_record(
        &self,
        user_id: u64,
        date: NaiveDate,
    ) -> BoxFuture<'_, StoreResult<Option<AttendanceRecord>>> {
        Box::pin(async move {
            let sql = format!(
                "SELECT {} FROM attendance WHERE user_id = ? AND date = ?",
                ATTENDANCE_COLUMNS
            );
            let row = sqlx::query_as::<_, AttendanceRow>(&sql)
                .bind(user_id)
                .bind(date)
                .fetch_optional(&self.pool)
                .await?;

            match row {
                Some(row) => Ok(self.attach_lunch_breaks(vec![row]).await?.pop()),
                None => Ok(None),
            }
        })
    }

    fn list_records(
        &self,
        user_id: u64,
        range: DateRange,
    ) -> BoxFuture<'_, StoreResult<Vec<AttendanceRecord>>> {
        Box::pin(async move {
            let sql = format!(
                "SELECT {} FROM attendance WHERE user_id = ? AND date BETWEEN ? AND ? ORDER BY date ASC",
                ATTENDANCE_COLUMNS
            );
            let rows = sqlx::query_as::<_, AttendanceRow>(&sql)
                .bind(user_id)
                .bind(range.start)
                .bind(range.end)
                .fetch_all(&self.pool)
                .await?;
            self.attach_lunch_breaks(rows).await
        })
    }

    fn list_records_on(&self, date: NaiveDate) -> BoxFuture<'_, StoreResult<Vec<AttendanceRecord>>> {
        Box::pin(async move {
            let sql = format!(
                "SELECT {} FROM attendance WHERE date = ? ORDER BY user_id ASC",
                ATTENDANCE_COLUMNS
            );
            let rows = sqlx::query_as::<_, AttendanceRow>(&sql)
                .bind(date)
                .fetch_all(&self.pool)
                .await?;
            self.attach_lunch_breaks(rows).await
        })
    }

    fn create_record(&self, new: NewAttendance) -> BoxFuture<'_, StoreResult<AttendanceRecord>> {
        Box::pin(async move {
            let result = sqlx::query(
                r#"
                INSERT INTO attendance (user_id, date, punch_in_time, punch_in_lat, punch_in_lng, work_done)
                VALUES (?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(new.user_id)
            .bind(new.date)
            .bind(new.punch_in_time)
            .bind(new.punch_in_location.map(|g| g.latitude))
            .bind(new.punch_in_location.map(|g| g.longitude))
            .bind(new.work_done.as_deref())
            .execute(&self.pool)
            .await?;

            Ok(AttendanceRecord {
                id: result.last_insert_id(),
                user_id: new.user_id,
                date: new.date,
                punch_in_time: new.punch_in_time,
                punch_out_time: None,
                punch_in_location: new.punch_in_location,
                punch_out_location: None,
                working_hours: None,
                work_done: new.work_done,
                lunch_breaks: Vec::new(),
            })
        })
    }

    fn close_record(&self, record_id: u64, punch_out: PunchOut) -> BoxFuture<'_, StoreResult<bool>> {
        Box::pin(async move {
            let result = sqlx::query(
                r#"
                UPDATE attendance
                SET punch_out_time = ?, punch_out_lat = ?, punch_out_lng = ?,
                    working_hours = ?, work_done = ?
                WHERE id = ?
                AND punch_out_time IS NULL
                "#,
            )
            .bind(punch_out.punch_out_time)
            .bind(punch_out.punch_out_location.map(|g| g.latitude))
            .bind(punch_out.punch_out_location.map(|g| g.longitude))
            .bind(punch_out.working_hours)
            .bind(punch_out.work_done.as_deref())
            .bind(record_id)
            .execute(&self.pool)
            .await?;
            Ok(result.rows_affected() > 0)
        })
    }

    fn start_lunch(
        &self,
        record_id: u64,
        start: DateTime<Utc>,
    ) -> BoxFuture<'_, StoreResult<Option<LunchBreak>>> {
        Box::pin(async move {
            let mut tx = self.pool.begin().await?;

            // row lock serializes lunch starts and punch-outs on this record
            let open: Option<(u64,)> = sqlx::query_as(
                "SELECT id FROM attendance WHERE id = ? AND punch_out_time IS NULL FOR UPDATE",
            )
            .bind(record_id)
            .fetch_optional(&mut *tx)
            .await?;

            let active: Option<(u64,)> = sqlx::query_as(
                "SELECT id FROM lunch_breaks WHERE attendance_id = ? AND lunch_end_time IS NULL LIMIT 1",
            )
            .bind(record_id)
            .fetch_optional(&mut *tx)
            .await?;

            if open.is_none() || active.is_some() {
                tx.rollback().await?;
                return Ok(None);
            }

            let result = sqlx::query(
                "INSERT INTO lunch_breaks (attendance_id, lunch_start_time) VALUES (?, ?)",
            )
            .bind(record_id)
            .bind(start)
            .execute(&mut *tx)
            .await?;

            tx.commit().await?;

            Ok(Some(LunchBreak {
                id: result.last_insert_id(),
                attendance_id: record_id,
                lunch_start_time: start,
                lunch_end_time: None,
                duration: None,
            }))
        })
    }

    fn end_lunch(
        &self,
        lunch_id: u64,
        end: DateTime<Utc>,
        duration: i64,
    ) -> BoxFuture<'_, StoreResult<bool>> {
        Box::pin(async move {
            let result = sqlx::query(
                r#"
                UPDATE lunch_breaks
                SET lunch_end_time = ?, duration = ?
                WHERE id = ?
                AND lunch_end_time IS NULL
                "#,
            )
            .bind(end)
            .bind(duration)
            .bind(lunch_id)
            .execute(&self.pool)
            .await?;
            Ok(result.rows_affected() > 0)
        })
    }

    fn delete_record(&self, user_id: u64, record_id: u64) -> BoxFuture<'_, StoreResult<bool>> {
        Box::pin(async move {
            let mut tx = self.pool.begin().await?;

            sqlx::query(
                r#"
                DELETE lb FROM lunch_breaks lb
                JOIN attendance a ON a.id = lb.attendance_id
                WHERE a.id = ? AND a.user_id = ?
                "#,
            )
            .bind(record_id)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

            let result = sqlx::query("DELETE FROM attendance WHERE id = ? AND user_id = ?")
                .bind(record_id)
                .bind(user_id)
                .execute(&mut *tx)
                .await?;

            tx.commit().await?;
            Ok(result.rows_affected() > 0)
        })
    }
}
