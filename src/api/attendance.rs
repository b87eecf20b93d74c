use std::collections::{HashMap, HashSet};

use crate::api::error::ApiError;
use crate::auth::auth::AuthUser;
use crate::calendar::{Clock, DateRange, ist_date};
use crate::engine::statistics::is_expected_working_day;
use crate::engine::{
    DailyStatus, PunchError, Statistics, compute_expected_statistics, compute_working_hours,
    derive_daily_status, lunch_duration_minutes, validate_leave, validate_lunch_end,
    validate_lunch_start, validate_punch_in, validate_punch_out, validate_work_done,
};
use crate::model::attendance::{AttendanceRecord, GeoPoint, NewAttendance, PunchOut, WorkDone};
use crate::model::profile::StaffProfile;
use crate::store::{AttendanceStore, StoreError};
use actix_web::{HttpResponse, web};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, ToSchema, Default)]
pub struct PunchInRequest {
    #[serde(default)]
    pub location: Option<GeoPoint>,
}

#[derive(Deserialize, ToSchema, Default)]
pub struct PunchOutRequest {
    #[serde(default)]
    pub location: Option<GeoPoint>,
    #[schema(example = "Closed tickets #41 and #42")]
    #[serde(default)]
    pub work_done: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct LeaveRequest {
    /// Defaults to today (IST)
    #[schema(example = "2026-01-07", format = "date", value_type = String, nullable = true)]
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[schema(example = "doctor visit")]
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct MonthQuery {
    /// Month as YYYY-MM, defaults to the current month (IST)
    #[schema(example = "2026-01")]
    pub month: Option<String>,
}

/// One day's record with its derived status.
#[derive(Serialize, ToSchema)]
pub struct AttendanceResponse {
    #[schema(example = "2026-01-05", format = "date", value_type = String)]
    pub date: NaiveDate,
    pub summary: DailyStatus,
    pub record: Option<AttendanceRecord>,
}

impl AttendanceResponse {
    fn new(date: NaiveDate, record: Option<AttendanceRecord>, is_today: bool) -> Self {
        Self {
            date,
            summary: derive_daily_status(record.as_ref(), is_today),
            record,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct HistoryDay {
    #[schema(example = "2026-01-05", format = "date", value_type = String)]
    pub date: NaiveDate,
    pub is_working_day: bool,
    #[schema(example = "Republic Day", nullable = true)]
    pub holiday: Option<String>,
    pub summary: DailyStatus,
    pub record: Option<AttendanceRecord>,
}

#[derive(Serialize, ToSchema)]
pub struct MonthReport {
    #[schema(example = 1000)]
    pub user_id: u64,
    #[schema(example = "Asha Rao")]
    pub full_name: String,
    #[schema(example = "2026-01")]
    pub month: String,
    pub days: Vec<HistoryDay>,
    pub statistics: Statistics,
}

pub(crate) async fn load_profile(
    store: &dyn AttendanceStore,
    user_id: u64,
) -> Result<StaffProfile, ApiError> {
    store
        .find_profile(user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Staff profile not found".to_string()))
}

pub(crate) fn month_range(month: Option<&str>, today: NaiveDate) -> Result<DateRange, ApiError> {
    match month {
        Some(m) => Ok(DateRange::from_month(m)?),
        None => Ok(DateRange::month_of(today)),
    }
}

/// Day-by-day statuses and statistics of one staff member over `range`.
pub(crate) async fn build_month_report(
    store: &dyn AttendanceStore,
    profile: StaffProfile,
    range: DateRange,
    today: NaiveDate,
) -> Result<MonthReport, ApiError> {
    let records = store.list_records(profile.user_id, range).await?;
    let holidays = store.list_holidays(range).await?;

    let statistics = compute_expected_statistics(&records, &profile, &holidays, range);

    let holiday_dates: HashSet<NaiveDate> = holidays.iter().map(|h| h.date).collect();
    let holiday_names: HashMap<NaiveDate, &str> =
        holidays.iter().map(|h| (h.date, h.name.as_str())).collect();
    let mut by_date: HashMap<NaiveDate, AttendanceRecord> =
        records.into_iter().map(|r| (r.date, r)).collect();

    let days = range
        .days()
        .map(|date| {
            let record = by_date.remove(&date);
            HistoryDay {
                date,
                is_working_day: is_expected_working_day(date, &profile, &holiday_dates),
                holiday: holiday_names.get(&date).map(|n| n.to_string()),
                summary: derive_daily_status(record.as_ref(), date == today),
                record,
            }
        })
        .collect();

    Ok(MonthReport {
        user_id: profile.user_id,
        full_name: profile.full_name,
        month: range.label(),
        days,
        statistics,
    })
}

fn rejected(user_id: u64, action: &'static str) -> impl FnOnce(PunchError) -> ApiError {
    move |e| {
        info!(user_id, action, code = e.code(), "Attendance action rejected");
        ApiError::Punch(e)
    }
}

/// Punch in for today
#[utoipa::path(
    post,
    path = "/api/attendance/punch-in",
    request_body = PunchInRequest,
    responses(
        (status = 201, description = "Punched in", body = AttendanceResponse),
        (status = 400, description = "Not a working day, holiday, or already punched in", body = Object, example = json!({
            "code": "already_punched_in",
            "message": "You have already punched in today"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Staff profile not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn punch_in(
    auth: AuthUser,
    store: web::Data<dyn AttendanceStore>,
    clock: web::Data<dyn Clock>,
    payload: web::Json<PunchInRequest>,
) -> Result<HttpResponse, ApiError> {
    let now = clock.now();
    let today = ist_date(now);
    let store = store.get_ref();

    let profile = load_profile(store, auth.user_id).await?;
    let holiday = store.find_holiday(today).await?;
    let existing = store.find_record(auth.user_id, today).await?;

    validate_punch_in(now, &profile, holiday.as_ref(), existing.as_ref())
        .map_err(rejected(auth.user_id, "punch_in"))?;

    let new = NewAttendance {
        user_id: auth.user_id,
        date: today,
        punch_in_time: Some(now),
        punch_in_location: payload.location,
        work_done: None,
    };

    let record = match store.create_record(new).await {
        Ok(record) => record,
        // lost a race with a concurrent punch-in
        Err(StoreError::Duplicate) => {
            warn!(user_id = auth.user_id, date = %today, "Concurrent punch-in rejected by store");
            return Err(PunchError::AlreadyPunchedIn.into());
        }
        Err(e) => return Err(e.into()),
    };

    info!(user_id = auth.user_id, date = %today, record_id = record.id, "Punched in");

    Ok(HttpResponse::Created().json(AttendanceResponse::new(today, Some(record), true)))
}

/// Punch out for today
#[utoipa::path(
    post,
    path = "/api/attendance/punch-out",
    request_body = PunchOutRequest,
    responses(
        (status = 200, description = "Punched out", body = AttendanceResponse),
        (status = 400, description = "No active attendance for today", body = Object, example = json!({
            "code": "no_active_attendance",
            "message": "No active attendance found for today"
        })),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn punch_out(
    auth: AuthUser,
    store: web::Data<dyn AttendanceStore>,
    clock: web::Data<dyn Clock>,
    payload: web::Json<PunchOutRequest>,
) -> Result<HttpResponse, ApiError> {
    let now = clock.now();
    let today = ist_date(now);
    let store = store.get_ref();
    let reject = || rejected(auth.user_id, "punch_out");

    let record = store.find_record(auth.user_id, today).await?;
    let punch_in = validate_punch_out(record.as_ref(), now).map_err(reject())?;
    let work_done = validate_work_done(payload.work_done.as_deref()).map_err(reject())?;
    let record = record.ok_or(PunchError::NoActiveAttendance)?;

    let working_hours = compute_working_hours(punch_in, now);
    let closed = store
        .close_record(
            record.id,
            PunchOut {
                punch_out_time: now,
                punch_out_location: payload.location,
                working_hours,
                work_done,
            },
        )
        .await?;

    if !closed {
        return Err(PunchError::NoActiveAttendance.into());
    }

    // an open lunch break ends with the day
    if let Some(active) = record.active_lunch_break() {
        let duration = lunch_duration_minutes(active.lunch_start_time, now);
        store.end_lunch(active.id, now, duration).await?;
        debug!(user_id = auth.user_id, lunch_id = active.id, duration, "Closed lunch break at punch-out");
    }

    info!(user_id = auth.user_id, date = %today, working_hours, "Punched out");

    let record = store.find_record(auth.user_id, today).await?;
    Ok(HttpResponse::Ok().json(AttendanceResponse::new(today, record, true)))
}

/// Start a lunch break
#[utoipa::path(
    post,
    path = "/api/attendance/lunch/start",
    responses(
        (status = 201, description = "Lunch break started", body = AttendanceResponse),
        (status = 400, description = "Not punched in, or already on a break"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn start_lunch(
    auth: AuthUser,
    store: web::Data<dyn AttendanceStore>,
    clock: web::Data<dyn Clock>,
) -> Result<HttpResponse, ApiError> {
    let now = clock.now();
    let today = ist_date(now);
    let store = store.get_ref();

    let record = store.find_record(auth.user_id, today).await?;
    validate_lunch_start(record.as_ref()).map_err(rejected(auth.user_id, "lunch_start"))?;
    let record = record.ok_or(PunchError::NoActiveAttendance)?;

    let Some(lunch) = store.start_lunch(record.id, now).await? else {
        // a concurrent request closed the record or opened a break first
        let current = store.find_record(auth.user_id, today).await?;
        validate_lunch_start(current.as_ref()).map_err(rejected(auth.user_id, "lunch_start"))?;
        return Err(PunchError::LunchAlreadyActive.into());
    };
    info!(user_id = auth.user_id, lunch_id = lunch.id, "Lunch break started");

    let record = store.find_record(auth.user_id, today).await?;
    Ok(HttpResponse::Created().json(AttendanceResponse::new(today, record, true)))
}

/// End the active lunch break
#[utoipa::path(
    post,
    path = "/api/attendance/lunch/end",
    responses(
        (status = 200, description = "Lunch break ended", body = AttendanceResponse),
        (status = 400, description = "No active lunch break", body = Object, example = json!({
            "code": "no_active_lunch_break",
            "message": "No active lunch break found"
        })),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn end_lunch(
    auth: AuthUser,
    store: web::Data<dyn AttendanceStore>,
    clock: web::Data<dyn Clock>,
) -> Result<HttpResponse, ApiError> {
    let now = clock.now();
    let today = ist_date(now);
    let store = store.get_ref();

    let record = store.find_record(auth.user_id, today).await?;
    let active = validate_lunch_end(record.as_ref()).map_err(rejected(auth.user_id, "lunch_end"))?;

    let duration = lunch_duration_minutes(active.lunch_start_time, now);
    if !store.end_lunch(active.id, now, duration).await? {
        return Err(PunchError::NoActiveLunchBreak.into());
    }
    info!(user_id = auth.user_id, lunch_id = active.id, duration, "Lunch break ended");

    let record = store.find_record(auth.user_id, today).await?;
    Ok(HttpResponse::Ok().json(AttendanceResponse::new(today, record, true)))
}

/// Mark a day as leave
#[utoipa::path(
    post,
    path = "/api/attendance/leave",
    request_body = LeaveRequest,
    responses(
        (status = 201, description = "Leave recorded", body = AttendanceResponse),
        (status = 400, description = "A record already exists for that date"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn mark_leave(
    auth: AuthUser,
    store: web::Data<dyn AttendanceStore>,
    clock: web::Data<dyn Clock>,
    payload: web::Json<LeaveRequest>,
) -> Result<HttpResponse, ApiError> {
    let today = ist_date(clock.now());
    let date = payload.date.unwrap_or(today);
    let store = store.get_ref();

    let existing = store.find_record(auth.user_id, date).await?;
    validate_leave(existing.as_ref(), date).map_err(rejected(auth.user_id, "leave"))?;

    let reason = payload
        .reason
        .as_deref()
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .map(str::to_string);

    let new = NewAttendance {
        user_id: auth.user_id,
        date,
        punch_in_time: None,
        punch_in_location: None,
        work_done: Some(WorkDone::Leave { reason }.encode()),
    };

    let record = match store.create_record(new).await {
        Ok(record) => record,
        Err(StoreError::Duplicate) => return Err(PunchError::RecordExists { date }.into()),
        Err(e) => return Err(e.into()),
    };

    info!(user_id = auth.user_id, date = %date, "Leave recorded");

    Ok(HttpResponse::Created().json(AttendanceResponse::new(date, Some(record), date == today)))
}

/// Today's attendance status
#[utoipa::path(
    get,
    path = "/api/attendance/today",
    responses(
        (status = 200, description = "Today's status", body = AttendanceResponse),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn today_status(
    auth: AuthUser,
    store: web::Data<dyn AttendanceStore>,
    clock: web::Data<dyn Clock>,
) -> Result<HttpResponse, ApiError> {
    let today = ist_date(clock.now());
    let record = store.find_record(auth.user_id, today).await?;
    Ok(HttpResponse::Ok().json(AttendanceResponse::new(today, record, true)))
}

/// Own attendance for a month
#[utoipa::path(
    get,
    path = "/api/attendance/history",
    params(MonthQuery),
    responses(
        (status = 200, description = "Month report", body = MonthReport),
        (status = 400, description = "Invalid month"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Staff profile not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn history(
    auth: AuthUser,
    store: web::Data<dyn AttendanceStore>,
    clock: web::Data<dyn Clock>,
    query: web::Query<MonthQuery>,
) -> Result<HttpResponse, ApiError> {
    let today = ist_date(clock.now());
    let range = month_range(query.month.as_deref(), today)?;
    let store = store.get_ref();

    let profile = load_profile(store, auth.user_id).await?;
    let report = build_month_report(store, profile, range, today).await?;

    Ok(HttpResponse::Ok().json(report))
}

/// Remove one of your own attendance records
#[utoipa::path(
    delete,
    path = "/api/attendance/{record_id}",
    params(
        ("record_id" = u64, Path, description = "Attendance record ID")
    ),
    responses(
        (status = 200, description = "Record removed", body = Object, example = json!({
            "message": "Attendance record deleted"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Attendance record not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn delete_record(
    auth: AuthUser,
    store: web::Data<dyn AttendanceStore>,
    path: web::Path<u64>,
) -> Result<HttpResponse, ApiError> {
    let record_id = path.into_inner();

    if !store.delete_record(auth.user_id, record_id).await? {
        return Err(ApiError::NotFound(
            "Attendance record not found".to_string(),
        ));
    }

    info!(user_id = auth.user_id, record_id, "Attendance record deleted");

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Attendance record deleted"
    })))
}
