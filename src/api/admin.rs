use std::collections::HashMap;

use crate::api::attendance::{MonthQuery, build_month_report, load_profile, month_range};
use crate::api::error::ApiError;
use crate::auth::auth::AuthUser;
use crate::calendar::{Clock, ist_date};
use crate::engine::{AttendanceStatus, DailyStatus, derive_daily_status};
use crate::model::attendance::AttendanceRecord;
use crate::store::AttendanceStore;
use actix_web::{HttpResponse, web};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use tracing::debug;
use utoipa::ToSchema;

#[derive(Serialize, ToSchema)]
pub struct StaffDayEntry {
    #[schema(example = 1000)]
    pub user_id: u64,
    #[schema(example = "Asha Rao")]
    pub full_name: String,
    #[schema(example = "2026-01-05T03:30:00Z", format = "date-time", value_type = String, nullable = true)]
    pub punch_in_time: Option<DateTime<Utc>>,
    #[schema(example = "2026-01-05T12:30:00Z", format = "date-time", value_type = String, nullable = true)]
    pub punch_out_time: Option<DateTime<Utc>>,
    pub summary: DailyStatus,
}

#[derive(Serialize, ToSchema, Default, Debug, PartialEq)]
pub struct StatusCounts {
    pub not_punched_in: u32,
    pub punched_in: u32,
    pub on_lunch_break: u32,
    pub punched_out: u32,
    pub on_leave: u32,
}

impl StatusCounts {
    fn add(&mut self, status: AttendanceStatus) {
        let slot = match status {
            AttendanceStatus::NotPunchedIn => &mut self.not_punched_in,
            AttendanceStatus::PunchedIn => &mut self.punched_in,
            AttendanceStatus::OnLunchBreak => &mut self.on_lunch_break,
            AttendanceStatus::PunchedOut => &mut self.punched_out,
            AttendanceStatus::OnLeave => &mut self.on_leave,
        };
        *slot += 1;
    }
}

#[derive(Serialize, ToSchema)]
pub struct TeamDayResponse {
    #[schema(example = "2026-01-05", format = "date", value_type = String)]
    pub date: NaiveDate,
    pub counts: StatusCounts,
    pub staff: Vec<StaffDayEntry>,
}

/// Today's status of every staff member (Admin only)
#[utoipa::path(
    get,
    path = "/api/admin/attendance/today",
    responses(
        (status = 200, description = "Team status for today", body = TeamDayResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin only")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn team_today(
    auth: AuthUser,
    store: web::Data<dyn AttendanceStore>,
    clock: web::Data<dyn Clock>,
) -> Result<HttpResponse, ApiError> {
    auth.require_admin()?;

    let today = ist_date(clock.now());
    let profiles = store.list_profiles().await?;
    let mut records: HashMap<u64, AttendanceRecord> = store
        .list_records_on(today)
        .await?
        .into_iter()
        .map(|r| (r.user_id, r))
        .collect();

    let mut counts = StatusCounts::default();
    let staff: Vec<StaffDayEntry> = profiles
        .into_iter()
        .map(|profile| {
            let record = records.remove(&profile.user_id);
            let summary = derive_daily_status(record.as_ref(), true);
            counts.add(summary.status);
            StaffDayEntry {
                user_id: profile.user_id,
                full_name: profile.full_name,
                punch_in_time: record.as_ref().and_then(|r| r.punch_in_time),
                punch_out_time: record.as_ref().and_then(|r| r.punch_out_time),
                summary,
            }
        })
        .collect();

    debug!(admin = auth.user_id, date = %today, staff = staff.len(), "Team status listed");

    Ok(HttpResponse::Ok().json(TeamDayResponse {
        date: today,
        counts,
        staff,
    }))
}

/// One staff member's attendance for a month (Admin only)
#[utoipa::path(
    get,
    path = "/api/admin/attendance/{user_id}",
    params(
        ("user_id" = u64, Path, description = "Staff user ID"),
        MonthQuery
    ),
    responses(
        (status = 200, description = "Month report", body = MonthReport),
        (status = 400, description = "Invalid month"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin only"),
        (status = 404, description = "Staff profile not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn staff_month(
    auth: AuthUser,
    store: web::Data<dyn AttendanceStore>,
    clock: web::Data<dyn Clock>,
    path: web::Path<u64>,
    query: web::Query<MonthQuery>,
) -> Result<HttpResponse, ApiError> {
    auth.require_admin()?;

    let user_id = path.into_inner();
    let today = ist_date(clock.now());
    let range = month_range(query.month.as_deref(), today)?;
    let store = store.get_ref();

    let profile = load_profile(store, user_id).await?;
    let report = build_month_report(store, profile, range, today).await?;

    Ok(HttpResponse::Ok().json(report))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_each_status_once() {
        let mut counts = StatusCounts::default();
        counts.add(AttendanceStatus::PunchedIn);
        counts.add(AttendanceStatus::PunchedIn);
        counts.add(AttendanceStatus::OnLeave);
        counts.add(AttendanceStatus::NotPunchedIn);

        assert_eq!(
            counts,
            StatusCounts {
                not_punched_in: 1,
                punched_in: 2,
                on_lunch_break: 0,
                punched_out: 0,
                on_leave: 1,
            }
        );
    }
}
