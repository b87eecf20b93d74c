use crate::api::admin::{StaffDayEntry, StatusCounts, TeamDayResponse};
use crate::api::attendance::{
    AttendanceResponse, HistoryDay, LeaveRequest, MonthQuery, MonthReport, PunchInRequest,
    PunchOutRequest,
};
use crate::engine::{AttendanceStatus, DailyStatus, Statistics};
use crate::model::attendance::{AttendanceRecord, GeoPoint, LunchBreak};
use crate::model::profile::{Holiday, StaffProfile};
use utoipa::Modify;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Staff Attendance API",
        version = "1.0.0",
        description = r#"
## Staff Attendance

Daily punch-in/punch-out tracking for staff, with lunch breaks, leave days
and monthly expected-vs-actual working hours.

### Calendar
- Every calendar day is an **IST (UTC+05:30)** day
- A staff member may punch in only on their configured working days, never on a holiday
- One attendance record per staff member per day

### Statuses
`not_punched_in`, `punched_in`, `on_lunch_break`, `punched_out`, `on_leave`

### Security
All endpoints require **JWT Bearer authentication**.
`/admin/*` endpoints are limited to the **Admin** role.
"#,
    ),
    paths(
        crate::api::attendance::punch_in,
        crate::api::attendance::punch_out,
        crate::api::attendance::start_lunch,
        crate::api::attendance::end_lunch,
        crate::api::attendance::mark_leave,
        crate::api::attendance::today_status,
        crate::api::attendance::history,
        crate::api::attendance::delete_record,

        crate::api::admin::team_today,
        crate::api::admin::staff_month
    ),
    components(
        schemas(
            PunchInRequest,
            PunchOutRequest,
            LeaveRequest,
            MonthQuery,
            AttendanceResponse,
            HistoryDay,
            MonthReport,
            StaffDayEntry,
            StatusCounts,
            TeamDayResponse,
            AttendanceStatus,
            DailyStatus,
            Statistics,
            AttendanceRecord,
            GeoPoint,
            LunchBreak,
            StaffProfile,
            Holiday
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Attendance", description = "Own attendance APIs"),
        (name = "Admin", description = "Team attendance APIs"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_lists_attendance_paths() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/api/attendance/punch-in"));
        assert!(doc.paths.paths.contains_key("/api/admin/attendance/{user_id}"));
        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("bearer_auth"));
    }
}
