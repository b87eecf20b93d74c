use chrono::{NaiveDate, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::calendar::{parse_clock_time, parse_weekday, weekday_name};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[schema(
    example = json!({
        "user_id": 1000,
        "full_name": "Asha Rao",
        "working_days": ["Monday", "Tuesday", "Wednesday", "Thursday", "Friday"],
        "office_time_in": "09:00",
        "office_time_out": "18:00",
        "salary": 52000.0
    })
)]
pub struct StaffProfile {
    #[schema(example = 1000)]
    pub user_id: u64,

    #[schema(example = "Asha Rao")]
    pub full_name: String,

    /// Weekday names, order-insensitive.
    #[schema(example = json!(["Monday", "Friday"]))]
    pub working_days: Vec<String>,

    #[schema(example = "09:00", nullable = true)]
    pub office_time_in: Option<String>,

    #[schema(example = "18:00", nullable = true)]
    pub office_time_out: Option<String>,

    #[schema(example = 52000.0)]
    pub salary: f64,
}

impl StaffProfile {
    pub fn works_on(&self, weekday: Weekday) -> bool {
        self.working_days
            .iter()
            .filter_map(|name| parse_weekday(name))
            .any(|day| day == weekday)
    }

    /// Working days in Sunday..Saturday order, normalized names.
    pub fn working_day_names(&self) -> Vec<&'static str> {
        let mut days: Vec<Weekday> = self
            .working_days
            .iter()
            .filter_map(|name| parse_weekday(name))
            .collect();
        days.sort_by_key(|d| d.num_days_from_sunday());
        days.dedup();
        days.into_iter().map(weekday_name).collect()
    }

    /// Both office times, when configured and parseable.
    pub fn office_hours(&self) -> Option<(NaiveTime, NaiveTime)> {
        let time_in = parse_clock_time(self.office_time_in.as_deref()?)?;
        let time_out = parse_clock_time(self.office_time_out.as_deref()?)?;
        Some((time_in, time_out))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Holiday {
    #[schema(example = "2026-01-26", format = "date", value_type = String)]
    pub date: NaiveDate,
    #[schema(example = "Republic Day")]
    pub name: String,
}
