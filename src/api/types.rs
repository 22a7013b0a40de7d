use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::services::{DailyLogDto, MealDto, ProgressDto, ProgressTrend, WorkoutDto};

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub const fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// `?start=&end=` with either bound optional.
#[derive(Debug, Default, Deserialize)]
pub struct DateRangeQuery {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

#[derive(Debug, Serialize)]
pub struct DailyLogDetail {
    pub daily_log: DailyLogDto,
    pub meals: Vec<MealDto>,
}

#[derive(Debug, Serialize)]
pub struct DashboardDto {
    pub date: NaiveDate,
    pub today: Option<DailyLogDto>,
    pub recent_workouts: Vec<WorkoutDto>,
    pub latest_progress: Option<ProgressDto>,
}

#[derive(Debug, Serialize)]
pub struct ProgressHistoryDto {
    pub entries: Vec<ProgressDto>,
    pub trend: ProgressTrend,
}

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub version: &'static str,
    pub uptime: u64,
    pub database: bool,
}
