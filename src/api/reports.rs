use axum::{
    Extension, Json,
    extract::{Query, State},
};
use chrono::{Local, NaiveDate};
use serde::Deserialize;
use std::sync::Arc;

use super::validation::parse_date;
use super::{ApiError, ApiResponse, AppState};
use crate::services::report_service::week_start_of;
use crate::services::{AuthUser, ReportSummary};

#[derive(Debug, Default, Deserialize)]
pub struct WeeklyQuery {
    pub week_start: Option<NaiveDate>,
}

#[derive(Debug, Default, Deserialize)]
pub struct MonthlyQuery {
    /// `YYYY-MM` or any `YYYY-MM-DD` inside the month.
    pub month: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SummaryQuery {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

fn parse_month(raw: &str) -> Result<NaiveDate, ApiError> {
    let trimmed = raw.trim();
    if trimmed.len() == 7 {
        return parse_date(&format!("{trimmed}-01"));
    }
    parse_date(trimmed)
}

/// GET /reports/weekly
/// Defaults to the Monday of the current week.
pub async fn weekly(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<WeeklyQuery>,
) -> Result<Json<ApiResponse<ReportSummary>>, ApiError> {
    let week_start = query
        .week_start
        .unwrap_or_else(|| week_start_of(Local::now().date_naive()));
    let summary = state.shared.reports.weekly(user.id, week_start).await?;
    Ok(Json(ApiResponse::success(summary)))
}

pub async fn monthly(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<MonthlyQuery>,
) -> Result<Json<ApiResponse<ReportSummary>>, ApiError> {
    let day = match query.month.as_deref() {
        Some(raw) if !raw.trim().is_empty() => parse_month(raw)?,
        _ => Local::now().date_naive(),
    };
    let summary = state.shared.reports.monthly(user.id, day).await?;
    Ok(Json(ApiResponse::success(summary)))
}

pub async fn summary(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<SummaryQuery>,
) -> Result<Json<ApiResponse<ReportSummary>>, ApiError> {
    let (Some(start), Some(end)) = (query.start, query.end) else {
        return Err(ApiError::validation("Both start and end dates are required"));
    };
    let summary = state
        .shared
        .reports
        .generate_summary(user.id, start, end)
        .await?;
    Ok(Json(ApiResponse::success(summary)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_month_accepts_both_forms() {
        let first = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
        assert_eq!(parse_month("2024-02").unwrap(), first);
        assert_eq!(
            parse_month("2024-02-17").unwrap(),
            NaiveDate::from_ymd_opt(2024, 2, 17).unwrap()
        );
        assert!(parse_month("Feb 2024").is_err());
    }
}
