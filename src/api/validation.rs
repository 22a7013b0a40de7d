use chrono::NaiveDate;
use std::str::FromStr;

use super::ApiError;
use crate::db::page_offset;
use crate::domain::DateRange;

pub const MAX_PAGE_SIZE: u64 = 100;

pub fn validate_page_size(size: u64) -> Result<u64, ApiError> {
    if !(1..=MAX_PAGE_SIZE).contains(&size) {
        return Err(ApiError::validation(format!(
            "Invalid page size: {size}. Size must be between 1 and {MAX_PAGE_SIZE}"
        )));
    }
    Ok(size)
}

/// Rejects a page whose row offset overflows the database `OFFSET`.
pub fn validate_page(page: u64, size: u64) -> Result<u64, ApiError> {
    if page_offset(page, size).is_none() {
        return Err(ApiError::validation(format!("Invalid page: {page}")));
    }
    Ok(page)
}

pub fn validate_date_range(
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> Result<DateRange, ApiError> {
    if let (Some(s), Some(e)) = (start, end)
        && s > e
    {
        return Err(ApiError::validation(
            "Start date must not be after end date",
        ));
    }
    Ok(DateRange::new(start, end))
}

pub fn validate_search_query(query: &str) -> Result<&str, ApiError> {
    let trimmed = query.trim();
    if trimmed.is_empty() {
        return Err(ApiError::validation("Search query cannot be empty"));
    }
    Ok(trimmed)
}

pub fn parse_date(raw: &str) -> Result<NaiveDate, ApiError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| ApiError::validation(format!("Invalid date: {raw}. Expected YYYY-MM-DD")))
}

/// Parses a path identifier, reporting a malformed one as a bad request.
pub fn parse_id<T: FromStr>(raw: &str, resource: &str) -> Result<T, ApiError> {
    raw.trim()
        .parse()
        .map_err(|_| ApiError::validation(format!("Invalid {resource} id: {raw}")))
}
