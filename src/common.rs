/// Business-time helpers shared across handlers, services and jobs
use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::errors::ServiceError;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Calendar years accepted from callers.
pub const YEAR_RANGE: std::ops::RangeInclusive<i32> = 1..=9999;

/// Inclusive range of business dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct DateRange {
    #[schema(value_type = String, format = Date)]
    pub start: NaiveDate,
    #[schema(value_type = String, format = Date)]
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, ServiceError> {
        if start > end {
            return Err(ServiceError::ValidationError(format!(
                "start_date {} must not be after end_date {}",
                start, end
            )));
        }
        Ok(Self { start, end })
    }

    pub fn single(day: NaiveDate) -> Self {
        Self {
            start: day,
            end: day,
        }
    }

    /// Parses `YYYY-MM-DD` bounds.
    pub fn parse(start: &str, end: &str) -> Result<Self, ServiceError> {
        Self::new(parse_date("start_date", start)?, parse_date("end_date", end)?)
    }

    /// Half-open UTC window `[start 00:00, end + 1 day 00:00)` in business time.
    pub fn utc_bounds(&self, offset: FixedOffset) -> (DateTime<Utc>, DateTime<Utc>) {
        let (from, _) = local_day_bounds(self.start, offset);
        let (_, until) = local_day_bounds(self.end, offset);
        (from, until)
    }
}

/// Parses a `YYYY-MM-DD` date; signed or five-digit years are rejected.
pub fn parse_date(field: &str, value: &str) -> Result<NaiveDate, ServiceError> {
    let day = NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).map_err(|e| {
        ServiceError::ValidationError(format!("Invalid {} '{}': {}", field, value, e))
    })?;
    if !YEAR_RANGE.contains(&day.year()) {
        return Err(ServiceError::ValidationError(format!(
            "Invalid {} '{}': year must be between {} and {}",
            field,
            value,
            YEAR_RANGE.start(),
            YEAR_RANGE.end()
        )));
    }
    Ok(day)
}

/// UTC instants of local midnight on `day` and on the following day.
pub fn local_day_bounds(day: NaiveDate, offset: FixedOffset) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = start_of_local_day(day, offset);
    let end = start
        .checked_add_signed(Duration::days(1))
        .unwrap_or(DateTime::<Utc>::MAX_UTC);
    (start, end)
}

pub fn start_of_local_day(day: NaiveDate, offset: FixedOffset) -> DateTime<Utc> {
    // A fixed offset has no gaps, so local midnight always maps to one instant
    let midnight = day.and_time(chrono::NaiveTime::MIN);
    offset
        .from_local_datetime(&midnight)
        .single()
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|| Utc.from_utc_datetime(&midnight))
}

/// Business date an instant falls on.
pub fn business_date(at: DateTime<Utc>, offset: FixedOffset) -> NaiveDate {
    at.with_timezone(&offset).date_naive()
}
