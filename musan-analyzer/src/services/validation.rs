//! Request validation
//!
//! All checks here are local and run before any remote call, except the
//! registration bound which needs the account's registration date.

use crate::error::ValidationError;
use crate::models::{Period, TimeWindow};
use chrono::NaiveDate;
use musan_common::time::parse_iso_date;

/// Trimmed value, or `EmptyField` when blank
pub fn require_non_empty<'a>(field: &'static str, value: &'a str) -> Result<&'a str, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyField(field));
    }
    Ok(trimmed)
}

/// Parse a ranking window token (`7day` … `12month`, `overall`)
///
/// `custom` is not a ranking window; custom ranges go through
/// [`validate_custom_range`].
pub fn parse_window_token(token: &str) -> Result<TimeWindow, ValidationError> {
    let token = require_non_empty("period", token)?;
    if token == "overall" {
        return Ok(TimeWindow::Overall);
    }
    Period::parse(token)
        .map(|period| TimeWindow::Predefined { period })
        .ok_or_else(|| ValidationError::UnknownPeriod(token.to_string()))
}

/// Parse a `YYYY-MM-DD` date
pub fn parse_date(field: &'static str, value: &str) -> Result<NaiveDate, ValidationError> {
    let value = require_non_empty(field, value)?;
    parse_iso_date(value).ok_or_else(|| ValidationError::InvalidDate {
        field,
        value: value.to_string(),
    })
}

/// Parse and check a custom range against today's date
pub fn validate_custom_range(
    start: &str,
    end: &str,
    today: NaiveDate,
) -> Result<(NaiveDate, NaiveDate), ValidationError> {
    let start = parse_date("start", start)?;
    let end = parse_date("end", end)?;

    if end < start {
        return Err(ValidationError::EndBeforeStart);
    }
    if end > today {
        return Err(ValidationError::EndInFuture(end));
    }
    Ok((start, end))
}

pub fn validate_start_after_registration(
    start: NaiveDate,
    registered: NaiveDate,
) -> Result<(), ValidationError> {
    if start < registered {
        return Err(ValidationError::StartBeforeRegistration { start, registered });
    }
    Ok(())
}
