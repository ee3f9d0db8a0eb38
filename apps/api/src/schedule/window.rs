//! Assessment window status: where "now" falls relative to a scheduled start/end.

use chrono::{DateTime, FixedOffset, NaiveDateTime};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScheduleError {
    #[error("Invalid timestamp '{0}': expected ISO-8601 like 2025-01-31T09:30:00")]
    InvalidTimestamp(String),

    #[error("endTime must not be before startTime")]
    EndBeforeStart,

    #[error("UTC offset of {0} minutes is out of range")]
    InvalidOffset(i32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AssessmentStatus {
    Upcoming,
    Ongoing,
    Completed,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowStatus {
    pub status: AssessmentStatus,
    pub start_time: DateTime<FixedOffset>,
    pub end_time: DateTime<FixedOffset>,
    pub current_time: DateTime<FixedOffset>,
    /// Milliseconds; zero unless upcoming.
    pub time_until_start: i64,
    /// Milliseconds; zero unless ongoing.
    pub time_remaining: i64,
    pub duration_minutes: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssessmentWindow {
    pub start: DateTime<FixedOffset>,
    pub end: DateTime<FixedOffset>,
}

pub fn offset_from_minutes(minutes: i32) -> Result<FixedOffset, ScheduleError> {
    minutes
        .checked_mul(60)
        .and_then(FixedOffset::east_opt)
        .ok_or(ScheduleError::InvalidOffset(minutes))
}

/// Parses a client timestamp.
///
/// A trailing `Z` is dropped and the time read as local to `offset`, matching
/// how clients submit schedule times. Explicit `+hh:mm` offsets are honoured.
pub fn parse_timestamp(
    raw: &str,
    offset: FixedOffset,
) -> Result<DateTime<FixedOffset>, ScheduleError> {
    let trimmed = raw.trim();
    let local = trimmed.strip_suffix('Z').unwrap_or(trimmed);

    if let Ok(explicit) = DateTime::parse_from_rfc3339(local) {
        return Ok(explicit);
    }

    local
        .parse::<NaiveDateTime>()
        .or_else(|_| NaiveDateTime::parse_from_str(local, "%Y-%m-%dT%H:%M"))
        .ok()
        .and_then(|naive| naive.and_local_timezone(offset).single())
        .ok_or_else(|| ScheduleError::InvalidTimestamp(raw.to_string()))
}

impl AssessmentWindow {
    pub fn new(
        start: DateTime<FixedOffset>,
        end: DateTime<FixedOffset>,
    ) -> Result<Self, ScheduleError> {
        if end < start {
            return Err(ScheduleError::EndBeforeStart);
        }
        Ok(Self { start, end })
    }

    pub fn parse(start: &str, end: &str, offset: FixedOffset) -> Result<Self, ScheduleError> {
        Self::new(parse_timestamp(start, offset)?, parse_timestamp(end, offset)?)
    }

    pub fn status_at(&self, now: DateTime<FixedOffset>) -> WindowStatus {
        let (status, time_until_start, time_remaining) = if now < self.start {
            (
                AssessmentStatus::Upcoming,
                (self.start - now).num_milliseconds(),
                0,
            )
        } else if now > self.end {
            (AssessmentStatus::Completed, 0, 0)
        } else {
            (
                AssessmentStatus::Ongoing,
                0,
                (self.end - now).num_milliseconds(),
            )
        };

        WindowStatus {
            status,
            start_time: self.start,
            end_time: self.end,
            current_time: now,
            time_until_start,
            time_remaining,
            duration_minutes: (self.end - self.start).num_minutes(),
        }
    }
}
