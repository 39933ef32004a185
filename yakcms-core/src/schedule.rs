// YakCMS - A content management backend built with Rust
// Copyright (C) 2025 YakCMS Project Contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as
// published by the Free Software Foundation, either version 3 of the
// License, or (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

//! Publication scheduling: turns an editor's intent (draft / publish now /
//! schedule for a wall-clock moment in some IANA zone) into a validated
//! UTC publish instant and a post status.

use chrono::{DateTime, LocalResult, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

use crate::models::post::PostStatus;

/// What the editor asked for.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PublishMode {
    Draft,
    Publish,
    Schedule,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScheduleError {
    /// The resolved instant is not strictly in the future. The message is
    /// the exact text shown to editors.
    #[error("Please select a future date and time")]
    PastSchedule,

    /// Wall-clock time inside a spring-forward gap; it never occurs in the
    /// given zone, so we refuse to guess an offset.
    #[error("{time} does not exist in {zone} (daylight saving transition)")]
    NonexistentLocalTime { time: String, zone: String },

    #[error("Unknown timezone: {0}")]
    InvalidTimezone(String),

    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("Invalid time: {0}")]
    InvalidTime(String),

    #[error("Schedule mode requires a date, time, and timezone")]
    MissingScheduleFields,
}

/// Outcome of resolving a [`PublishMode`].
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Resolution {
    pub status: PostStatus,
    pub published_at: Option<DateTime<Utc>>,
    /// Set when the requested wall-clock time occurs twice (fall-back
    /// window) and the earlier offset was chosen.
    pub ambiguous: bool,
}

/// Resolve a scheduling request against `now`.
///
/// Draft and publish ignore the date/time/zone triple entirely; schedule
/// requires all three. A scheduled instant must be strictly greater than
/// `now` -- an instant equal to `now` is rejected.
pub fn resolve(
    mode: PublishMode,
    date: Option<NaiveDate>,
    time: Option<NaiveTime>,
    timezone: Option<Tz>,
    now: DateTime<Utc>,
) -> Result<Resolution, ScheduleError> {
    match mode {
        PublishMode::Draft => Ok(Resolution {
            status: PostStatus::Draft,
            published_at: None,
            ambiguous: false,
        }),
        PublishMode::Publish => Ok(Resolution {
            status: PostStatus::Published,
            published_at: Some(now),
            ambiguous: false,
        }),
        PublishMode::Schedule => {
            let (date, time, tz) = match (date, time, timezone) {
                (Some(d), Some(t), Some(z)) => (d, t, z),
                _ => return Err(ScheduleError::MissingScheduleFields),
            };
            let (instant, ambiguous) = resolve_local(date, time, tz)?;
            if instant <= now {
                return Err(ScheduleError::PastSchedule);
            }
            Ok(Resolution {
                status: PostStatus::Scheduled,
                published_at: Some(instant),
                ambiguous,
            })
        }
    }
}

/// Map a wall-clock moment in `tz` to UTC, handling DST transitions.
///
/// A nonexistent time (spring-forward gap) is an error. An ambiguous time
/// (fall-back window) deterministically takes the earlier offset and
/// reports the ambiguity.
fn resolve_local(
    date: NaiveDate,
    time: NaiveTime,
    tz: Tz,
) -> Result<(DateTime<Utc>, bool), ScheduleError> {
    let naive = date.and_time(time);
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(local) => Ok((local.with_timezone(&Utc), false)),
        LocalResult::Ambiguous(earlier, _later) => Ok((earlier.with_timezone(&Utc), true)),
        LocalResult::None => Err(ScheduleError::NonexistentLocalTime {
            time: naive.format("%Y-%m-%d %H:%M").to_string(),
            zone: tz.name().to_string(),
        }),
    }
}

/// Parse an IANA zone identifier ("America/New_York").
pub fn parse_timezone(name: &str) -> Result<Tz, ScheduleError> {
    Tz::from_str(name).map_err(|_| ScheduleError::InvalidTimezone(name.to_string()))
}

/// Parse a `YYYY-MM-DD` calendar date.
pub fn parse_date(s: &str) -> Result<NaiveDate, ScheduleError> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|_| ScheduleError::InvalidDate(s.to_string()))
}

/// Parse a `HH:MM` (or `HH:MM:SS`) clock time.
pub fn parse_time(s: &str) -> Result<NaiveTime, ScheduleError> {
    NaiveTime::parse_from_str(s, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M:%S"))
        .map_err(|_| ScheduleError::InvalidTime(s.to_string()))
}
