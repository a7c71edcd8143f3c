//! Time slots

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;

use crate::shared::error::{PlatformError, Result};

/// A bookable interval `[start, end)` on one date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TimeSlot {
    #[schema(value_type = String, format = Date)]
    pub date: NaiveDate,
    #[schema(value_type = String, example = "09:00:00")]
    pub start_time: NaiveTime,
    #[schema(value_type = String, example = "10:00:00")]
    pub end_time: NaiveTime,
}

impl TimeSlot {
    pub fn new(date: NaiveDate, start_time: NaiveTime, end_time: NaiveTime) -> Result<Self> {
        if start_time >= end_time {
            return Err(PlatformError::validation(
                "INVALID_TIME_RANGE",
                format!("start time {} must be before end time {}", start_time, end_time),
            ));
        }
        Ok(Self {
            date,
            start_time,
            end_time,
        })
    }

    /// Re-check the range of a slot that arrived through deserialization.
    pub fn validated(self) -> Result<Self> {
        Self::new(self.date, self.start_time, self.end_time)
    }

    /// Half-open overlap: touching slots do not overlap.
    pub fn overlaps(&self, other: &TimeSlot) -> bool {
        self.date == other.date && self.start_time < other.end_time && other.start_time < self.end_time
    }

    pub fn duration_minutes(&self) -> u32 {
        (self.end_time - self.start_time).num_minutes().max(0) as u32
    }
}

impl fmt::Display for TimeSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}-{}",
            self.date,
            self.start_time.format("%H:%M"),
            self.end_time.format("%H:%M")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slot(start: &str, end: &str) -> TimeSlot {
        let date = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        TimeSlot::new(
            date,
            NaiveTime::parse_from_str(start, "%H:%M").unwrap(),
            NaiveTime::parse_from_str(end, "%H:%M").unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn test_start_must_precede_end() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        let nine = NaiveTime::from_hms_opt(9, 0, 0).unwrap();
        let err = TimeSlot::new(date, nine, nine).unwrap_err();
        assert_eq!(err.code(), "INVALID_TIME_RANGE");
    }

    #[test]
    fn test_half_open_overlap() {
        assert!(slot("09:00", "10:00").overlaps(&slot("09:30", "10:30")));
        assert!(slot("09:00", "10:00").overlaps(&slot("09:00", "10:00")));
        assert!(!slot("09:00", "10:00").overlaps(&slot("10:00", "11:00")));
        assert!(!slot("10:00", "11:00").overlaps(&slot("09:00", "10:00")));
    }

    #[test]
    fn test_different_dates_never_overlap() {
        let a = slot("09:00", "10:00");
        let b = TimeSlot {
            date: a.date.succ_opt().unwrap(),
            ..a
        };
        assert!(!a.overlaps(&b));
    }

    #[test]
    fn test_duration_and_display() {
        let s = slot("09:15", "10:00");
        assert_eq!(s.duration_minutes(), 45);
        assert_eq!(s.to_string(), "2026-03-02 09:15-10:00");
    }
}
