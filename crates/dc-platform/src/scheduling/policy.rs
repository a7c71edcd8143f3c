//! Booking policy: clinic hours and slot length

use chrono::{Duration, NaiveDate, NaiveTime};
use dc_config::BookingConfig;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::slot::TimeSlot;
use crate::shared::error::{PlatformError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookingPolicy {
    #[schema(value_type = String, example = "08:00:00")]
    pub day_start: NaiveTime,
    #[schema(value_type = String, example = "18:00:00")]
    pub day_end: NaiveTime,
    pub slot_minutes: u32,
    /// Longest accepted appointment note
    pub max_notes_len: usize,
}

impl BookingPolicy {
    pub fn from_config(config: &BookingConfig) -> Result<Self> {
        config
            .validate()
            .map_err(|e| PlatformError::validation("INVALID_BOOKING_POLICY", e.to_string()))?;

        let day_start = config
            .day_start_time()
            .map_err(|e| PlatformError::validation("INVALID_BOOKING_POLICY", e.to_string()))?;
        let day_end = config
            .day_end_time()
            .map_err(|e| PlatformError::validation("INVALID_BOOKING_POLICY", e.to_string()))?;

        Ok(Self {
            day_start,
            day_end,
            slot_minutes: config.slot_minutes,
            max_notes_len: config.max_notes_len,
        })
    }

    pub fn validate(&self) -> Result<()> {
        if self.day_start >= self.day_end {
            return Err(PlatformError::validation(
                "INVALID_BOOKING_POLICY",
                "day start must be before day end",
            ));
        }
        if self.slot_minutes == 0 || i64::from(self.slot_minutes) > (self.day_end - self.day_start).num_minutes() {
            return Err(PlatformError::validation(
                "INVALID_BOOKING_POLICY",
                format!("slot length of {} minutes does not fit the clinic day", self.slot_minutes),
            ));
        }
        Ok(())
    }

    /// Every slot of the clinic day, back to back from `day_start`.
    pub fn slots_for(&self, date: NaiveDate) -> Vec<TimeSlot> {
        let mut slots = Vec::new();
        if self.slot_minutes == 0 {
            return slots;
        }

        let step = Duration::minutes(i64::from(self.slot_minutes));
        let mut start = self.day_start;

        loop {
            let (end, wrapped) = start.overflowing_add_signed(step);
            if wrapped != 0 || end > self.day_end {
                break;
            }
            slots.push(TimeSlot {
                date,
                start_time: start,
                end_time: end,
            });
            start = end;
        }

        slots
    }
}

impl Default for BookingPolicy {
    fn default() -> Self {
        Self {
            day_start: NaiveTime::from_hms_opt(8, 0, 0).unwrap_or_default(),
            day_end: NaiveTime::from_hms_opt(18, 0, 0).unwrap_or_default(),
            slot_minutes: 60,
            max_notes_len: 2000,
        }
    }
}
