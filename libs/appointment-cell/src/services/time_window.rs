// libs/appointment-cell/src/services/time_window.rs
use chrono::{Duration, NaiveTime};
use thiserror::Error;
use tracing::warn;

use shared_config::{AppConfig, DEFAULT_SLOT_MINUTES};

use crate::models::{AvailableSlot, BookingError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RangeError {
    #[error("Time {} is outside business hours", .0.format("%H:%M"))]
    OutOfWindow(NaiveTime),

    #[error("End time must be after start time")]
    EndNotAfterStart,
}

impl From<RangeError> for BookingError {
    fn from(error: RangeError) -> Self {
        match error {
            RangeError::OutOfWindow(time) => BookingError::OutOfWindow(time),
            RangeError::EndNotAfterStart => BookingError::EndNotAfterStart,
        }
    }
}

/// Parses `HH:MM` or `HH:MM:SS`.
pub fn parse_time_of_day(raw: &str) -> Option<NaiveTime> {
    let raw = raw.trim();
    NaiveTime::parse_from_str(raw, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M"))
        .ok()
}

/// Business hours and slot granularity for bookings.
///
/// A single closing bound is used both for validation and for slot
/// generation; both bounds are inclusive for `is_within_window`, so an
/// appointment may end exactly at closing time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindowPolicy {
    opens_at: NaiveTime,
    closes_at: NaiveTime,
    slot_minutes: u32,
}

impl Default for TimeWindowPolicy {
    fn default() -> Self {
        Self {
            opens_at: NaiveTime::from_hms_opt(7, 0, 0).unwrap_or(NaiveTime::MIN),
            closes_at: NaiveTime::from_hms_opt(18, 0, 0).unwrap_or(NaiveTime::MIN),
            slot_minutes: DEFAULT_SLOT_MINUTES,
        }
    }
}

impl TimeWindowPolicy {
    /// Returns `None` when the window is empty or the slot length is zero.
    pub fn new(opens_at: NaiveTime, closes_at: NaiveTime, slot_minutes: u32) -> Option<Self> {
        if opens_at >= closes_at || slot_minutes == 0 {
            return None;
        }
        Some(Self { opens_at, closes_at, slot_minutes })
    }

    pub fn from_config(config: &AppConfig) -> Self {
        let opens_at = parse_time_of_day(&config.business_opens_at);
        let closes_at = parse_time_of_day(&config.business_closes_at);

        match (opens_at, closes_at) {
            (Some(opens_at), Some(closes_at)) => {
                Self::new(opens_at, closes_at, config.slot_minutes).unwrap_or_else(|| {
                    warn!(
                        "Invalid business window {}-{} ({} min slots), using defaults",
                        config.business_opens_at, config.business_closes_at, config.slot_minutes
                    );
                    Self::default()
                })
            }
            _ => {
                warn!(
                    "Unparseable business hours '{}'-'{}', using defaults",
                    config.business_opens_at, config.business_closes_at
                );
                Self::default()
            }
        }
    }

    pub fn opens_at(&self) -> NaiveTime {
        self.opens_at
    }

    pub fn closes_at(&self) -> NaiveTime {
        self.closes_at
    }

    pub fn slot_minutes(&self) -> u32 {
        self.slot_minutes
    }

    pub fn is_within_window(&self, time: NaiveTime) -> bool {
        time >= self.opens_at && time <= self.closes_at
    }

    pub fn validate_range(&self, start: NaiveTime, end: NaiveTime) -> Result<(), RangeError> {
        if !self.is_within_window(start) {
            return Err(RangeError::OutOfWindow(start));
        }
        if !self.is_within_window(end) {
            return Err(RangeError::OutOfWindow(end));
        }
        if end <= start {
            return Err(RangeError::EndNotAfterStart);
        }
        Ok(())
    }

    /// Consecutive slots from opening time; a trailing partial slot is dropped.
    pub fn slots(&self) -> Vec<AvailableSlot> {
        let step = Duration::minutes(i64::from(self.slot_minutes));
        let mut slots = Vec::new();
        let mut start = self.opens_at;

        loop {
            let (end, wrapped) = start.overflowing_add_signed(step);
            if wrapped != 0 || end > self.closes_at {
                break;
            }
            slots.push(AvailableSlot { start_time: start, end_time: end });
            start = end;
        }

        slots
    }
}
