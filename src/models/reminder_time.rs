use crate::error::AppError;
use crate::validation::validate_hour_minute;
use serde::{Deserialize, Serialize};

/// Identity of a reminder: two entries with the same key are the same
/// logical reminder whatever their enabled state.
///
/// Ordering follows `hour * 60 + minute`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ReminderKey {
    pub hour: u8,
    pub minute: u8,
}

impl ReminderKey {
    /// Stable handle for the platform alarm backing this reminder.
    pub fn request_code(self) -> u32 {
        u32::from(self.hour) * 60 + u32::from(self.minute)
    }
}

/// A daily "notify at HH:MM" entry as persisted in the reminder ledger.
///
/// Unknown or missing fields are rejected on read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReminderTime {
    pub hour: u8,
    pub minute: u8,
    #[serde(rename = "isEnabled")]
    pub is_enabled: bool,
}

impl ReminderTime {
    pub fn new(hour: u8, minute: u8, is_enabled: bool) -> Result<Self, AppError> {
        validate_hour_minute(hour, minute)?;
        Ok(Self { hour, minute, is_enabled })
    }

    pub fn key(&self) -> ReminderKey {
        ReminderKey { hour: self.hour, minute: self.minute }
    }

    pub fn request_code(&self) -> u32 {
        self.key().request_code()
    }

    /// Ledger entries must name a real wall-clock minute.
    pub fn validate(&self) -> Result<(), AppError> {
        validate_hour_minute(self.hour, self.minute)
    }
}

/// Sort ascending by time of day and drop later duplicates of the same key.
pub fn normalize(times: &mut Vec<ReminderTime>) {
    times.sort_by_key(ReminderTime::key);
    times.dedup_by_key(|t| t.key());
}
