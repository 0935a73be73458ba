//! Durable list of configured reminder times.
//!
//! Stored under one preference key as a JSON array string of
//! `{hour, minute, isEnabled}` records, kept sorted by time of day with no
//! two entries sharing an `(hour, minute)` key. The ledger is the only
//! source of truth for which reminders exist; alarms are derived from it.

use super::Preferences;
use crate::error::AppError;
use crate::models::reminder_time::normalize;
use crate::models::{ReminderKey, ReminderTime};
use serde_json::Value;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

pub const NOTIFICATION_TIMES_KEY: &str = "notification_times";

/// Hours of the fixed-slot scheme that predates user-defined times.
pub const LEGACY_HOURS: [u8; 3] = [9, 12, 18];

pub fn legacy_key(hour: u8) -> String {
    format!("notify_{hour}")
}

/// Entries shown on a fresh install: the legacy slots, all disabled.
pub fn seed() -> Vec<ReminderTime> {
    LEGACY_HOURS
        .iter()
        .map(|&hour| ReminderTime { hour, minute: 0, is_enabled: false })
        .collect()
}

/// Decode a stored array, entry by entry.
///
/// The outer `Err` means the value is not a JSON array at all; an inner
/// `Err` marks a single malformed entry.
pub fn decode_entries(raw: &str) -> Result<Vec<Result<ReminderTime, AppError>>, AppError> {
    let values: Vec<Value> = serde_json::from_str(raw)
        .map_err(|e| AppError::Parse(format!("reminder list is not a JSON array: {e}")))?;

    Ok(values
        .into_iter()
        .map(|value| {
            let time: ReminderTime = serde_json::from_value(value)
                .map_err(|e| AppError::Parse(format!("bad reminder entry: {e}")))?;
            time.validate()?;
            Ok(time)
        })
        .collect())
}

pub struct ReminderLedger {
    prefs: Preferences,
    // serializes read-modify-write cycles within this process
    lock: Mutex<()>,
}

impl ReminderLedger {
    pub fn new(prefs: Preferences) -> Self {
        Self { prefs, lock: Mutex::new(()) }
    }

    pub fn open(path: &Path) -> Self {
        Self::new(Preferences::open(path))
    }

    fn guard(&self) -> MutexGuard<'_, ()> {
        match self.lock.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                log::warn!("ReminderLedger: mutex was poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }

    /// All reminders, sorted. Malformed entries are dropped; an unreadable
    /// list falls back to [`seed`].
    pub fn load(&self) -> Vec<ReminderTime> {
        let _guard = self.guard();
        self.load_locked()
    }

    /// Raw per-entry decode results, for callers that must tolerate bad entries.
    pub fn entries(&self) -> Result<Vec<Result<ReminderTime, AppError>>, AppError> {
        let _guard = self.guard();
        self.entries_locked()
    }

    /// Replace the stored list with `times`, sorted and with later
    /// duplicates of a key dropped. An out-of-range time rejects the whole save.
    pub fn save(&self, times: &[ReminderTime]) -> Result<(), AppError> {
        let _guard = self.guard();
        self.save_locked(times)
    }

    /// Add a reminder unless one with the same `(hour, minute)` exists.
    pub fn add(&self, time: ReminderTime) -> Result<bool, AppError> {
        time.validate()?;
        self.modify(|times| {
            if times.iter().any(|t| t.key() == time.key()) {
                return false;
            }
            times.push(time);
            true
        })
    }

    /// Set `is_enabled` on the reminder matching `key`; false if there is none.
    pub fn set_enabled(&self, key: ReminderKey, enabled: bool) -> Result<bool, AppError> {
        self.modify(|times| match times.iter_mut().find(|t| t.key() == key) {
            Some(time) => {
                time.is_enabled = enabled;
                true
            }
            None => false,
        })
    }

    pub fn remove(&self, key: ReminderKey) -> Result<bool, AppError> {
        self.modify(|times| {
            let before = times.len();
            times.retain(|t| t.key() != key);
            times.len() != before
        })
    }

    /// One-time upgrade from the legacy `notify_<hour>` booleans.
    ///
    /// Runs only while the modern key is absent and at least one legacy key
    /// exists; returns whether a list was written.
    pub fn migrate_legacy(&self) -> Result<bool, AppError> {
        let _guard = self.guard();
        if self.prefs.contains(NOTIFICATION_TIMES_KEY) {
            return Ok(false);
        }
        match self.legacy_times() {
            Some(times) => {
                self.save_locked(&times)?;
                log::info!("Migrated legacy reminder slots to the reminder list");
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn legacy_times(&self) -> Option<Vec<ReminderTime>> {
        let flags: Vec<(u8, Option<bool>)> = LEGACY_HOURS
            .iter()
            .map(|&hour| (hour, self.prefs.get_bool(&legacy_key(hour))))
            .collect();

        if flags.iter().all(|(_, flag)| flag.is_none()) {
            return None;
        }
        Some(
            flags
                .into_iter()
                .map(|(hour, flag)| ReminderTime {
                    hour,
                    minute: 0,
                    is_enabled: flag.unwrap_or(false),
                })
                .collect(),
        )
    }

    fn entries_locked(&self) -> Result<Vec<Result<ReminderTime, AppError>>, AppError> {
        match self.prefs.get(NOTIFICATION_TIMES_KEY) {
            Some(Value::String(raw)) => decode_entries(&raw),
            Some(_) => Err(AppError::Parse(format!(
                "'{NOTIFICATION_TIMES_KEY}' is not a string"
            ))),
            None => {
                let times = match self.legacy_times() {
                    Some(times) => {
                        match self.save_locked(&times) {
                            Ok(()) => log::info!("Migrated legacy reminder slots to the reminder list"),
                            Err(e) => log::warn!("Failed to persist migrated reminder list: {e}"),
                        }
                        times
                    }
                    None => seed(),
                };
                Ok(times.into_iter().map(Ok).collect())
            }
        }
    }

    fn load_locked(&self) -> Vec<ReminderTime> {
        match self.entries_locked() {
            Ok(entries) => {
                let mut times: Vec<ReminderTime> = entries
                    .into_iter()
                    .filter_map(|entry| match entry {
                        Ok(time) => Some(time),
                        Err(e) => {
                            log::warn!("Dropping reminder entry: {e}");
                            None
                        }
                    })
                    .collect();
                normalize(&mut times);
                times
            }
            Err(e) => {
                log::warn!("Reminder list unreadable, using defaults: {e}");
                seed()
            }
        }
    }

    fn save_locked(&self, times: &[ReminderTime]) -> Result<(), AppError> {
        for time in times {
            time.validate()?;
        }
        let mut times = times.to_vec();
        normalize(&mut times);

        let json = serde_json::to_string(&times)
            .map_err(|e| AppError::Internal(format!("failed to serialize reminders: {e}")))?;
        self.prefs.put_string(NOTIFICATION_TIMES_KEY, &json)
    }

    /// Load, apply `change`, re-sort and save if it reported a change.
    fn modify<F>(&self, change: F) -> Result<bool, AppError>
    where
        F: FnOnce(&mut Vec<ReminderTime>) -> bool,
    {
        let _guard = self.guard();
        let mut times = self.load_locked();
        if !change(&mut times) {
            return Ok(false);
        }
        self.save_locked(&times)?;
        Ok(true)
    }
}
