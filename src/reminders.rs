//! User-facing reminder actions.
//!
//! Every change is written to the ledger first; the alarm for the affected
//! request code is then armed or canceled to match. Scheduling is best
//! effort: a refusal is logged and the ledger keeps the entry as-is.

use crate::alarm::AlarmScheduler;
use crate::error::AppError;
use crate::models::{ReminderKey, ReminderTime};
use crate::prefs::ReminderLedger;
use std::sync::Arc;

pub struct ReminderService {
    ledger: Arc<ReminderLedger>,
    scheduler: Arc<AlarmScheduler>,
}

impl ReminderService {
    pub fn new(ledger: Arc<ReminderLedger>, scheduler: Arc<AlarmScheduler>) -> Self {
        Self { ledger, scheduler }
    }

    pub fn list(&self) -> Vec<ReminderTime> {
        self.ledger.load()
    }

    /// Add an enabled reminder at `hour:minute` and arm it.
    ///
    /// Returns false, leaving the existing entry untouched, if that time is
    /// already configured.
    pub fn add(&self, hour: u8, minute: u8) -> Result<bool, AppError> {
        let time = ReminderTime::new(hour, minute, true)?;
        if !self.ledger.add(time)? {
            log::debug!("Reminder {hour:02}:{minute:02} already exists");
            return Ok(false);
        }
        self.arm(time.key());
        Ok(true)
    }

    /// Enable or disable the reminder at `hour:minute`.
    pub fn set_enabled(&self, hour: u8, minute: u8, enabled: bool) -> Result<(), AppError> {
        let key = ReminderTime::new(hour, minute, enabled)?.key();
        if !self.ledger.set_enabled(key, enabled)? {
            return Err(AppError::NotFound { entity: "Reminder" });
        }
        if enabled {
            self.arm(key);
        } else {
            self.scheduler.cancel(key.request_code());
        }
        Ok(())
    }

    pub fn remove(&self, hour: u8, minute: u8) -> Result<bool, AppError> {
        let key = ReminderTime::new(hour, minute, false)?.key();
        let removed = self.ledger.remove(key)?;
        // cancel even if the entry was already gone, so no alarm outlives it
        self.scheduler.cancel(key.request_code());
        Ok(removed)
    }

    fn arm(&self, key: ReminderKey) {
        if let Err(e) = self.scheduler.schedule(key.hour, key.minute, key.request_code()) {
            log::warn!("Reminder {:02}:{:02} saved but not armed: {e}", key.hour, key.minute);
        }
    }
}
