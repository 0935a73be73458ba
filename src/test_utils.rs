//! Shared test utilities for Tasktide.
//!
//! Temp-dir databases and stores, a settable clock, and a notification
//! platform that records instead of posting.

#![cfg(test)]

use crate::clock::Clock;
use crate::db::{migrations, Database};
use crate::error::AppError;
use crate::platform::{Notification, NotificationPlatform};
use crate::store::Store;
use chrono::{DateTime, Duration as ChronoDuration, Local, TimeZone};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tempfile::{tempdir, TempDir};

/// Create a temporary test database with migrations applied.
///
/// Returns a tuple of (Database, TempDir). The TempDir must be kept alive
/// for the duration of the test to prevent the database file from being deleted.
pub fn setup_test_db() -> (Database, TempDir) {
    let dir = tempdir().expect("Failed to create temp directory for test DB");
    let db_path = dir.path().join("test.db");
    let db = Database::open(&db_path).expect("Failed to open test database");
    migrations::run(db.connection()).expect("Failed to run migrations on test DB");
    (db, dir)
}

/// A [`Store`] over a temp database, driven by a [`FixedClock`].
pub fn setup_test_store() -> (Store, Arc<FixedClock>, TempDir) {
    let dir = tempdir().expect("Failed to create temp directory for test store");
    let clock = Arc::new(FixedClock::default());
    let store = Store::open(&dir.path().join("test.db"), Arc::clone(&clock) as Arc<dyn Clock>)
        .expect("Failed to open test store");
    (store, clock, dir)
}

/// Local wall-clock time; panics on a DST gap, so tests pick unambiguous times.
pub fn local(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> DateTime<Local> {
    Local
        .with_ymd_and_hms(year, month, day, hour, minute, 0)
        .single()
        .expect("unambiguous local time")
}

/// Poll `condition` until it holds or `timeout` passes.
pub fn wait_until(timeout: Duration, condition: impl Fn() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    condition()
}

pub struct FixedClock {
    now: Mutex<DateTime<Local>>,
}

impl Default for FixedClock {
    fn default() -> Self {
        Self::at(local(2026, 6, 15, 10, 0))
    }
}

impl FixedClock {
    pub fn at(now: DateTime<Local>) -> Self {
        Self { now: Mutex::new(now) }
    }

    pub fn set(&self, now: DateTime<Local>) {
        *self.now.lock().unwrap() = now;
    }

    pub fn advance_secs(&self, secs: i64) {
        let mut now = self.now.lock().unwrap();
        *now = *now + ChronoDuration::seconds(secs);
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Local> {
        *self.now.lock().unwrap()
    }
}

/// Grants both capabilities by default and keeps every posted notification.
pub struct RecordingPlatform {
    exact_alarms: AtomicBool,
    notifications: AtomicBool,
    posted: Mutex<Vec<Notification>>,
}

impl RecordingPlatform {
    pub fn new() -> Self {
        Self {
            exact_alarms: AtomicBool::new(true),
            notifications: AtomicBool::new(true),
            posted: Mutex::new(Vec::new()),
        }
    }

    pub fn set_exact_alarms(&self, granted: bool) {
        self.exact_alarms.store(granted, Ordering::SeqCst);
    }

    pub fn set_notifications(&self, granted: bool) {
        self.notifications.store(granted, Ordering::SeqCst);
    }

    pub fn posted(&self) -> Vec<Notification> {
        self.posted.lock().unwrap().clone()
    }
}

impl NotificationPlatform for RecordingPlatform {
    fn can_schedule_exact_alarms(&self) -> bool {
        self.exact_alarms.load(Ordering::SeqCst)
    }

    fn can_post_notifications(&self) -> bool {
        self.notifications.load(Ordering::SeqCst)
    }

    fn post_notification(&self, notification: &Notification) -> Result<(), AppError> {
        self.posted.lock().unwrap().push(notification.clone());
        Ok(())
    }
}
