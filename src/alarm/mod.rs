//! Daily reminder alarms built from one-shot timers.
//!
//! Each request code owns at most one slot. A slot moves
//! `Scheduled -> Fired -> Scheduled(next day)`; firing posts the
//! notification and re-arms as two separate steps, so a cancel or
//! reschedule that lands in between wins over the re-arm.

pub mod service;

pub use service::AlarmService;

use crate::clock::{next_occurrence, Clock};
use crate::config::NotificationConfig;
use crate::error::AppError;
use crate::platform::{Notification, NotificationPlatform};
use crate::validation::validate_hour_minute;
use chrono::{DateTime, Local};
use crossbeam_channel::{bounded, Receiver, Sender};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlarmState {
    Scheduled { fire_at: DateTime<Local> },
    Fired { fired_at: DateTime<Local> },
}

#[derive(Debug, Clone, Copy)]
struct AlarmSlot {
    hour: u8,
    minute: u8,
    state: AlarmState,
}

/// An alarm currently waiting to fire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArmedAlarm {
    pub hour: u8,
    pub minute: u8,
    pub request_code: u32,
    pub fire_at: DateTime<Local>,
}

/// What happened to one alarm during [`AlarmScheduler::fire_due`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FireOutcome {
    pub request_code: u32,
    pub notified: bool,
    pub rearmed_for: Option<DateTime<Local>>,
}

pub struct AlarmScheduler {
    platform: Arc<dyn NotificationPlatform>,
    clock: Arc<dyn Clock>,
    notification: NotificationConfig,
    slots: Mutex<BTreeMap<u32, AlarmSlot>>,
    wake_tx: Sender<()>,
    wake_rx: Receiver<()>,
}

impl AlarmScheduler {
    pub fn new(
        platform: Arc<dyn NotificationPlatform>,
        clock: Arc<dyn Clock>,
        notification: NotificationConfig,
    ) -> Self {
        // one pending wake is enough to interrupt a wait
        let (wake_tx, wake_rx) = bounded(1);
        Self {
            platform,
            clock,
            notification,
            slots: Mutex::new(BTreeMap::new()),
            wake_tx,
            wake_rx,
        }
    }

    fn lock_slots(&self) -> MutexGuard<'_, BTreeMap<u32, AlarmSlot>> {
        match self.slots.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                log::warn!("AlarmScheduler: slot mutex was poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }

    /// Arm a one-shot alarm for the next `hour:minute:00`, replacing any
    /// alarm already armed under `request_code`.
    pub fn schedule(&self, hour: u8, minute: u8, request_code: u32) -> Result<DateTime<Local>, AppError> {
        validate_hour_minute(hour, minute)?;

        if !self.platform.can_schedule_exact_alarms() {
            log::warn!("Permission missing for exact alarm {hour:02}:{minute:02} (code {request_code})");
            return Err(AppError::PermissionDenied { capability: "exact alarms" });
        }

        let fire_at = next_occurrence(&self.clock.now(), hour, minute)
            .ok_or_else(|| AppError::Internal(format!("no next occurrence for {hour:02}:{minute:02}")))?;

        self.lock_slots().insert(
            request_code,
            AlarmSlot { hour, minute, state: AlarmState::Scheduled { fire_at } },
        );
        log::debug!("Scheduled exact alarm for {hour:02}:{minute:02} at {fire_at} (code {request_code})");
        self.wake();
        Ok(fire_at)
    }

    /// Remove the alarm for `request_code`; returns whether one existed.
    pub fn cancel(&self, request_code: u32) -> bool {
        let removed = self.lock_slots().remove(&request_code).is_some();
        if removed {
            log::debug!("Canceled alarm with request code {request_code}");
            self.wake();
        }
        removed
    }

    /// Alarms waiting to fire, ordered by request code.
    pub fn armed(&self) -> Vec<ArmedAlarm> {
        self.lock_slots()
            .iter()
            .filter_map(|(&request_code, slot)| match slot.state {
                AlarmState::Scheduled { fire_at } => Some(ArmedAlarm {
                    hour: slot.hour,
                    minute: slot.minute,
                    request_code,
                    fire_at,
                }),
                AlarmState::Fired { .. } => None,
            })
            .collect()
    }

    pub fn state(&self, request_code: u32) -> Option<AlarmState> {
        self.lock_slots().get(&request_code).map(|slot| slot.state)
    }

    pub fn next_deadline(&self) -> Option<DateTime<Local>> {
        self.armed().into_iter().map(|a| a.fire_at).min()
    }

    /// Time until the next alarm is due, capped at `max_wait`.
    pub fn time_until_next(&self, max_wait: Duration) -> Duration {
        match self.next_deadline() {
            Some(deadline) => (deadline - self.clock.now())
                .to_std()
                .unwrap_or(Duration::ZERO)
                .min(max_wait),
            None => max_wait,
        }
    }

    /// Fire every alarm whose time has come: post its notification (if
    /// permitted) and re-arm it for the next day.
    pub fn fire_due(&self) -> Vec<FireOutcome> {
        let now = self.clock.now();

        let due: Vec<(u32, u8, u8, DateTime<Local>)> = {
            let mut slots = self.lock_slots();
            slots
                .iter_mut()
                .filter_map(|(&code, slot)| {
                    let current = slot.state;
                    match current {
                        AlarmState::Scheduled { fire_at } if fire_at <= now => {
                            slot.state = AlarmState::Fired { fired_at: now };
                            Some((code, slot.hour, slot.minute, fire_at))
                        }
                        AlarmState::Scheduled { .. } | AlarmState::Fired { .. } => None,
                    }
                })
                .collect()
        };

        due.into_iter()
            .map(|(code, hour, minute, fire_at)| {
                log::info!("Reminder {hour:02}:{minute:02} fired (code {code})");
                let notified = self.emit(code);
                let rearmed_for = self.rearm(code, hour, minute, fire_at.max(now));
                FireOutcome { request_code: code, notified, rearmed_for }
            })
            .collect()
    }

    fn emit(&self, request_code: u32) -> bool {
        if !self.platform.can_post_notifications() {
            log::debug!("Notification permission missing; skipping reminder (code {request_code})");
            return false;
        }

        let notification = Notification {
            channel_id: self.notification.channel_id.clone(),
            title: self.notification.title.clone(),
            body: self.notification.body.clone(),
            request_code,
        };
        match self.platform.post_notification(&notification) {
            Ok(()) => true,
            Err(e) => {
                log::warn!("Failed to post reminder notification (code {request_code}): {e}");
                false
            }
        }
    }

    /// Move a fired slot back to `Scheduled`, unless it was canceled or
    /// rescheduled while firing.
    fn rearm(&self, request_code: u32, hour: u8, minute: u8, after: DateTime<Local>) -> Option<DateTime<Local>> {
        let mut slots = self.lock_slots();
        let slot = slots.get_mut(&request_code)?;
        if !matches!(slot.state, AlarmState::Fired { .. }) {
            return None;
        }

        if !self.platform.can_schedule_exact_alarms() {
            log::warn!("Permission missing to re-arm alarm {hour:02}:{minute:02} (code {request_code})");
            slots.remove(&request_code);
            return None;
        }

        let Some(next) = next_occurrence(&after, hour, minute) else {
            slots.remove(&request_code);
            return None;
        };
        slot.state = AlarmState::Scheduled { fire_at: next };
        log::debug!("Re-armed alarm {hour:02}:{minute:02} for {next} (code {request_code})");
        Some(next)
    }

    /// Interrupt a pending [`AlarmScheduler::wait_for_change`].
    pub fn wake(&self) {
        // full means a wake is already pending; both ends live in self
        let _ = self.wake_tx.try_send(());
    }

    /// Sleep until woken or `timeout` elapses.
    pub fn wait_for_change(&self, timeout: Duration) {
        let _ = self.wake_rx.recv_timeout(timeout);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{local, FixedClock, RecordingPlatform};

    fn setup() -> (AlarmScheduler, Arc<FixedClock>, Arc<RecordingPlatform>) {
        let clock = Arc::new(FixedClock::at(local(2026, 6, 15, 10, 0)));
        let platform = Arc::new(RecordingPlatform::new());
        let scheduler = AlarmScheduler::new(
            Arc::clone(&platform) as Arc<dyn NotificationPlatform>,
            Arc::clone(&clock) as Arc<dyn Clock>,
            NotificationConfig::default(),
        );
        (scheduler, clock, platform)
    }

    #[test]
    fn test_repeated_wakes_coalesce() {
        let (scheduler, _clock, _platform) = setup();
        for _ in 0..1_000 {
            scheduler.schedule(12, 0, 720).unwrap();
            scheduler.cancel(720);
        }
        assert_eq!(scheduler.wake_rx.len(), 1);

        scheduler.wait_for_change(Duration::from_millis(10));
        assert!(scheduler.wake_rx.is_empty());

        let started = std::time::Instant::now();
        scheduler.wait_for_change(Duration::from_millis(50));
        assert!(started.elapsed() >= Duration::from_millis(50));
    }

    #[test]
    fn test_schedule_later_today() {
        let (scheduler, _clock, _platform) = setup();
        let fire_at = scheduler.schedule(12, 0, 720).unwrap();
        assert_eq!(fire_at, local(2026, 6, 15, 12, 0));
        assert_eq!(scheduler.armed().len(), 1);
    }

    #[test]
    fn test_schedule_past_time_targets_tomorrow() {
        let (scheduler, _clock, _platform) = setup();
        let fire_at = scheduler.schedule(9, 0, 540).unwrap();
        assert_eq!(fire_at, local(2026, 6, 16, 9, 0));
    }

    #[test]
    fn test_reschedule_replaces_same_code() {
        let (scheduler, _clock, _platform) = setup();
        scheduler.schedule(12, 0, 720).unwrap();
        scheduler.schedule(12, 0, 720).unwrap();
        scheduler.schedule(18, 0, 720).unwrap();

        let armed = scheduler.armed();
        assert_eq!(armed.len(), 1);
        assert_eq!(armed[0].hour, 18);
    }

    #[test]
    fn test_cancel() {
        let (scheduler, _clock, _platform) = setup();
        scheduler.schedule(12, 0, 720).unwrap();
        assert!(scheduler.cancel(720));
        assert!(scheduler.armed().is_empty());
        // unknown code is a no-op
        assert!(!scheduler.cancel(720));
    }

    #[test]
    fn test_schedule_without_exact_alarm_permission() {
        let (scheduler, _clock, platform) = setup();
        platform.set_exact_alarms(false);

        let result = scheduler.schedule(12, 0, 720);
        assert!(matches!(result, Err(AppError::PermissionDenied { .. })));
        assert!(scheduler.armed().is_empty());
    }

    #[test]
    fn test_schedule_rejects_invalid_time() {
        let (scheduler, _clock, _platform) = setup();
        assert!(scheduler.schedule(24, 0, 1440).is_err());
    }

    #[test]
    fn test_nothing_fires_early() {
        let (scheduler, clock, platform) = setup();
        scheduler.schedule(12, 0, 720).unwrap();
        clock.set(local(2026, 6, 15, 11, 59));

        assert!(scheduler.fire_due().is_empty());
        assert!(platform.posted().is_empty());
    }

    #[test]
    fn test_fire_notifies_and_rearms_next_day() {
        let (scheduler, clock, platform) = setup();
        scheduler.schedule(12, 0, 720).unwrap();
        clock.set(local(2026, 6, 15, 12, 0));

        let outcomes = scheduler.fire_due();
        assert_eq!(
            outcomes,
            vec![FireOutcome {
                request_code: 720,
                notified: true,
                rearmed_for: Some(local(2026, 6, 16, 12, 0)),
            }]
        );
        assert_eq!(platform.posted().len(), 1);
        assert_eq!(platform.posted()[0].request_code, 720);
        assert_eq!(
            scheduler.state(720),
            Some(AlarmState::Scheduled { fire_at: local(2026, 6, 16, 12, 0) })
        );

        // the same alarm does not fire twice for one occurrence
        assert!(scheduler.fire_due().is_empty());
    }

    #[test]
    fn test_recurs_daily() {
        let (scheduler, clock, platform) = setup();
        scheduler.schedule(12, 0, 720).unwrap();

        for day in 15..=18 {
            clock.set(local(2026, 6, day, 12, 0));
            assert_eq!(scheduler.fire_due().len(), 1);
        }
        assert_eq!(platform.posted().len(), 4);
        assert_eq!(scheduler.armed()[0].fire_at, local(2026, 6, 19, 12, 0));
    }

    #[test]
    fn test_late_fire_rearms_in_future() {
        let (scheduler, clock, _platform) = setup();
        scheduler.schedule(12, 0, 720).unwrap();
        // asleep for three days
        clock.set(local(2026, 6, 18, 15, 0));

        let outcomes = scheduler.fire_due();
        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].rearmed_for, Some(local(2026, 6, 19, 12, 0)));
    }

    #[test]
    fn test_missing_notification_permission_skips_but_rearms() {
        let (scheduler, clock, platform) = setup();
        platform.set_notifications(false);
        scheduler.schedule(12, 0, 720).unwrap();
        clock.set(local(2026, 6, 15, 12, 0));

        let outcomes = scheduler.fire_due();
        assert!(!outcomes[0].notified);
        assert!(outcomes[0].rearmed_for.is_some());
        assert!(platform.posted().is_empty());
    }

    #[test]
    fn test_revoked_exact_alarm_permission_stops_rearm() {
        let (scheduler, clock, platform) = setup();
        scheduler.schedule(12, 0, 720).unwrap();
        platform.set_exact_alarms(false);
        clock.set(local(2026, 6, 15, 12, 0));

        let outcomes = scheduler.fire_due();
        assert!(outcomes[0].notified);
        assert_eq!(outcomes[0].rearmed_for, None);
        assert!(scheduler.armed().is_empty());
    }

    #[test]
    fn test_time_until_next() {
        let (scheduler, _clock, _platform) = setup();
        let max = Duration::from_secs(60);
        assert_eq!(scheduler.time_until_next(max), max);

        scheduler.schedule(10, 0, 600).unwrap(); // tomorrow
        assert_eq!(scheduler.time_until_next(max), max);
        scheduler.schedule(10, 1, 601).unwrap(); // in one minute
        assert_eq!(scheduler.time_until_next(Duration::from_secs(3600)), Duration::from_secs(60));
    }
}
