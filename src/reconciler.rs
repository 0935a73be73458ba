//! Boot-time restoration of reminder alarms.

use crate::alarm::AlarmScheduler;
use crate::prefs::ReminderLedger;
use std::collections::BTreeSet;

/// Outcome of one [`reconcile`] pass.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Request codes armed by this pass.
    pub scheduled: Vec<u32>,
    pub disabled: usize,
    pub malformed: usize,
    /// Later entries repeating an earlier `(hour, minute)`; the first one wins.
    pub duplicates: usize,
    /// Enabled entries the scheduler refused (e.g. missing permission).
    pub failed: Vec<u32>,
}

/// Arm every enabled reminder in the ledger.
///
/// Safe to run repeatedly: `schedule` replaces by request code, so a second
/// pass leaves the same set of armed alarms. Disabled entries are skipped
/// without a cancel, and a malformed entry never stops the rest.
pub fn reconcile(ledger: &ReminderLedger, scheduler: &AlarmScheduler) -> ReconcileReport {
    let mut report = ReconcileReport::default();

    let entries = match ledger.entries() {
        Ok(entries) => entries,
        Err(e) => {
            log::warn!("Reminder list unreadable, nothing to reconcile: {e}");
            return report;
        }
    };

    let mut seen = BTreeSet::new();
    for entry in entries {
        let time = match entry {
            Ok(time) => time,
            Err(e) => {
                log::warn!("Skipping malformed reminder entry: {e}");
                report.malformed += 1;
                continue;
            }
        };

        // same first-wins rule the ledger applies on load
        if !seen.insert(time.key()) {
            log::warn!("Skipping duplicate reminder {:02}:{:02}", time.hour, time.minute);
            report.duplicates += 1;
            continue;
        }

        if !time.is_enabled {
            report.disabled += 1;
            continue;
        }

        let code = time.request_code();
        match scheduler.schedule(time.hour, time.minute, code) {
            Ok(_) => report.scheduled.push(code),
            Err(e) => {
                log::warn!("Could not arm reminder {:02}:{:02}: {e}", time.hour, time.minute);
                report.failed.push(code);
            }
        }
    }

    log::info!(
        "Reconciled reminders: {} armed, {} disabled, {} malformed, {} duplicate, {} failed",
        report.scheduled.len(),
        report.disabled,
        report.malformed,
        report.duplicates,
        report.failed.len()
    );
    report
}
