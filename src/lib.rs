pub mod alarm;
pub mod clock;
pub mod config;
pub mod constants;
pub mod db;
pub mod error;
pub mod host;
pub mod maintenance;
pub mod models;
pub mod platform;
pub mod prefs;
pub mod reconciler;
pub mod reminders;
pub mod store;
#[cfg(test)]
mod test_utils;
pub mod validation;

use crate::alarm::{AlarmScheduler, AlarmService};
use crate::clock::{Clock, SystemClock};
use crate::config::AppConfig;
use crate::error::AppError;
use crate::host::Host;
use crate::platform::{NativeNotifier, NotificationPlatform};
use crate::prefs::ReminderLedger;
use crate::reconciler::ReconcileReport;
use crate::reminders::ReminderService;
use crate::store::Store;
use log::{info, warn};
use std::path::Path;
use std::sync::Arc;

/// Error type for Tasktide initialization failures
#[derive(Debug)]
pub enum InitError {
    Config(AppError),
    NoProjectDirs,
    DataDirCreation(std::io::Error),
    StoreOpen(AppError),
}

impl std::fmt::Display for InitError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InitError::Config(e) => write!(f, "Invalid configuration: {e}"),
            InitError::NoProjectDirs => write!(f, "Could not determine project directories"),
            InitError::DataDirCreation(e) => write!(f, "Could not create data directory: {e}"),
            InitError::StoreOpen(e) => write!(f, "Failed to open task store: {e}"),
        }
    }
}

impl std::error::Error for InitError {}

/// Everything the binary runs, wired together.
pub struct App {
    pub config: AppConfig,
    pub clock: Arc<dyn Clock>,
    pub store: Arc<Store>,
    pub ledger: Arc<ReminderLedger>,
    pub scheduler: Arc<AlarmScheduler>,
    pub reminders: Arc<ReminderService>,
}

impl App {
    /// Open the app in the configured data directory with the system clock
    /// and the native notifier.
    pub fn init(config: AppConfig) -> Result<Self, InitError> {
        config.validate().map_err(InitError::Config)?;
        let data_dir = config.resolve_data_dir().ok_or(InitError::NoProjectDirs)?;
        std::fs::create_dir_all(&data_dir).map_err(InitError::DataDirCreation)?;

        Self::open_in(
            config,
            &data_dir,
            Arc::new(SystemClock),
            Arc::new(NativeNotifier::new()),
        )
    }

    pub fn open_in(
        config: AppConfig,
        data_dir: &Path,
        clock: Arc<dyn Clock>,
        platform: Arc<dyn NotificationPlatform>,
    ) -> Result<Self, InitError> {
        let db_path = data_dir.join(&config.database_file);
        let store = Store::open(&db_path, Arc::clone(&clock)).map_err(InitError::StoreOpen)?;
        info!("Opened task store at {}", db_path.display());

        let ledger = Arc::new(ReminderLedger::open(&data_dir.join(&config.preferences_file)));
        let scheduler = Arc::new(AlarmScheduler::new(
            platform,
            Arc::clone(&clock),
            config.notification.clone(),
        ));
        let reminders = Arc::new(ReminderService::new(Arc::clone(&ledger), Arc::clone(&scheduler)));

        Ok(Self {
            config,
            clock,
            store: Arc::new(store),
            ledger,
            scheduler,
            reminders,
        })
    }

    /// Cold-start work: purge old completed tasks, upgrade legacy reminder
    /// keys, then re-arm every enabled reminder.
    pub fn startup(&self) -> ReconcileReport {
        if let Err(e) = maintenance::sweep(&self.store, self.clock.as_ref(), self.config.retention_millis()) {
            warn!("Maintenance sweep failed: {e}");
        }
        if let Err(e) = self.ledger.migrate_legacy() {
            warn!("Legacy reminder migration failed: {e}");
        }
        reconciler::reconcile(&self.ledger, &self.scheduler)
    }

    pub fn alarm_service(&self) -> AlarmService {
        AlarmService::new(Arc::clone(&self.scheduler), self.config.max_alarm_wait())
    }

    pub fn host(&self) -> Host {
        Host::new(Arc::clone(&self.store), Arc::clone(&self.reminders))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ReminderTime;
    use crate::prefs::Preferences;
    use crate::test_utils::{FixedClock, RecordingPlatform};
    use tempfile::tempdir;

    #[test]
    fn test_startup_sweeps_and_reconciles() {
        let dir = tempdir().unwrap();
        let clock = Arc::new(FixedClock::default());
        let config = AppConfig::default();

        Preferences::open(&dir.path().join(&config.preferences_file))
            .put_bool("notify_12", true)
            .unwrap();

        let app = App::open_in(
            config,
            dir.path(),
            Arc::clone(&clock) as Arc<dyn Clock>,
            Arc::new(RecordingPlatform::new()),
        )
        .unwrap();

        let cat = app.store.insert_category("Work").wait().unwrap();
        let task = app.store.create_task("old", cat.id).wait().unwrap();
        app.store.set_task_done(&task, true).wait().unwrap();
        clock.advance_secs(2 * 24 * 3600);

        let report = app.startup();
        assert_eq!(report.scheduled, vec![720]);
        assert!(app.store.query_all_tasks().unwrap().is_empty());
        assert_eq!(
            app.reminders.list(),
            vec![
                ReminderTime::new(9, 0, false).unwrap(),
                ReminderTime::new(12, 0, true).unwrap(),
                ReminderTime::new(18, 0, false).unwrap(),
            ]
        );

        // a second start re-arms the same set
        app.startup();
        assert_eq!(app.scheduler.armed().len(), 1);
    }

    #[test]
    fn test_init_rejects_invalid_config() {
        let config = AppConfig { retention_hours: 0, ..AppConfig::default() };
        assert!(matches!(App::init(config), Err(InitError::Config(_))));
    }

    #[test]
    fn test_init_error_display() {
        assert_eq!(
            InitError::NoProjectDirs.to_string(),
            "Could not determine project directories"
        );
    }
}
