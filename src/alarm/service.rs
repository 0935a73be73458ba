use super::AlarmScheduler;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Background thread that fires alarms as they come due.
pub struct AlarmService {
    scheduler: Arc<AlarmScheduler>,
    running: Arc<AtomicBool>,
    max_wait: Duration,
}

impl AlarmService {
    pub fn new(scheduler: Arc<AlarmScheduler>, max_wait: Duration) -> Self {
        Self {
            scheduler,
            running: Arc::new(AtomicBool::new(false)),
            max_wait,
        }
    }

    pub fn start(&self) -> std::io::Result<thread::JoinHandle<()>> {
        self.running.store(true, Ordering::SeqCst);

        let running = Arc::clone(&self.running);
        let scheduler = Arc::clone(&self.scheduler);
        let max_wait = self.max_wait;

        thread::Builder::new().name("alarm-service".into()).spawn(move || {
            log::info!("Alarm service started");
            while running.load(Ordering::SeqCst) {
                scheduler.fire_due();
                // wakes early when alarms change or stop() is called
                scheduler.wait_for_change(scheduler.time_until_next(max_wait));
            }
            log::info!("Alarm service stopped");
        })
    }

    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
        self.scheduler.wake();
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}
