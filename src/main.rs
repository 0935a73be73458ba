//! Tasktide host process.
//!
//! Serves length-prefixed JSON requests on stdin/stdout while the alarm
//! thread delivers reminders. Logs go to stderr so stdout stays a clean
//! protocol channel.

use log::{error, info, warn};
use std::process::ExitCode;
use tasktide_lib::config::AppConfig;
use tasktide_lib::App;

fn init_logging() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
}

fn main() -> ExitCode {
    init_logging();

    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load config: {e}");
            return ExitCode::FAILURE;
        }
    };

    let app = match App::init(config) {
        Ok(app) => app,
        Err(e) => {
            error!("Tasktide initialization failed: {e}");
            return ExitCode::FAILURE;
        }
    };

    let report = app.startup();
    info!("{} reminder(s) armed at startup", report.scheduled.len());

    let alarms = app.alarm_service();
    let alarm_thread = match alarms.start() {
        Ok(handle) => Some(handle),
        Err(e) => {
            // the host still works; reminders just won't fire this session
            error!("Failed to start alarm service: {e}");
            None
        }
    };

    let host = app.host();
    let result = host.run(&mut std::io::stdin().lock(), &mut std::io::stdout().lock());

    alarms.stop();
    if let Some(handle) = alarm_thread {
        if handle.join().is_err() {
            warn!("Alarm thread panicked");
        }
    }

    match result {
        Ok(()) => {
            info!("Tasktide shut down cleanly");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Host error: {e}");
            ExitCode::FAILURE
        }
    }
}
