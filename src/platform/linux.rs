use super::command;
use super::types::{Notification, NotificationPlatform};
use crate::error::AppError;
use std::process::Command;

const NOTIFY_SEND: &str = "notify-send";

/// Posts notifications through the desktop notification daemon via `notify-send`.
pub struct LinuxNotifier {
    available: bool,
}

impl LinuxNotifier {
    pub fn new() -> Self {
        let available = command::on_path(NOTIFY_SEND)
            && std::env::var_os("DBUS_SESSION_BUS_ADDRESS").is_some();
        if !available {
            log::warn!("{NOTIFY_SEND} or a session bus is unavailable; reminders will not be shown");
        }
        Self { available }
    }
}

impl Default for LinuxNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl NotificationPlatform for LinuxNotifier {
    // timers live in-process; no extra capability is needed to arm them
    fn can_schedule_exact_alarms(&self) -> bool {
        true
    }

    fn can_post_notifications(&self) -> bool {
        self.available
    }

    fn post_notification(&self, notification: &Notification) -> Result<(), AppError> {
        let mut cmd = Command::new(NOTIFY_SEND);
        cmd.arg("--app-name")
            .arg(&notification.channel_id)
            .arg(&notification.title)
            .arg(&notification.body);
        command::run(cmd, NOTIFY_SEND)
    }
}
