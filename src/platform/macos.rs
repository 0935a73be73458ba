use super::command;
use super::types::{Notification, NotificationPlatform};
use crate::error::AppError;
use std::process::Command;

const OSASCRIPT: &str = "osascript";

pub struct MacOSNotifier;

impl MacOSNotifier {
    pub fn new() -> Self {
        Self
    }
}

impl Default for MacOSNotifier {
    fn default() -> Self {
        Self::new()
    }
}

/// Quote a string for an AppleScript literal.
fn applescript_quote(text: &str) -> String {
    format!("\"{}\"", text.replace('\\', "\\\\").replace('"', "\\\""))
}

impl NotificationPlatform for MacOSNotifier {
    fn can_schedule_exact_alarms(&self) -> bool {
        true
    }

    fn can_post_notifications(&self) -> bool {
        command::on_path(OSASCRIPT)
    }

    fn post_notification(&self, notification: &Notification) -> Result<(), AppError> {
        let script = format!(
            "display notification {} with title {}",
            applescript_quote(&notification.body),
            applescript_quote(&notification.title),
        );
        let mut cmd = Command::new(OSASCRIPT);
        cmd.arg("-e").arg(script);
        command::run(cmd, OSASCRIPT)
    }
}
