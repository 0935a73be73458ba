pub mod types;

pub use types::{Notification, NotificationPlatform};

#[cfg(any(target_os = "macos", target_os = "linux"))]
mod command;

#[cfg(target_os = "macos")]
pub mod macos;

#[cfg(target_os = "linux")]
pub mod linux;

#[cfg(target_os = "macos")]
pub use macos::MacOSNotifier as NativeNotifier;

#[cfg(target_os = "linux")]
pub use linux::LinuxNotifier as NativeNotifier;

// Fallback for other platforms: notifications only reach the log
#[cfg(not(any(target_os = "macos", target_os = "linux")))]
pub struct NativeNotifier;

#[cfg(not(any(target_os = "macos", target_os = "linux")))]
impl NotificationPlatform for NativeNotifier {
    fn can_schedule_exact_alarms(&self) -> bool {
        true
    }

    fn can_post_notifications(&self) -> bool {
        true
    }

    fn post_notification(&self, notification: &Notification) -> Result<(), crate::error::AppError> {
        log::info!("Reminder: {} - {}", notification.title, notification.body);
        Ok(())
    }
}

#[cfg(not(any(target_os = "macos", target_os = "linux")))]
impl NativeNotifier {
    pub fn new() -> Self { Self }
}
