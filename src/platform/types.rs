use crate::error::AppError;

/// A user-visible reminder notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub channel_id: String,
    pub title: String,
    pub body: String,
    /// Request code of the alarm that produced it.
    pub request_code: u32,
}

/// OS services the reminder engine depends on.
///
/// Both capabilities are runtime-granted and checked on every use: exact
/// alarms when arming, notifications when posting.
pub trait NotificationPlatform: Send + Sync {
    fn can_schedule_exact_alarms(&self) -> bool;
    fn can_post_notifications(&self) -> bool;
    fn post_notification(&self, notification: &Notification) -> Result<(), AppError>;
}
