pub mod category;
pub mod task;
pub mod reminder_time;

pub use category::Category;
pub use task::{Task, TaskGroup};
pub use reminder_time::{ReminderKey, ReminderTime};
