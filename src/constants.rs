// src/constants.rs

/// Milliseconds in one hour
pub const MILLIS_PER_HOUR: i64 = 60 * 60 * 1000;

/// Completed tasks older than this are purged at startup (24 hours)
pub const DEFAULT_RETENTION_HOURS: u32 = 24;

/// Maximum category name length
pub const MAX_CATEGORY_NAME_LEN: usize = 100;

/// Maximum task name length
pub const MAX_TASK_NAME_LEN: usize = 500;

/// Upper bound on a single alarm-thread sleep, so wall-clock jumps are noticed
pub const DEFAULT_MAX_ALARM_WAIT_SECS: u64 = 60;

/// Maximum host protocol message size (1 MiB)
pub const MAX_MESSAGE_SIZE: usize = 1024 * 1024;
