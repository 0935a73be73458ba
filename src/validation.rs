use crate::constants::{MAX_CATEGORY_NAME_LEN, MAX_TASK_NAME_LEN};
use crate::error::AppError;

/// Validate a reminder hour and minute (24-hour clock).
pub fn validate_hour_minute(hour: u8, minute: u8) -> Result<(), AppError> {
    if hour >= 24 {
        return Err(AppError::InvalidInput {
            field: "hour",
            reason: "must be 0-23".into(),
        });
    }
    if minute >= 60 {
        return Err(AppError::InvalidInput {
            field: "minute",
            reason: "must be 0-59".into(),
        });
    }
    Ok(())
}

/// Validate category name.
pub fn validate_category_name(name: &str) -> Result<&str, AppError> {
    validate_name("name", name, MAX_CATEGORY_NAME_LEN)
}

/// Validate task name.
pub fn validate_task_name(name: &str) -> Result<&str, AppError> {
    validate_name("name", name, MAX_TASK_NAME_LEN)
}

fn validate_name<'a>(field: &'static str, name: &'a str, max_len: usize) -> Result<&'a str, AppError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::InvalidInput {
            field,
            reason: "cannot be empty".into(),
        });
    }
    if name.chars().count() > max_len {
        return Err(AppError::InvalidInput {
            field,
            reason: format!("cannot exceed {max_len} characters"),
        });
    }
    Ok(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_hour_minute_valid() {
        assert!(validate_hour_minute(0, 0).is_ok());
        assert!(validate_hour_minute(9, 30).is_ok());
        assert!(validate_hour_minute(23, 59).is_ok());
    }

    #[test]
    fn test_validate_hour_minute_invalid() {
        assert!(validate_hour_minute(24, 0).is_err());
        assert!(validate_hour_minute(12, 60).is_err());
    }

    #[test]
    fn test_validate_category_name_trims() {
        assert_eq!(validate_category_name("  Work  ").unwrap(), "Work");
    }

    #[test]
    fn test_validate_category_name_empty() {
        assert!(validate_category_name("").is_err());
        assert!(validate_category_name("   ").is_err());
    }

    #[test]
    fn test_validate_category_name_too_long() {
        let name = "x".repeat(MAX_CATEGORY_NAME_LEN + 1);
        assert!(validate_category_name(&name).is_err());
    }

    #[test]
    fn test_validate_task_name() {
        assert_eq!(validate_task_name("Write report").unwrap(), "Write report");
        assert!(validate_task_name(&"y".repeat(MAX_TASK_NAME_LEN + 1)).is_err());
    }
}
