use thiserror::Error;

/// Application error type
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Constraint violated: {0}")]
    Constraint(String),

    #[error("{entity} not found")]
    NotFound { entity: &'static str },

    #[error("Invalid {field}: {reason}")]
    InvalidInput { field: &'static str, reason: String },

    #[error("Permission denied: {capability}")]
    PermissionDenied { capability: &'static str },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Database error: {0}")]
    Database(#[source] rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Store writer is closed")]
    WriterClosed,

    #[error("{0}")]
    Internal(String),
}

impl From<rusqlite::Error> for AppError {
    fn from(e: rusqlite::Error) -> Self {
        if is_fk_violation(&e) {
            AppError::Constraint(format!("{e}: referenced row does not exist"))
        } else if is_constraint_violation(&e) {
            AppError::Constraint(e.to_string())
        } else {
            AppError::Database(e)
        }
    }
}

// Host responses carry errors as plain messages
impl From<AppError> for String {
    fn from(e: AppError) -> Self {
        e.to_string()
    }
}

/// Check if a rusqlite error is any constraint violation (FK, CHECK, NOT NULL, PK)
pub fn is_constraint_violation(e: &rusqlite::Error) -> bool {
    matches!(e, rusqlite::Error::SqliteFailure(err, _)
        if err.code == rusqlite::ffi::ErrorCode::ConstraintViolation)
}

/// Check if a rusqlite error is a FOREIGN KEY constraint violation
pub fn is_fk_violation(e: &rusqlite::Error) -> bool {
    e.to_string().contains("FOREIGN KEY constraint failed")
}
