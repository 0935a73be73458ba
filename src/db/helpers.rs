// src/db/helpers.rs

use crate::db::Database;
use crate::error::AppError;
use rusqlite::{Connection, Transaction};
use std::sync::{Mutex, MutexGuard};

/// Lock the database mutex, recovering from poisoning if necessary.
pub fn lock_db<'a>(db: &'a Mutex<Database>, context: &str) -> MutexGuard<'a, Database> {
    match db.lock() {
        Ok(guard) => guard,
        Err(poisoned) => {
            log::warn!("{context}: database mutex was poisoned, recovering");
            poisoned.into_inner()
        }
    }
}

/// Execute a read against a shared connection with lock handling and error logging.
///
/// # Example
/// ```ignore
/// with_connection(&reader, "load categories", |conn| {
///     Category::find_all(conn)
/// })
/// ```
pub fn with_connection<F, T>(db: &Mutex<Database>, operation: &str, f: F) -> Result<T, AppError>
where
    F: FnOnce(&Connection) -> rusqlite::Result<T>,
{
    let db = lock_db(db, operation);
    f(db.connection()).map_err(|e| {
        log::error!("Failed to {operation}: {e}");
        AppError::from(e)
    })
}

/// Run `f` inside a single transaction; commits on `Ok`, rolls back on `Err`.
pub fn in_transaction<F, T>(db: &mut Database, f: F) -> Result<T, AppError>
where
    F: FnOnce(&Transaction<'_>) -> Result<T, AppError>,
{
    let tx = db.connection_mut().transaction()?;
    let value = f(&tx)?;
    tx.commit()?;
    Ok(value)
}
