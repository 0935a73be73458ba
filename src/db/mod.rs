pub mod schema;
pub mod migrations;
pub mod helpers;
pub use helpers::{in_transaction, lock_db, with_connection};

use rusqlite::{Connection, Result};
use std::path::Path;
use std::time::Duration;

/// How long a connection waits on a locked database before failing.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open a connection with foreign keys enforced and WAL journaling,
    /// so readers never block on (or observe) an uncommitted write.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.pragma_update(None, "foreign_keys", true)?;
        let mode: String =
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
        log::debug!("Opened {} (journal_mode={mode})", path.display());
        Ok(Self { conn })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn connection_mut(&mut self) -> &mut Connection {
        &mut self.conn
    }
}
