//! Table-keyed change notifications and live queries.
//!
//! Every committed write publishes the tables it touched; a [`LiveQuery`]
//! recomputes its full result set whenever its table changes.

use crate::db::{with_connection, Database};
use crate::error::AppError;
use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use rusqlite::Connection;
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    Categories,
    Tasks,
}

struct Subscriber {
    table: Table,
    tx: Sender<Table>,
}

#[derive(Clone, Default)]
pub struct ChangeBus {
    subscribers: Arc<Mutex<Vec<Subscriber>>>,
}

impl ChangeBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, table: Table) -> Receiver<Table> {
        let (tx, rx) = unbounded();
        self.lock().push(Subscriber { table, tx });
        rx
    }

    /// Notify subscribers of each table in `tables`; drops subscribers whose receiver is gone.
    pub fn publish(&self, tables: &[Table]) {
        self.lock().retain(|sub| {
            if tables.contains(&sub.table) {
                sub.tx.send(sub.table).is_ok()
            } else {
                true
            }
        });
    }

    pub fn subscriber_count(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Subscriber>> {
        self.subscribers.lock().unwrap_or_else(|poisoned| {
            log::warn!("ChangeBus: subscriber list mutex was poisoned, recovering");
            poisoned.into_inner()
        })
    }
}

type Query<T> = Box<dyn Fn(&Connection) -> rusqlite::Result<T> + Send>;

/// A query that is re-run in full after each committed write to its table.
pub struct LiveQuery<T> {
    changes: Receiver<Table>,
    reader: Arc<Mutex<Database>>,
    query: Query<T>,
    label: &'static str,
}

impl<T> LiveQuery<T> {
    pub(crate) fn new(
        changes: Receiver<Table>,
        reader: Arc<Mutex<Database>>,
        label: &'static str,
        query: Query<T>,
    ) -> Self {
        Self { changes, reader, query, label }
    }

    /// Current result set, without waiting for a change.
    pub fn current(&self) -> Result<T, AppError> {
        with_connection(&self.reader, self.label, |conn| (self.query)(conn))
    }

    /// Block until the table changes, then return the fresh result set.
    pub fn recv(&self) -> Result<T, AppError> {
        self.changes.recv().map_err(|_| AppError::WriterClosed)?;
        self.drain_and_query()
    }

    /// Like [`LiveQuery::recv`] but gives up after `timeout`, returning `None`.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<Option<T>, AppError> {
        match self.changes.recv_timeout(timeout) {
            Ok(_) => self.drain_and_query().map(Some),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => Err(AppError::WriterClosed),
        }
    }

    /// Fresh result set if the table changed since the last call, else `None`.
    pub fn try_recv(&self) -> Result<Option<T>, AppError> {
        if self.changes.try_recv().is_ok() {
            self.drain_and_query().map(Some)
        } else {
            Ok(None)
        }
    }

    // several queued notifications collapse into one recomputation
    fn drain_and_query(&self) -> Result<T, AppError> {
        while self.changes.try_recv().is_ok() {}
        self.current()
    }
}
