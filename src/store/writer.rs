//! Single sequential writer for the store.
//!
//! All mutations run on one dedicated thread, strictly in submission order,
//! against a connection no other code touches.

use crate::db::Database;
use crate::error::AppError;
use crossbeam_channel::{bounded, unbounded, Receiver, Sender};
use std::thread::{self, JoinHandle};

type Job = Box<dyn FnOnce(&mut Database) + Send>;

/// Handle to the result of a queued write.
///
/// Dropping it without calling [`PendingWrite::wait`] leaves the write
/// fire-and-forget; it still runs.
#[must_use = "call wait() to observe the committed result, or drop to fire and forget"]
pub struct PendingWrite<T> {
    rx: Receiver<Result<T, AppError>>,
}

impl<T> PendingWrite<T> {
    /// A write that resolved before reaching the queue (e.g. failed validation).
    pub fn ready(result: Result<T, AppError>) -> Self {
        let (tx, rx) = bounded(1);
        // capacity 1 and a live receiver: cannot fail
        let _ = tx.send(result);
        Self { rx }
    }

    /// Block until the write has committed (or failed).
    pub fn wait(self) -> Result<T, AppError> {
        self.rx.recv().map_err(|_| AppError::WriterClosed)?
    }
}

pub struct WriteQueue {
    tx: Option<Sender<Job>>,
    handle: Option<JoinHandle<()>>,
}

impl WriteQueue {
    /// Move `db` onto a new writer thread.
    pub fn spawn(mut db: Database) -> std::io::Result<Self> {
        let (tx, rx) = unbounded::<Job>();

        let handle = thread::Builder::new()
            .name("store-writer".into())
            .spawn(move || {
                for job in rx {
                    job(&mut db);
                }
                log::debug!("Store writer drained, exiting");
            })?;

        Ok(Self {
            tx: Some(tx),
            handle: Some(handle),
        })
    }

    /// Queue `f` to run on the writer thread.
    pub fn submit<T, F>(&self, f: F) -> PendingWrite<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Database) -> Result<T, AppError> + Send + 'static,
    {
        let Some(queue) = self.tx.as_ref() else {
            return PendingWrite::ready(Err(AppError::WriterClosed));
        };

        let (reply_tx, reply_rx) = bounded(1);
        let job: Job = Box::new(move |db| {
            let result = f(db);
            if let Err(e) = &result {
                log::error!("Store write failed: {e}");
            }
            // nobody waiting is fine: the caller chose fire-and-forget
            let _ = reply_tx.send(result);
        });

        if queue.send(job).is_err() {
            log::error!("Store writer thread is gone; dropping write");
            return PendingWrite::ready(Err(AppError::WriterClosed));
        }
        PendingWrite { rx: reply_rx }
    }
}

impl Drop for WriteQueue {
    fn drop(&mut self) {
        // closing the channel lets the thread finish queued jobs and exit
        self.tx.take();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::error!("Store writer thread panicked");
            }
        }
    }
}
