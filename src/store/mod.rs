//! Durable category/task store.
//!
//! Writes go through a single [`WriteQueue`] thread, each in its own
//! transaction, and publish a [`Table`] change after commit. Reads use a
//! separate connection, so they see either the pre- or post-write state.

pub mod changes;
pub mod writer;

pub use changes::{ChangeBus, LiveQuery, Table};
pub use writer::{PendingWrite, WriteQueue};

use crate::clock::Clock;
use crate::db::{in_transaction, migrations, with_connection, Database};
use crate::error::AppError;
use crate::models::{Category, Task, TaskGroup};
use crate::validation::{validate_category_name, validate_task_name};
use std::path::Path;
use std::sync::{Arc, Mutex};

pub struct Store {
    writer: WriteQueue,
    reader: Arc<Mutex<Database>>,
    changes: ChangeBus,
    clock: Arc<dyn Clock>,
}

impl Store {
    /// Open (and migrate) the database at `path`.
    pub fn open(path: &Path, clock: Arc<dyn Clock>) -> Result<Self, AppError> {
        let write_db = Database::open(path)?;
        migrations::run(write_db.connection())?;
        let read_db = Database::open(path)?;

        Ok(Self {
            writer: WriteQueue::spawn(write_db)?,
            reader: Arc::new(Mutex::new(read_db)),
            changes: ChangeBus::new(),
            clock,
        })
    }

    pub fn changes(&self) -> &ChangeBus {
        &self.changes
    }

    /// Run `f` in a transaction on the writer thread and publish `tables` once it commits.
    fn write<T, F>(&self, tables: &'static [Table], f: F) -> PendingWrite<T>
    where
        T: Send + 'static,
        F: FnOnce(&rusqlite::Connection) -> Result<T, AppError> + Send + 'static,
    {
        let changes = self.changes.clone();
        self.writer.submit(move |db| {
            let value = in_transaction(db, |tx| f(tx))?;
            changes.publish(tables);
            Ok(value)
        })
    }

    // ── Categories ────────────────────────────────────────────────

    pub fn insert_category(&self, name: &str) -> PendingWrite<Category> {
        let name = match validate_category_name(name) {
            Ok(name) => name.to_string(),
            Err(e) => return PendingWrite::ready(Err(e)),
        };
        self.write(&[Table::Categories], move |conn| {
            Ok(Category::create(conn, &name)?)
        })
    }

    /// Delete a category and, atomically, every task that references it.
    pub fn delete_category(&self, category: &Category) -> PendingWrite<bool> {
        let id = category.id;
        self.write(&[Table::Categories, Table::Tasks], move |conn| {
            let deleted = Category::delete(conn, id)?;
            if deleted {
                log::info!("Deleted category {id} and its tasks");
            }
            Ok(deleted)
        })
    }

    pub fn rename_category(&self, category: &Category, new_name: &str) -> PendingWrite<bool> {
        let name = match validate_category_name(new_name) {
            Ok(name) => name.to_string(),
            Err(e) => return PendingWrite::ready(Err(e)),
        };
        let id = category.id;
        self.write(&[Table::Categories], move |conn| {
            Ok(Category::rename(conn, id, &name)?)
        })
    }

    pub fn query_all_categories(&self) -> Result<Vec<Category>, AppError> {
        with_connection(&self.reader, "load categories", Category::find_all)
    }

    pub fn find_category(&self, id: i64) -> Result<Option<Category>, AppError> {
        with_connection(&self.reader, "load category", |conn| Category::find_by_id(conn, id))
    }

    pub fn find_category_by_name(&self, name: &str) -> Result<Option<Category>, AppError> {
        with_connection(&self.reader, "load category", |conn| Category::find_by_name(conn, name))
    }

    // ── Tasks ─────────────────────────────────────────────────────

    /// Insert `task`; the returned copy carries the generated id.
    pub fn insert_task(&self, mut task: Task) -> PendingWrite<Task> {
        match validate_task_name(&task.name) {
            Ok(name) => task.name = name.to_string(),
            Err(e) => return PendingWrite::ready(Err(e)),
        }
        self.write(&[Table::Tasks], move |conn| {
            task.save(conn)?;
            Ok(task)
        })
    }

    /// Create and insert a new undone task stamped with the current time.
    pub fn create_task(&self, name: &str, category_id: i64) -> PendingWrite<Task> {
        self.insert_task(Task::new(name, category_id, self.clock.now_millis()))
    }

    pub fn update_task(&self, task: &Task) -> PendingWrite<bool> {
        let task = task.clone();
        if let Err(e) = validate_task_name(&task.name) {
            return PendingWrite::ready(Err(e));
        }
        self.write(&[Table::Tasks], move |conn| Ok(task.update(conn)?))
    }

    /// Toggle completion: stamps `timestamp_done` with now, or resets it to 0.
    ///
    /// Only the completion columns are written; the returned task is the row
    /// as committed, so other fields reflect any earlier writes.
    pub fn set_task_done(&self, task: &Task, done: bool) -> PendingWrite<Task> {
        let Some(id) = task.id else {
            return PendingWrite::ready(Err(AppError::NotFound { entity: "Task" }));
        };
        let mut toggled = task.clone();
        toggled.set_done(done, self.clock.now_millis());
        let timestamp_done = toggled.timestamp_done;
        self.write(&[Table::Tasks], move |conn| {
            if !Task::set_done_by_id(conn, id, done, timestamp_done)? {
                return Err(AppError::NotFound { entity: "Task" });
            }
            Task::find_by_id(conn, id)?.ok_or(AppError::NotFound { entity: "Task" })
        })
    }

    pub fn rename_task(&self, task: &Task, new_name: &str) -> PendingWrite<bool> {
        let name = match validate_task_name(new_name) {
            Ok(name) => name.to_string(),
            Err(e) => return PendingWrite::ready(Err(e)),
        };
        let Some(id) = task.id else {
            return PendingWrite::ready(Err(AppError::NotFound { entity: "Task" }));
        };
        self.write(&[Table::Tasks], move |conn| Ok(Task::rename(conn, id, &name)?))
    }

    pub fn delete_task(&self, task: &Task) -> PendingWrite<bool> {
        let Some(id) = task.id else {
            return PendingWrite::ready(Ok(false));
        };
        self.write(&[Table::Tasks], move |conn| Ok(Task::delete(conn, id)?))
    }

    /// Delete completed tasks whose `timestamp_done` is before `cutoff`; returns the count.
    ///
    /// Idempotent: a second run with the same cutoff deletes nothing.
    pub fn purge_completed_before(&self, cutoff: i64) -> PendingWrite<usize> {
        let changes = self.changes.clone();
        self.writer.submit(move |db| {
            let purged = in_transaction(db, |tx| Ok(Task::purge_completed_before(tx, cutoff)?))?;
            if purged > 0 {
                changes.publish(&[Table::Tasks]);
            }
            Ok(purged)
        })
    }

    pub fn find_task(&self, id: i64) -> Result<Option<Task>, AppError> {
        with_connection(&self.reader, "load task", |conn| Task::find_by_id(conn, id))
    }

    pub fn query_all_tasks(&self) -> Result<Vec<Task>, AppError> {
        with_connection(&self.reader, "load tasks", Task::find_all)
    }

    pub fn query_tasks_by_category(&self, category_id: i64) -> Result<Vec<Task>, AppError> {
        with_connection(&self.reader, "load tasks", |conn| {
            Task::find_by_category(conn, category_id)
        })
    }

    pub fn query_task_groups(&self) -> Result<Vec<TaskGroup>, AppError> {
        with_connection(&self.reader, "load task groups", Task::find_grouped)
    }

    // ── Observers ─────────────────────────────────────────────────

    pub fn observe_all_tasks(&self) -> LiveQuery<Vec<Task>> {
        self.observe(Table::Tasks, "load tasks", Box::new(Task::find_all))
    }

    pub fn observe_tasks_by_category(&self, category_id: i64) -> LiveQuery<Vec<Task>> {
        self.observe(
            Table::Tasks,
            "load tasks",
            Box::new(move |conn| Task::find_by_category(conn, category_id)),
        )
    }

    pub fn observe_categories(&self) -> LiveQuery<Vec<Category>> {
        self.observe(Table::Categories, "load categories", Box::new(Category::find_all))
    }

    fn observe<T>(
        &self,
        table: Table,
        label: &'static str,
        query: Box<dyn Fn(&rusqlite::Connection) -> rusqlite::Result<T> + Send>,
    ) -> LiveQuery<T> {
        LiveQuery::new(self.changes.subscribe(table), Arc::clone(&self.reader), label, query)
    }
}
