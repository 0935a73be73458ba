use super::Category;
use rusqlite::{params, Connection, Result, Row};
use serde::Serialize;

/// Undone tasks first, newest-created first within each group.
/// `id DESC` breaks ties between tasks created in the same millisecond.
const TASK_ORDER: &str = "ORDER BY isDone ASC, timestampCreated DESC, id DESC";

const TASK_COLUMNS: &str = "id, name, isDone, timestampCreated, timestampDone, categoryId";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: Option<i64>,
    pub name: String,
    pub is_done: bool,
    /// Epoch millis.
    pub timestamp_created: i64,
    /// Epoch millis; 0 while the task is not done.
    pub timestamp_done: i64,
    pub category_id: i64,
}

/// A category together with its tasks, for grouped list views.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskGroup {
    pub category: Category,
    pub tasks: Vec<Task>,
}

impl Task {
    /// Create a new, undone task (not yet saved to database).
    pub fn new(name: &str, category_id: i64, timestamp_created: i64) -> Self {
        Self {
            id: None,
            name: name.to_string(),
            is_done: false,
            timestamp_created,
            timestamp_done: 0,
            category_id,
        }
    }

    /// Set completion state, keeping `timestamp_done` consistent with it.
    pub fn set_done(&mut self, done: bool, now_millis: i64) {
        self.is_done = done;
        // a zero or negative clock reading would break the done invariant
        self.timestamp_done = if done { now_millis.max(1) } else { 0 };
    }

    fn from_row(row: &Row<'_>) -> Result<Self> {
        Ok(Self {
            id: Some(row.get(0)?),
            name: row.get(1)?,
            is_done: row.get(2)?,
            timestamp_created: row.get(3)?,
            timestamp_done: row.get(4)?,
            category_id: row.get(5)?,
        })
    }

    /// Save the task to the database.
    pub fn save(&mut self, conn: &Connection) -> Result<()> {
        conn.execute(
            "INSERT INTO tasks (name, isDone, timestampCreated, timestampDone, categoryId)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                self.name,
                self.is_done,
                self.timestamp_created,
                self.timestamp_done,
                self.category_id,
            ],
        )?;
        self.id = Some(conn.last_insert_rowid());
        Ok(())
    }

    /// Update an existing task in the database.
    pub fn update(&self, conn: &Connection) -> Result<bool> {
        let id = self.id.ok_or_else(|| {
            rusqlite::Error::InvalidParameterName("Cannot update unsaved task".to_string())
        })?;

        let rows_affected = conn.execute(
            "UPDATE tasks
             SET name = ?1, isDone = ?2, timestampCreated = ?3, timestampDone = ?4, categoryId = ?5
             WHERE id = ?6",
            params![
                self.name,
                self.is_done,
                self.timestamp_created,
                self.timestamp_done,
                self.category_id,
                id,
            ],
        )?;
        Ok(rows_affected > 0)
    }

    /// Write only the completion columns of task `id`, leaving the rest of the row alone.
    pub fn set_done_by_id(conn: &Connection, id: i64, is_done: bool, timestamp_done: i64) -> Result<bool> {
        let rows_affected = conn.execute(
            "UPDATE tasks SET isDone = ?1, timestampDone = ?2 WHERE id = ?3",
            params![is_done, timestamp_done, id],
        )?;
        Ok(rows_affected > 0)
    }

    pub fn rename(conn: &Connection, id: i64, name: &str) -> Result<bool> {
        let rows_affected = conn.execute("UPDATE tasks SET name = ?1 WHERE id = ?2", params![name, id])?;
        Ok(rows_affected > 0)
    }

    pub fn delete(conn: &Connection, id: i64) -> Result<bool> {
        let rows_affected = conn.execute("DELETE FROM tasks WHERE id = ?1", params![id])?;
        Ok(rows_affected > 0)
    }

    pub fn find_by_id(conn: &Connection, id: i64) -> Result<Option<Self>> {
        let mut stmt = conn.prepare(&format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = ?1"))?;
        let mut rows = stmt.query(params![id])?;

        if let Some(row) = rows.next()? {
            Ok(Some(Self::from_row(row)?))
        } else {
            Ok(None)
        }
    }

    pub fn find_all(conn: &Connection) -> Result<Vec<Self>> {
        let mut stmt = conn.prepare(&format!("SELECT {TASK_COLUMNS} FROM tasks {TASK_ORDER}"))?;
        let rows = stmt.query_map([], Self::from_row)?;
        rows.collect()
    }

    pub fn find_by_category(conn: &Connection, category_id: i64) -> Result<Vec<Self>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE categoryId = ?1 {TASK_ORDER}"
        ))?;
        let rows = stmt.query_map(params![category_id], Self::from_row)?;
        rows.collect()
    }

    /// Every category in id order with its tasks; tasks without a category are left out.
    pub fn find_grouped(conn: &Connection) -> Result<Vec<TaskGroup>> {
        let categories = Category::find_all(conn)?;
        let tasks = Self::find_all(conn)?;

        Ok(categories
            .into_iter()
            .map(|category| {
                let tasks = tasks
                    .iter()
                    .filter(|t| t.category_id == category.id)
                    .cloned()
                    .collect();
                TaskGroup { category, tasks }
            })
            .collect())
    }

    /// Delete completed tasks finished before `cutoff` (epoch millis).
    pub fn purge_completed_before(conn: &Connection, cutoff: i64) -> Result<usize> {
        conn.execute(
            "DELETE FROM tasks WHERE isDone = 1 AND timestampDone < ?1",
            params![cutoff],
        )
    }
}
