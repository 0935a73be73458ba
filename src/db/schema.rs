pub const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS categories (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS tasks (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    isDone INTEGER NOT NULL DEFAULT 0,
    timestampCreated INTEGER NOT NULL,
    timestampDone INTEGER NOT NULL DEFAULT 0,
    categoryId INTEGER NOT NULL REFERENCES categories(id) ON DELETE CASCADE,
    CHECK ((isDone = 0 AND timestampDone = 0) OR (isDone = 1 AND timestampDone > 0))
);

CREATE INDEX IF NOT EXISTS index_tasks_categoryId ON tasks(categoryId);
"#;

/// Tables created by [`SCHEMA`], in creation order.
pub const TABLES: &[&str] = &["categories", "tasks"];
