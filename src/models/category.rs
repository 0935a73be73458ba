use rusqlite::{params, Connection, Result, Row};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
}

impl Category {
    fn from_row(row: &Row<'_>) -> Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
        })
    }

    pub fn find_by_id(conn: &Connection, id: i64) -> Result<Option<Self>> {
        let mut stmt = conn.prepare("SELECT id, name FROM categories WHERE id = ?1")?;
        let mut rows = stmt.query(params![id])?;

        if let Some(row) = rows.next()? {
            Ok(Some(Self::from_row(row)?))
        } else {
            Ok(None)
        }
    }

    /// First category with exactly this name; names are not unique.
    pub fn find_by_name(conn: &Connection, name: &str) -> Result<Option<Self>> {
        let mut stmt = conn.prepare("SELECT id, name FROM categories WHERE name = ?1 ORDER BY id LIMIT 1")?;
        let mut rows = stmt.query(params![name])?;

        if let Some(row) = rows.next()? {
            Ok(Some(Self::from_row(row)?))
        } else {
            Ok(None)
        }
    }

    pub fn find_all(conn: &Connection) -> Result<Vec<Self>> {
        let mut stmt = conn.prepare("SELECT id, name FROM categories ORDER BY id")?;
        let rows = stmt.query_map([], Self::from_row)?;
        rows.collect()
    }

    pub fn create(conn: &Connection, name: &str) -> Result<Self> {
        conn.execute("INSERT INTO categories (name) VALUES (?1)", params![name])?;
        let id = conn.last_insert_rowid();
        Ok(Self { id, name: name.to_string() })
    }

    pub fn rename(conn: &Connection, id: i64, name: &str) -> Result<bool> {
        let rows_affected = conn.execute(
            "UPDATE categories SET name = ?1 WHERE id = ?2",
            params![name, id],
        )?;
        Ok(rows_affected > 0)
    }

    /// Delete a category; its tasks go with it through `ON DELETE CASCADE`.
    pub fn delete(conn: &Connection, id: i64) -> Result<bool> {
        let rows_affected = conn.execute("DELETE FROM categories WHERE id = ?1", params![id])?;
        Ok(rows_affected > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::setup_test_db;

    #[test]
    fn test_create_category() {
        let (db, _dir) = setup_test_db();
        let cat = Category::create(db.connection(), "Work").unwrap();
        assert_eq!(cat.name, "Work");
        assert!(cat.id > 0);

        let found = Category::find_by_id(db.connection(), cat.id).unwrap();
        assert_eq!(found, Some(cat));
    }

    #[test]
    fn test_duplicate_names_allowed() {
        let (db, _dir) = setup_test_db();
        let a = Category::create(db.connection(), "Home").unwrap();
        let b = Category::create(db.connection(), "Home").unwrap();
        assert_ne!(a.id, b.id);

        let first = Category::find_by_name(db.connection(), "Home").unwrap().unwrap();
        assert_eq!(first.id, a.id);
    }

    #[test]
    fn test_find_all_ordered_by_id() {
        let (db, _dir) = setup_test_db();
        Category::create(db.connection(), "Zeta").unwrap();
        Category::create(db.connection(), "Alpha").unwrap();

        let names: Vec<_> = Category::find_all(db.connection())
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, vec!["Zeta", "Alpha"]);
    }

    #[test]
    fn test_rename_and_delete() {
        let (db, _dir) = setup_test_db();
        let conn = db.connection();
        let cat = Category::create(conn, "Wrok").unwrap();

        assert!(Category::rename(conn, cat.id, "Work").unwrap());
        assert_eq!(Category::find_by_id(conn, cat.id).unwrap().unwrap().name, "Work");

        assert!(Category::delete(conn, cat.id).unwrap());
        assert!(Category::find_by_id(conn, cat.id).unwrap().is_none());
        assert!(!Category::delete(conn, cat.id).unwrap());
    }
}
