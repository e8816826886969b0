use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{params, OptionalExtension, Row};

use crate::base::repository::ColumnRepository;
use crate::models::column::{Column, ColumnId};

/// SQLite-based column repository implementation
pub struct SqliteColumnRepository {
    pool: Pool<SqliteConnectionManager>,
}

impl SqliteColumnRepository {
    pub fn new(pool: Pool<SqliteConnectionManager>) -> Self {
        Self { pool }
    }

    fn map_row(row: &Row) -> Result<Column, rusqlite::Error> {
        let created: i64 = row.get(2)?;
        Ok(Column {
            id: ColumnId(row.get(0)?),
            name: row.get(1)?,
            created: DateTime::from_timestamp(created, 0).unwrap_or_default(),
        })
    }
}

impl ColumnRepository for SqliteColumnRepository {
    fn get_column(&self, id: ColumnId) -> Result<Option<Column>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare("SELECT id, name, created FROM columns WHERE id = ?")?;
        let column = stmt.query_row([id.0], Self::map_row).optional()?;
        Ok(column)
    }

    fn get_all_columns(&self) -> Result<Vec<Column>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare("SELECT id, name, created FROM columns ORDER BY id")?;
        let columns = stmt
            .query_map([], Self::map_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(columns)
    }

    fn create_column(&self, name: &str) -> Result<Column> {
        // The store keeps whole seconds; truncate up front so the
        // returned column equals its fetched copy
        let created = DateTime::from_timestamp(Utc::now().timestamp(), 0).unwrap_or_default();
        let conn = self.pool.get()?;
        conn.execute(
            "INSERT INTO columns (name, created) VALUES (?, ?)",
            params![name, created.timestamp()],
        )
        .context("Failed to insert column")?;

        Ok(Column {
            id: ColumnId(conn.last_insert_rowid()),
            name: name.to_string(),
            created,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::database::Database;

    #[test]
    fn test_create_and_fetch_columns() {
        let database = Database::in_memory().unwrap();
        let repo = SqliteColumnRepository::new(database.pool());

        let tech = repo.create_column("tech").unwrap();
        let life = repo.create_column("life").unwrap();

        // Round-trips exactly, including the stored timestamp
        assert_eq!(repo.get_column(tech.id).unwrap().unwrap(), tech);
        assert!(repo.get_column(ColumnId(999)).unwrap().is_none());

        let all = repo.get_all_columns().unwrap();
        assert_eq!(all, vec![tech, life]);
    }
}
