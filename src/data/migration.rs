use anyhow::{Context, Result};
use log::{debug, info};
use rusqlite::{Connection, Error as SqliteError};

/// Database migration manager that handles schema updates for stores
/// created by earlier releases. The base schema in `data/schema.sql`
/// already contains every column; migrations only upgrade databases
/// that predate the like counter and cover images.
pub struct MigrationManager<'a> {
    connection: &'a Connection,
}

impl<'a> MigrationManager<'a> {
    pub fn new(connection: &'a Connection) -> Self {
        Self { connection }
    }

    /// Run all necessary migrations to update the database schema
    pub fn run_migrations(&self) -> Result<()> {
        info!("Running database migrations");

        self.create_migrations_table()?;

        self.apply_column_migration(
            "add_likes_to_articles",
            "articles",
            "likes",
            "ALTER TABLE articles ADD COLUMN likes INTEGER NOT NULL DEFAULT 0",
        )?;
        self.apply_column_migration(
            "add_cover_to_articles",
            "articles",
            "cover",
            "ALTER TABLE articles ADD COLUMN cover TEXT",
        )?;

        info!("Database migrations completed successfully");
        Ok(())
    }

    /// Creates the migrations table to track which migrations have been applied
    fn create_migrations_table(&self) -> Result<()> {
        self.connection
            .execute(
                "CREATE TABLE IF NOT EXISTS migrations (
                    id INTEGER PRIMARY KEY,
                    name TEXT NOT NULL UNIQUE,
                    applied_at TEXT NOT NULL
                )",
                [],
            )
            .context("Failed to create migrations table")?;

        Ok(())
    }

    fn is_migration_applied(&self, name: &str) -> Result<bool> {
        let count: i64 = self
            .connection
            .query_row(
                "SELECT COUNT(*) FROM migrations WHERE name = ?",
                [name],
                |row| row.get(0),
            )
            .context("Failed to check if migration has been applied")?;

        Ok(count > 0)
    }

    fn record_migration(&self, name: &str) -> Result<()> {
        debug!("Recording migration '{}' as applied", name);

        self.connection
            .execute(
                "INSERT INTO migrations (name, applied_at) VALUES (?, datetime('now'))",
                [name],
            )
            .context("Failed to record migration")?;

        Ok(())
    }

    fn table_exists(&self, table: &str) -> Result<bool> {
        match self.connection.query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name=?",
            [table],
            |_| Ok(true),
        ) {
            Ok(_) => Ok(true),
            Err(SqliteError::QueryReturnedNoRows) => Ok(false),
            Err(e) => Err(e).with_context(|| format!("Failed to check if {} table exists", table)),
        }
    }

    fn column_exists(&self, table: &str, column: &str) -> Result<bool> {
        match self.connection.query_row(
            &format!("SELECT 1 FROM pragma_table_info('{}') WHERE name=?", table),
            [column],
            |_| Ok(true),
        ) {
            Ok(_) => Ok(true),
            Err(SqliteError::QueryReturnedNoRows) => Ok(false),
            Err(e) => {
                Err(e).with_context(|| format!("Failed to check if {} column exists", column))
            }
        }
    }

    /// Adds a column to an existing table, idempotently. A table that
    /// does not exist yet gets the column through the base schema, so
    /// the migration is only recorded in that case.
    fn apply_column_migration(
        &self,
        name: &str,
        table: &str,
        column: &str,
        ddl: &str,
    ) -> Result<()> {
        if self.is_migration_applied(name)? {
            debug!("Migration '{}' already recorded as applied, skipping", name);
            return Ok(());
        }

        info!("Running migration: {}", name);

        if self.table_exists(table)? && !self.column_exists(table, column)? {
            match self.connection.execute(ddl, []) {
                Ok(_) => info!("Added {} column to {} table", column, table),
                // A concurrent writer may have added it between the check and the ALTER
                Err(e) if e.to_string().contains("duplicate column name") => {
                    info!("Column '{}' already exists on {}", column, table)
                }
                Err(e) => {
                    return Err(e)
                        .with_context(|| format!("Failed to add {} column to {}", column, table))
                }
            }
        }

        self.record_migration(name)?;
        Ok(())
    }
}
