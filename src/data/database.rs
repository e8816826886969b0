use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use log::info;
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::OpenFlags;

use crate::data::migration::MigrationManager;
use crate::data::repositories::{
    SqliteArticleRepository, SqliteColumnRepository, SqliteCommentReader, SqliteTagRepository,
};

/// Owns the SQLite connection pool and hands out repository instances.
#[derive(Clone)]
pub struct Database {
    pool: Pool<SqliteConnectionManager>,
}

impl Database {
    /// Opens (creating if necessary) the database at `db_path`, applies
    /// the base schema and runs pending migrations.
    pub fn new(db_path: &Path) -> Result<Self> {
        let manager = SqliteConnectionManager::file(db_path)
            .with_flags(OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_CREATE);
        let pool = Pool::new(manager).context("Failed to create connection pool")?;

        let database = Self { pool };
        database.initialize_schema()?;
        Ok(database)
    }

    /// In-memory database for tests. The pool is capped at a single
    /// connection; separate connections would each see their own empty
    /// `:memory:` database.
    pub fn in_memory() -> Result<Self> {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder()
            .max_size(1)
            .build(manager)
            .context("Failed to create in-memory connection pool")?;

        let database = Self { pool };
        database.initialize_schema()?;
        Ok(database)
    }

    fn initialize_schema(&self) -> Result<()> {
        info!("Initializing database schema");
        let conn = self.pool.get()?;
        conn.execute_batch(include_str!("../../data/schema.sql"))
            .context("Failed to apply base schema")?;
        MigrationManager::new(&conn).run_migrations()?;
        Ok(())
    }

    /// The raw pool, for callers that need direct statements (tests,
    /// the external comment subsystem's seed path).
    pub fn pool(&self) -> Pool<SqliteConnectionManager> {
        self.pool.clone()
    }

    pub fn article_repository(&self) -> Arc<SqliteArticleRepository> {
        Arc::new(SqliteArticleRepository::new(self.pool.clone()))
    }

    pub fn column_repository(&self) -> Arc<SqliteColumnRepository> {
        Arc::new(SqliteColumnRepository::new(self.pool.clone()))
    }

    pub fn tag_repository(&self) -> Arc<SqliteTagRepository> {
        Arc::new(SqliteTagRepository::new(self.pool.clone()))
    }

    pub fn comment_reader(&self) -> Arc<SqliteCommentReader> {
        Arc::new(SqliteCommentReader::new(self.pool.clone()))
    }
}
