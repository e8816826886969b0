use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{params, Connection, OptionalExtension, Row, ToSql};

use crate::base::query::{ArticleOrder, ArticleQuery};
use crate::base::repository::ArticleRepository;
use crate::models::article::{Article, ArticleId, UserId};
use crate::models::column::ColumnId;

const ARTICLE_COLUMNS: &str =
    "id, author_id, title, body, created, updated, total_views, likes, column_id, cover";

/// SQLite-based article repository implementation
pub struct SqliteArticleRepository {
    pool: Pool<SqliteConnectionManager>,
}

impl SqliteArticleRepository {
    /// Creates a new SQLite article repository
    pub fn new(pool: Pool<SqliteConnectionManager>) -> Self {
        Self { pool }
    }

    /// Maps a database row to an Article. Tags live in a separate
    /// association table and are filled in afterwards.
    fn map_row(row: &Row) -> Result<Article, rusqlite::Error> {
        let created: i64 = row.get(4)?;
        let updated: i64 = row.get(5)?;
        let column_id: Option<i64> = row.get(8)?;

        Ok(Article {
            id: ArticleId(row.get(0)?),
            author: UserId(row.get(1)?),
            title: row.get(2)?,
            body: row.get(3)?,
            created: timestamp_to_datetime(created),
            updated: timestamp_to_datetime(updated),
            total_views: row.get(6)?,
            likes: row.get(7)?,
            column: column_id.map(ColumnId),
            cover: row.get(9)?,
            tags: Vec::new(),
        })
    }

    fn load_tags(conn: &Connection, article: &mut Article) -> Result<()> {
        let mut stmt = conn.prepare(
            "SELECT t.name
             FROM tags t
             JOIN article_tags at ON t.id = at.tag_id
             WHERE at.article_id = ?
             ORDER BY t.name",
        )?;

        article.tags = stmt
            .query_map([article.id.0], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(())
    }

    fn fetch_one(&self, sql: &str, id: ArticleId) -> Result<Option<Article>> {
        let conn = self.pool.get()?;
        let article = {
            let mut stmt = conn.prepare(sql)?;
            stmt.query_row([id.0], Self::map_row).optional()?
        };

        match article {
            Some(mut article) => {
                Self::load_tags(&conn, &mut article)?;
                Ok(Some(article))
            }
            None => Ok(None),
        }
    }
}

impl ArticleRepository for SqliteArticleRepository {
    fn create_article(&self, article: &Article) -> Result<ArticleId> {
        let conn = self.pool.get()?;
        conn.execute(
            "INSERT INTO articles (author_id, title, body, created, updated, total_views, likes, column_id, cover)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                article.author.0,
                article.title,
                article.body,
                article.created.timestamp(),
                article.updated.timestamp(),
                article.total_views,
                article.likes,
                article.column.map(|c| c.0),
                article.cover,
            ],
        )
        .context("Failed to insert article")?;

        Ok(ArticleId(conn.last_insert_rowid()))
    }

    fn get_article(&self, id: ArticleId) -> Result<Option<Article>> {
        self.fetch_one(
            &format!("SELECT {ARTICLE_COLUMNS} FROM articles WHERE id = ?"),
            id,
        )
    }

    fn list_articles(&self, query: &ArticleQuery) -> Result<Vec<Article>> {
        let mut sql = format!("SELECT {ARTICLE_COLUMNS} FROM articles");
        let mut clauses: Vec<&str> = Vec::new();
        let mut bindings: Vec<Box<dyn ToSql>> = Vec::new();

        if let Some(search) = &query.search {
            clauses.push(
                "(LOWER(title) LIKE ? ESCAPE '\\' OR LOWER(body) LIKE ? ESCAPE '\\')",
            );
            let pattern = format!("%{}%", escape_like(&search.to_lowercase()));
            bindings.push(Box::new(pattern.clone()));
            bindings.push(Box::new(pattern));
        }

        if let Some(column) = query.column {
            clauses.push("column_id = ?");
            bindings.push(Box::new(column.0));
        }

        if let Some(tag) = &query.tag {
            clauses.push(
                "id IN (SELECT at.article_id FROM article_tags at
                        JOIN tags t ON t.id = at.tag_id
                        WHERE t.name = ?)",
            );
            bindings.push(Box::new(tag.clone()));
        }

        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }

        // Ties under the view-count order keep the store's default order
        sql.push_str(match query.order {
            ArticleOrder::Newest => " ORDER BY created DESC, id DESC",
            ArticleOrder::MostViewed => " ORDER BY total_views DESC, created DESC, id DESC",
        });

        let conn = self.pool.get()?;
        let binding_refs: Vec<&dyn ToSql> = bindings.iter().map(|b| b.as_ref()).collect();
        let mut articles = {
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(&binding_refs[..], Self::map_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            rows
        };

        for article in &mut articles {
            Self::load_tags(&conn, article)?;
        }

        Ok(articles)
    }

    fn update_article(&self, article: &Article) -> Result<()> {
        let conn = self.pool.get()?;
        conn.execute(
            "UPDATE articles SET
             title = ?, body = ?, updated = ?, column_id = ?, cover = ?
             WHERE id = ?",
            params![
                article.title,
                article.body,
                article.updated.timestamp(),
                article.column.map(|c| c.0),
                article.cover,
                article.id.0,
            ],
        )
        .context("Failed to update article")?;

        Ok(())
    }

    fn delete_article(&self, id: ArticleId) -> Result<bool> {
        let mut conn = self.pool.get()?;
        let tx = conn.transaction()?;

        tx.execute("DELETE FROM article_tags WHERE article_id = ?", [id.0])?;
        tx.execute("DELETE FROM comments WHERE article_id = ?", [id.0])?;
        let affected = tx.execute("DELETE FROM articles WHERE id = ?", [id.0])?;

        tx.commit()?;
        Ok(affected > 0)
    }

    fn increase_views(&self, id: ArticleId) -> Result<bool> {
        let conn = self.pool.get()?;
        // Single atomic UPDATE; concurrent readers never lose a count
        let affected = conn.execute(
            "UPDATE articles SET total_views = total_views + 1 WHERE id = ?",
            [id.0],
        )?;
        Ok(affected > 0)
    }

    fn increase_likes(&self, id: ArticleId) -> Result<bool> {
        let conn = self.pool.get()?;
        let affected = conn.execute("UPDATE articles SET likes = likes + 1 WHERE id = ?", [id.0])?;
        Ok(affected > 0)
    }

    fn previous_article(&self, id: ArticleId) -> Result<Option<Article>> {
        self.fetch_one(
            &format!(
                "SELECT {ARTICLE_COLUMNS} FROM articles WHERE id < ? ORDER BY id DESC LIMIT 1"
            ),
            id,
        )
    }

    fn next_article(&self, id: ArticleId) -> Result<Option<Article>> {
        self.fetch_one(
            &format!("SELECT {ARTICLE_COLUMNS} FROM articles WHERE id > ? ORDER BY id ASC LIMIT 1"),
            id,
        )
    }
}

/// Escapes LIKE wildcards so user input only ever matches literally.
fn escape_like(input: &str) -> String {
    input
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

fn timestamp_to_datetime(timestamp: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(timestamp, 0).unwrap_or_default()
}
