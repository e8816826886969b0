use anyhow::Result;
use chrono::DateTime;
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;

use crate::base::repository::CommentReader;
use crate::models::article::ArticleId;
use crate::models::comment::{Comment, CommentId};

/// Read-only SQLite view of the comment subsystem's table.
pub struct SqliteCommentReader {
    pool: Pool<SqliteConnectionManager>,
}

impl SqliteCommentReader {
    pub fn new(pool: Pool<SqliteConnectionManager>) -> Self {
        Self { pool }
    }
}

impl CommentReader for SqliteCommentReader {
    fn get_comments_for_article(&self, article: ArticleId) -> Result<Vec<Comment>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(
            "SELECT id, article_id, author, body, created
             FROM comments
             WHERE article_id = ?
             ORDER BY created, id",
        )?;

        let comments = stmt
            .query_map([article.0], |row| {
                let created: i64 = row.get(4)?;
                Ok(Comment {
                    id: CommentId(row.get(0)?),
                    article: ArticleId(row.get(1)?),
                    author: row.get(2)?,
                    body: row.get(3)?,
                    created: DateTime::from_timestamp(created, 0).unwrap_or_default(),
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(comments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::database::Database;

    #[test]
    fn test_comments_come_back_oldest_first() {
        let database = Database::in_memory().unwrap();
        let reader = SqliteCommentReader::new(database.pool());

        // Scoped so the connection returns to the single-slot test pool
        {
            let conn = database.pool().get().unwrap();
            conn.execute_batch(
                "INSERT INTO articles (id, author_id, title, body, created, updated) VALUES (1, 1, 'a', 'a', 0, 0);
                 INSERT INTO articles (id, author_id, title, body, created, updated) VALUES (2, 1, 'b', 'b', 0, 0);
                 INSERT INTO comments (article_id, author, body, created) VALUES (1, 'ann', 'second', 200);
                 INSERT INTO comments (article_id, author, body, created) VALUES (1, 'bob', 'first', 100);
                 INSERT INTO comments (article_id, author, body, created) VALUES (2, 'cee', 'other', 50);",
            )
            .unwrap();
        }

        let comments = reader.get_comments_for_article(ArticleId(1)).unwrap();
        assert_eq!(comments.len(), 2);
        assert_eq!(comments[0].body, "first");
        assert_eq!(comments[1].body, "second");
    }
}
