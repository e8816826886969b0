use anyhow::{Context, Result};
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::params;

use crate::base::repository::TagRepository;
use crate::models::article::ArticleId;
use crate::models::tag::{Tag, TagId};

/// SQLite-based tag repository implementation
pub struct SqliteTagRepository {
    pool: Pool<SqliteConnectionManager>,
}

impl SqliteTagRepository {
    pub fn new(pool: Pool<SqliteConnectionManager>) -> Self {
        Self { pool }
    }
}

impl TagRepository for SqliteTagRepository {
    fn get_all_tags(&self) -> Result<Vec<Tag>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare("SELECT id, name FROM tags ORDER BY name")?;
        let tags = stmt
            .query_map([], |row| {
                Ok(Tag {
                    id: TagId(row.get(0)?),
                    name: row.get(1)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(tags)
    }

    fn get_or_create_tag(&self, name: &str) -> Result<Tag> {
        let conn = self.pool.get()?;
        conn.execute("INSERT OR IGNORE INTO tags (name) VALUES (?)", [name])
            .context("Failed to insert tag")?;

        let id: i64 = conn.query_row("SELECT id FROM tags WHERE name = ?", [name], |row| {
            row.get(0)
        })?;

        Ok(Tag {
            id: TagId(id),
            name: name.to_string(),
        })
    }

    fn get_tags_for_article(&self, article: ArticleId) -> Result<Vec<Tag>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(
            "SELECT t.id, t.name
             FROM tags t
             JOIN article_tags at ON t.id = at.tag_id
             WHERE at.article_id = ?
             ORDER BY t.name",
        )?;

        let tags = stmt
            .query_map([article.0], |row| {
                Ok(Tag {
                    id: TagId(row.get(0)?),
                    name: row.get(1)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(tags)
    }

    fn set_article_tags(&self, article: ArticleId, tags: &[TagId]) -> Result<()> {
        let mut conn = self.pool.get()?;
        let tx = conn.transaction()?;

        tx.execute("DELETE FROM article_tags WHERE article_id = ?", [article.0])?;
        {
            let mut stmt =
                tx.prepare("INSERT INTO article_tags (article_id, tag_id) VALUES (?, ?)")?;
            for tag in tags {
                stmt.execute(params![article.0, tag.0])?;
            }
        }

        tx.commit()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::repository::ArticleRepository;
    use crate::data::database::Database;
    use crate::data::repositories::SqliteArticleRepository;
    use crate::models::article::{Article, UserId};

    #[test]
    fn test_get_or_create_reuses_existing_tag() {
        let database = Database::in_memory().unwrap();
        let repo = SqliteTagRepository::new(database.pool());

        let first = repo.get_or_create_tag("rust").unwrap();
        let second = repo.get_or_create_tag("rust").unwrap();

        assert_eq!(first, second);
        assert_eq!(repo.get_all_tags().unwrap().len(), 1);
    }

    #[test]
    fn test_set_article_tags_replaces_the_whole_set() {
        let database = Database::in_memory().unwrap();
        let tags = SqliteTagRepository::new(database.pool());
        let articles = SqliteArticleRepository::new(database.pool());

        let id = articles
            .create_article(&Article::new(UserId(1), "t".into(), "b".into()))
            .unwrap();

        let rust = tags.get_or_create_tag("rust").unwrap();
        let web = tags.get_or_create_tag("web").unwrap();
        tags.set_article_tags(id, &[rust.id, web.id]).unwrap();
        assert_eq!(tags.get_tags_for_article(id).unwrap().len(), 2);

        tags.set_article_tags(id, &[web.id]).unwrap();
        let remaining = tags.get_tags_for_article(id).unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].name, "web");
    }
}
