use anyhow::Result;

use crate::base::query::ArticleQuery;
use crate::models::{
    article::{Article, ArticleId},
    column::{Column, ColumnId},
    comment::Comment,
    tag::{Tag, TagId},
};

/// Persistence boundary for articles. Counter mutations are separate,
/// atomic operations at the store level so concurrent requests never
/// lose an increment to a read-modify-write race.
pub trait ArticleRepository: Send + Sync {
    /// Inserts the article and returns the id the store assigned to it.
    fn create_article(&self, article: &Article) -> Result<ArticleId>;
    fn get_article(&self, id: ArticleId) -> Result<Option<Article>>;
    /// Runs a composed filter/order query, see [`ArticleQuery`].
    fn list_articles(&self, query: &ArticleQuery) -> Result<Vec<Article>>;
    /// Overwrites title, body, column, cover and the updated timestamp.
    fn update_article(&self, article: &Article) -> Result<()>;
    /// Removes the article together with its tag associations and
    /// comments. Returns false when the id was unknown.
    fn delete_article(&self, id: ArticleId) -> Result<bool>;
    /// Atomically adds one view. Returns false when the id was unknown.
    fn increase_views(&self, id: ArticleId) -> Result<bool>;
    /// Atomically adds one like. Returns false when the id was unknown.
    fn increase_likes(&self, id: ArticleId) -> Result<bool>;
    /// The article with the greatest id strictly below `id`, if any.
    fn previous_article(&self, id: ArticleId) -> Result<Option<Article>>;
    /// The article with the smallest id strictly above `id`, if any.
    fn next_article(&self, id: ArticleId) -> Result<Option<Article>>;
}

pub trait ColumnRepository: Send + Sync {
    fn get_column(&self, id: ColumnId) -> Result<Option<Column>>;
    fn get_all_columns(&self) -> Result<Vec<Column>>;
    fn create_column(&self, name: &str) -> Result<Column>;
}

pub trait TagRepository: Send + Sync {
    fn get_all_tags(&self) -> Result<Vec<Tag>>;
    /// Looks a tag up by name, creating it when missing.
    fn get_or_create_tag(&self, name: &str) -> Result<Tag>;
    fn get_tags_for_article(&self, article: ArticleId) -> Result<Vec<Tag>>;
    /// Replaces the article's tag set with exactly `tags`.
    fn set_article_tags(&self, article: ArticleId, tags: &[TagId]) -> Result<()>;
}

/// Read-only view of the external comment subsystem.
pub trait CommentReader: Send + Sync {
    fn get_comments_for_article(&self, article: ArticleId) -> Result<Vec<Comment>>;
}
