use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::column::ColumnId;

/// Unique identifier for articles, assigned by the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ArticleId(pub i64);

impl fmt::Display for ArticleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of an author. User accounts are owned by an external
/// subsystem; only the numeric identity is carried here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub i64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Longest accepted article title, in characters
pub const MAX_TITLE_LEN: usize = 100;

/// A single blog post
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    /// Unique identifier of the article
    pub id: ArticleId,
    /// Author of the article
    pub author: UserId,
    /// Title of the article (bounded length, see `MAX_TITLE_LEN`)
    pub title: String,
    /// Body of the article, kept as Markdown source and rendered on read
    pub body: String,
    /// Time the article was created, set once
    pub created: DateTime<Utc>,
    /// Time the article was last modified
    pub updated: DateTime<Utc>,
    /// How many times the detail page has been viewed
    pub total_views: i64,
    /// How many likes the article has received
    pub likes: i64,
    /// Optional column (category) the article belongs to
    pub column: Option<ColumnId>,
    /// Stored path of an uploaded cover image, if any
    pub cover: Option<String>,
    /// Names of the tags attached to this article
    pub tags: Vec<String>,
}

impl Article {
    /// Creates a new, unsaved article authored by `author`. The store
    /// assigns the real id on insert; until then it is 0.
    pub fn new(author: UserId, title: String, body: String) -> Self {
        let now = Utc::now();
        Self {
            id: ArticleId(0),
            author,
            title,
            body,
            created: now,
            updated: now,
            total_views: 0,
            likes: 0,
            column: None,
            cover: None,
            tags: Vec::new(),
        }
    }

    /// Marks the article as modified now. Every mutation path calls this
    /// before persisting; the store never touches timestamps itself.
    pub fn touch(&mut self) {
        self.updated = Utc::now();
    }

    /// Returns true if the article carries a specific tag
    pub fn has_tag(&self, name: &str) -> bool {
        self.tags.iter().any(|t| t == name)
    }
}

impl fmt::Display for Article {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.title)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_article_starts_with_zeroed_counters() {
        let article = Article::new(UserId(1), "Hello".into(), "World".into());

        assert_eq!(article.total_views, 0);
        assert_eq!(article.likes, 0);
        assert!(article.column.is_none());
        assert!(article.tags.is_empty());
        assert_eq!(article.created, article.updated);
    }

    #[test]
    fn test_touch_advances_updated_only() {
        let mut article = Article::new(UserId(1), "Hello".into(), "World".into());
        let created = article.created;

        article.touch();

        assert_eq!(article.created, created);
        assert!(article.updated >= created);
    }
}
