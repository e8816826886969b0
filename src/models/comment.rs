use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::article::ArticleId;

/// Unique identifier for a comment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CommentId(pub i64);

/// A reader comment on an article. The comment subsystem owns its own
/// write path; this crate only reads comments to show them on detail
/// pages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    /// Unique identifier of the comment
    pub id: CommentId,
    /// The article the comment was left on
    pub article: ArticleId,
    /// Display name of the commenter
    pub author: String,
    /// Comment text
    pub body: String,
    /// When the comment was posted
    pub created: DateTime<Utc>,
}
