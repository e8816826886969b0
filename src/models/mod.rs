pub mod article;
pub mod column;
pub mod comment;
pub mod tag;

pub use article::{Article, ArticleId, UserId, MAX_TITLE_LEN};
pub use column::{Column, ColumnId};
pub use comment::{Comment, CommentId};
pub use tag::{Tag, TagId};
