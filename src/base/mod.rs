pub mod query;
pub mod repository;

pub use query::{ArticleOrder, ArticleQuery, QueryEcho};
pub use repository::{ArticleRepository, ColumnRepository, CommentReader, TagRepository};
