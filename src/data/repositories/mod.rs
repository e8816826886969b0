mod article_repository;
mod column_repository;
mod comment_repository;
mod tag_repository;

pub use article_repository::SqliteArticleRepository;
pub use column_repository::SqliteColumnRepository;
pub use comment_repository::SqliteCommentReader;
pub use tag_repository::SqliteTagRepository;
