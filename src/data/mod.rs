pub mod database;
pub mod migration;
pub mod repositories;

pub use database::Database;
pub use repositories::{
    SqliteArticleRepository, SqliteColumnRepository, SqliteCommentReader, SqliteTagRepository,
};
