pub mod base;
pub mod config;
pub mod data;
pub mod models;
pub mod services;
pub mod utils;
pub mod web;

// Re-export repository traits
pub use base::repository::{ArticleRepository, ColumnRepository, CommentReader, TagRepository};

// Re-export the query specification
pub use base::query::{ArticleOrder, ArticleQuery, QueryEcho};

// Re-export models
pub use models::{
    article::{Article, ArticleId, UserId},
    column::{Column, ColumnId},
    comment::{Comment, CommentId},
    tag::{Tag, TagId},
};

// Re-export the request-facing surface
pub use config::BlogConfig;
pub use data::database::Database;
pub use services::markdown::{MarkdownRenderer, RenderedBody, TocEntry};
pub use web::{
    error::HandlerError,
    handlers::{Blog, CreateFormPage, DetailPage, ListPage, Outcome, Route, UpdateFormPage},
    pagination::{Page, Paginator},
    params::{ArticleForm, Attachment, Identity, ListParams, Method},
};
