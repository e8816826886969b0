pub mod error;
pub mod handlers;
pub mod pagination;
pub mod params;

pub use error::HandlerError;
pub use handlers::{Blog, DetailPage, ListPage, Outcome, Route};
pub use pagination::{Page, Paginator};
pub use params::{ArticleForm, Attachment, Identity, ListParams, Method};
