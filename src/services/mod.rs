pub mod markdown;

pub use markdown::{MarkdownRenderer, RenderedBody, TocEntry};
