use serde::{Deserialize, Serialize};

use crate::models::article::{UserId, MAX_TITLE_LEN};

/// HTTP verb as far as the handlers care about it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

/// The caller's identity, resolved by the outer authentication layer
/// and passed explicitly into every handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Identity {
    Anonymous,
    User(UserId),
}

impl Identity {
    pub fn user_id(&self) -> Option<UserId> {
        match self {
            Identity::Anonymous => None,
            Identity::User(id) => Some(*id),
        }
    }
}

/// Raw query parameters of the listing route, exactly as the HTTP
/// layer received them. Normalization happens in `ArticleQuery`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListParams {
    pub search: Option<String>,
    pub order: Option<String>,
    pub column: Option<String>,
    pub tag: Option<String>,
    pub page: Option<String>,
}

/// An uploaded file, carried by value from the multipart layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub file_name: String,
    pub content: Vec<u8>,
}

/// Submitted article form. `column` holds the raw selection token; the
/// sentinel `"none"` (or an empty token) means no column.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArticleForm {
    pub title: String,
    pub body: String,
    pub column: String,
    pub tags: Vec<String>,
    pub attachment: Option<Attachment>,
}

impl ArticleForm {
    /// Selection token meaning "no column"
    pub const NO_COLUMN: &'static str = "none";

    /// Field-level constraints; the column token is checked separately
    /// against the store when the form is applied.
    pub fn validate(&self) -> Result<(), String> {
        if self.title.trim().is_empty() {
            return Err("title must not be empty".to_string());
        }
        if self.title.chars().count() > MAX_TITLE_LEN {
            return Err(format!("title must be at most {} characters", MAX_TITLE_LEN));
        }
        if self.body.trim().is_empty() {
            return Err("body must not be empty".to_string());
        }
        Ok(())
    }
}
