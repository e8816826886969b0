use thiserror::Error;

use crate::models::article::ArticleId;

/// Request-local failure taxonomy. None of these are retried and none
/// are fatal to the process; the outer HTTP layer maps each variant to
/// a status code and a plain message.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// Malformed or missing form fields; nothing was persisted
    #[error("the submitted form is invalid: {0}")]
    Validation(String),
    /// The caller is not the owner of the resource
    #[error("you do not have permission to modify this article")]
    Forbidden,
    /// Wrong HTTP verb on a mutating route
    #[error("only POST requests are allowed")]
    MethodNotAllowed,
    /// Unknown article identifier
    #[error("article {0} does not exist")]
    NotFound(ArticleId),
    /// Store failure, propagated as-is
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}
