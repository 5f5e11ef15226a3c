use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BlogError {
    #[error("post not found: {0}")]
    NotFound(String),
    #[error("internal error: {0}")]
    Internal(String),
    #[error("operation cancelled")]
    Cancelled,
}

impl BlogError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, BlogError::NotFound(_))
    }
}
