use thiserror::Error;
use tonic::{Code, Status};

#[derive(Debug, Error)]
pub enum BlogClientError {
    #[error("gRPC transport error: {0}")]
    GrpcError(#[from] tonic::transport::Error),
    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Status error: {0}")]
    StatusError(Status),
}

impl From<Status> for BlogClientError {
    fn from(status: Status) -> Self {
        match status.code() {
            Code::NotFound => BlogClientError::NotFound(status.message().to_string()),
            _ => BlogClientError::StatusError(status),
        }
    }
}

impl BlogClientError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, BlogClientError::NotFound(_))
    }

    pub fn code(&self) -> Option<Code> {
        match self {
            BlogClientError::NotFound(_) => Some(Code::NotFound),
            BlogClientError::StatusError(status) => Some(status.code()),
            _ => None,
        }
    }
}
