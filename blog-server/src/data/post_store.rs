use crate::domain::post::{Post, PostFields};
use async_trait::async_trait;
use futures_util::stream::BoxStream;
use thiserror::Error;

/// Lazily-evaluated scan over stored posts. Dropping it releases the
/// underlying cursor.
pub type PostCursor = BoxStream<'static, Result<Post, StoreError>>;

/// Document selector understood by every store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    IdEquals(String),
    All,
}

impl Filter {
    pub fn id(id: impl Into<String>) -> Self {
        Filter::IdEquals(id.into())
    }

    pub fn matches(&self, post: &Post) -> bool {
        match self {
            Filter::IdEquals(id) => post.id == *id,
            Filter::All => true,
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    /// A document was found but could not be turned into a `Post`.
    #[error("decode error: {0}")]
    Decode(String),
    #[error("store error: {0}")]
    Backend(String),
}

#[async_trait]
pub trait PostStore: Send + Sync {
    async fn insert_one(&self, post: &Post) -> Result<(), StoreError>;
    async fn find_one(&self, filter: Filter) -> Result<Option<Post>, StoreError>;
    /// Overwrites the fields of the first matching document and returns how
    /// many documents matched. Never inserts.
    async fn update_one(&self, filter: Filter, fields: PostFields) -> Result<u64, StoreError>;
    async fn delete_one(&self, filter: Filter) -> Result<u64, StoreError>;
    async fn find(&self, filter: Filter) -> Result<PostCursor, StoreError>;
}
