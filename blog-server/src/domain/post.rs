use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: String,
    pub author_id: String,
    pub title: String,
    pub content: String,
}

/// The mutable part of a post. Updates are expressed in terms of this type so
/// the id can never end up in a write payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostFields {
    pub author_id: String,
    pub title: String,
    pub content: String,
}

impl Post {
    /// Builds a post with a freshly minted id.
    pub fn new(author_id: String, title: String, content: String) -> Self {
        Self::with_fields(
            Uuid::new_v4().to_string(),
            PostFields {
                author_id,
                title,
                content,
            },
        )
    }

    pub fn with_fields(id: String, fields: PostFields) -> Self {
        Self {
            id,
            author_id: fields.author_id,
            title: fields.title,
            content: fields.content,
        }
    }

    pub fn into_parts(self) -> (String, PostFields) {
        (
            self.id,
            PostFields {
                author_id: self.author_id,
                title: self.title,
                content: self.content,
            },
        )
    }
}
