use crate::data::post_store::{Filter, PostCursor, PostStore, StoreError};
use crate::domain::post::{Post, PostFields};
use async_trait::async_trait;
use futures_util::StreamExt;
use mongodb::bson::{Document, doc};
use mongodb::error::ErrorKind;
use mongodb::options::IndexOptions;
use mongodb::{Collection, IndexModel};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

/// Stored shape of a post. Field names match the existing `blog` collection
/// layout, which predates this service (`authorid`, not `author_id`). The
/// driver-generated `_id` is ignored on read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostDocument {
    pub id: String,
    #[serde(rename = "authorid")]
    pub author_id: String,
    pub title: String,
    pub content: String,
}

impl From<&Post> for PostDocument {
    fn from(p: &Post) -> Self {
        PostDocument {
            id: p.id.clone(),
            author_id: p.author_id.clone(),
            title: p.title.clone(),
            content: p.content.clone(),
        }
    }
}

impl From<PostDocument> for Post {
    fn from(d: PostDocument) -> Self {
        Post {
            id: d.id,
            author_id: d.author_id,
            title: d.title,
            content: d.content,
        }
    }
}

impl From<mongodb::error::Error> for StoreError {
    fn from(err: mongodb::error::Error) -> Self {
        match err.kind.as_ref() {
            ErrorKind::BsonDeserialization(_) => StoreError::Decode(err.to_string()),
            _ => StoreError::Backend(err.to_string()),
        }
    }
}

pub fn filter_document(filter: &Filter) -> Document {
    match filter {
        Filter::IdEquals(id) => doc! { "id": id.as_str() },
        Filter::All => doc! {},
    }
}

pub fn set_fields_document(fields: PostFields) -> Document {
    doc! {
        "$set": {
            "authorid": fields.author_id,
            "title": fields.title,
            "content": fields.content,
        }
    }
}

#[derive(Clone)]
pub struct MongoPostStore {
    collection: Collection<PostDocument>,
}

impl MongoPostStore {
    pub fn new(collection: Collection<PostDocument>) -> Self {
        Self { collection }
    }

    /// Creates the unique index on `id`. Safe to call on every start.
    pub async fn ensure_indexes(&self) -> Result<(), StoreError> {
        let index = IndexModel::builder()
            .keys(doc! { "id": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();
        self.collection.create_index(index).await.map_err(|e| {
            error!("failed to create index on posts.id: {}", e);
            StoreError::from(e)
        })?;
        info!(collection = %self.collection.name(), "post indexes ensured");
        Ok(())
    }
}

#[async_trait]
impl PostStore for MongoPostStore {
    async fn insert_one(&self, post: &Post) -> Result<(), StoreError> {
        self.collection
            .insert_one(PostDocument::from(post))
            .await
            .map_err(|e| {
                error!("failed to insert post {}: {}", post.id, e);
                StoreError::from(e)
            })?;
        Ok(())
    }

    async fn find_one(&self, filter: Filter) -> Result<Option<Post>, StoreError> {
        let found = self
            .collection
            .find_one(filter_document(&filter))
            .await
            .map_err(|e| {
                error!("db error find_one {:?}: {}", filter, e);
                StoreError::from(e)
            })?;
        Ok(found.map(Post::from))
    }

    async fn update_one(&self, filter: Filter, fields: PostFields) -> Result<u64, StoreError> {
        let result = self
            .collection
            .update_one(filter_document(&filter), set_fields_document(fields))
            .await
            .map_err(|e| {
                error!("failed to update post {:?}: {}", filter, e);
                StoreError::from(e)
            })?;
        Ok(result.matched_count)
    }

    async fn delete_one(&self, filter: Filter) -> Result<u64, StoreError> {
        let result = self
            .collection
            .delete_one(filter_document(&filter))
            .await
            .map_err(|e| {
                error!("failed to delete post {:?}: {}", filter, e);
                StoreError::from(e)
            })?;
        Ok(result.deleted_count)
    }

    async fn find(&self, filter: Filter) -> Result<PostCursor, StoreError> {
        let cursor = self
            .collection
            .find(filter_document(&filter))
            .await
            .map_err(|e| {
                error!("failed to open cursor {:?}: {}", filter, e);
                StoreError::from(e)
            })?;
        Ok(cursor
            .map(|item| item.map(Post::from).map_err(StoreError::from))
            .boxed())
    }
}
