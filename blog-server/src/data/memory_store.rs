//! In-memory post store. Keeps documents in insertion order; data is lost on
//! restart.

use crate::data::post_store::{Filter, PostCursor, PostStore, StoreError};
use crate::domain::post::{Post, PostFields};
use async_trait::async_trait;
use futures_util::StreamExt;
use futures_util::stream;
use tokio::sync::RwLock;
use tracing::debug;

#[derive(Default)]
pub struct InMemoryPostStore {
    posts: RwLock<Vec<Post>>,
}

impl InMemoryPostStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.posts.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.posts.read().await.is_empty()
    }
}

#[async_trait]
impl PostStore for InMemoryPostStore {
    async fn insert_one(&self, post: &Post) -> Result<(), StoreError> {
        let mut posts = self.posts.write().await;
        if posts.iter().any(|p| p.id == post.id) {
            return Err(StoreError::Backend(format!(
                "duplicate key: id {}",
                post.id
            )));
        }
        posts.push(post.clone());
        debug!(post_id = %post.id, "post stored in memory");
        Ok(())
    }

    async fn find_one(&self, filter: Filter) -> Result<Option<Post>, StoreError> {
        let posts = self.posts.read().await;
        Ok(posts.iter().find(|p| filter.matches(p)).cloned())
    }

    async fn update_one(&self, filter: Filter, fields: PostFields) -> Result<u64, StoreError> {
        let mut posts = self.posts.write().await;
        match posts.iter_mut().find(|p| filter.matches(p)) {
            Some(post) => {
                let id = std::mem::take(&mut post.id);
                *post = Post::with_fields(id, fields);
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn delete_one(&self, filter: Filter) -> Result<u64, StoreError> {
        let mut posts = self.posts.write().await;
        match posts.iter().position(|p| filter.matches(p)) {
            Some(index) => {
                posts.remove(index);
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn find(&self, filter: Filter) -> Result<PostCursor, StoreError> {
        // Snapshot at open time, similar to what a store cursor would observe.
        let snapshot: Vec<Post> = self
            .posts
            .read()
            .await
            .iter()
            .filter(|p| filter.matches(p))
            .cloned()
            .collect();
        Ok(stream::iter(snapshot.into_iter().map(Ok)).boxed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post(id: &str, title: &str) -> Post {
        Post {
            id: id.to_string(),
            author_id: "author".to_string(),
            title: title.to_string(),
            content: "body".to_string(),
        }
    }

    #[tokio::test]
    async fn test_insert_and_find_one() {
        let store = InMemoryPostStore::new();
        store.insert_one(&post("a", "first")).await.unwrap();

        let found = store.find_one(Filter::id("a")).await.unwrap();
        assert_eq!(found, Some(post("a", "first")));
        assert_eq!(store.find_one(Filter::id("b")).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_insert_rejects_duplicate_id() {
        let store = InMemoryPostStore::new();
        store.insert_one(&post("a", "first")).await.unwrap();

        let err = store.insert_one(&post("a", "again")).await.unwrap_err();
        assert!(matches!(err, StoreError::Backend(_)));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_update_keeps_id_and_reports_matches() {
        let store = InMemoryPostStore::new();
        store.insert_one(&post("a", "first")).await.unwrap();

        let fields = PostFields {
            author_id: "someone".to_string(),
            title: "changed".to_string(),
            content: "new body".to_string(),
        };
        assert_eq!(store.update_one(Filter::id("a"), fields.clone()).await.unwrap(), 1);
        assert_eq!(store.update_one(Filter::id("zzz"), fields.clone()).await.unwrap(), 0);

        let updated = store.find_one(Filter::id("a")).await.unwrap().unwrap();
        assert_eq!(updated, Post::with_fields("a".to_string(), fields));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_find_all_preserves_insertion_order() {
        let store = InMemoryPostStore::new();
        for id in ["c", "a", "b"] {
            store.insert_one(&post(id, id)).await.unwrap();
        }
        store.delete_one(Filter::id("a")).await.unwrap();

        let ids: Vec<String> = store
            .find(Filter::All)
            .await
            .unwrap()
            .map(|r| r.unwrap().id)
            .collect()
            .await;
        assert_eq!(ids, vec!["c".to_string(), "b".to_string()]);
    }

    #[tokio::test]
    async fn test_delete_missing_is_zero() {
        let store = InMemoryPostStore::new();
        assert_eq!(store.delete_one(Filter::id("a")).await.unwrap(), 0);
        assert!(store.is_empty().await);
    }
}
