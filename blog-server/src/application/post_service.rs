use std::future::Future;
use std::sync::Arc;

use crate::data::post_store::{Filter, PostStore, StoreError};
use crate::domain::{error::BlogError, post::Post};
use futures_util::StreamExt;
use futures_util::stream::{self, BoxStream};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, instrument, warn};

/// Stream handed out by [`PostService::list_posts`].
pub type PostStream = BoxStream<'static, Result<Post, BlogError>>;

/// How many decoded posts the list producer may buffer ahead of the consumer.
const LIST_BUFFER: usize = 32;

/// Stateless handler for the five post operations. Every call goes straight to
/// the store; the only thing held between calls is the shared store handle.
pub struct PostService<S: PostStore + 'static> {
    store: Arc<S>,
}

impl<S: PostStore + 'static> Clone for PostService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S> PostService<S>
where
    S: PostStore + 'static,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    #[instrument(skip(self, content, cancel))]
    pub async fn create_post(
        &self,
        author_id: String,
        title: String,
        content: String,
        cancel: &CancellationToken,
    ) -> Result<Post, BlogError> {
        let post = Post::new(author_id, title, content);
        until_cancelled(cancel, async {
            self.store
                .insert_one(&post)
                .await
                .map_err(|e| BlogError::Internal(format!("failed to create post: {e}")))
        })
        .await?;
        debug!(post_id = %post.id, "post created");
        Ok(post)
    }

    #[instrument(skip(self, cancel))]
    pub async fn get_post(&self, id: &str, cancel: &CancellationToken) -> Result<Post, BlogError> {
        until_cancelled(cancel, self.fetch(id)).await
    }

    /// Overwrites author, title and content of the post with `post.id`. The
    /// existence check is the store's match count, so an unknown id is
    /// reported without a prior read and nothing is created.
    #[instrument(skip(self, cancel), fields(post_id = %post.id))]
    pub async fn update_post(&self, post: Post, cancel: &CancellationToken) -> Result<(), BlogError> {
        let (id, fields) = post.into_parts();
        let matched = until_cancelled(cancel, async {
            self.store
                .update_one(Filter::id(id.as_str()), fields)
                .await
                .map_err(|e| BlogError::Internal(format!("failed to update post: {e}")))
        })
        .await?;

        if matched == 0 {
            return Err(BlogError::NotFound(id));
        }
        Ok(())
    }

    /// Fetches the post, then deletes it, returning the fetched snapshot.
    ///
    /// The two steps are not atomic. Concurrent deletes of one id can both
    /// pass the fetch, and a failed delete after a successful fetch surfaces
    /// as `Internal` while the document may still exist.
    #[instrument(skip(self, cancel))]
    pub async fn delete_post(&self, id: &str, cancel: &CancellationToken) -> Result<Post, BlogError> {
        until_cancelled(cancel, async {
            let snapshot = self.fetch(id).await?;
            let deleted = self
                .store
                .delete_one(Filter::id(id))
                .await
                .map_err(|e| BlogError::Internal(format!("failed to delete post: {e}")))?;
            if deleted == 0 {
                warn!(post_id = %id, "post vanished between fetch and delete");
            }
            Ok(snapshot)
        })
        .await
    }

    /// Streams every stored post in store order.
    ///
    /// Opening the cursor happens before this returns; reading it happens on a
    /// background task feeding a bounded channel. The task stops, dropping the
    /// cursor, when the cursor is exhausted, when an item fails to decode,
    /// when `cancel` fires, or when the returned stream is dropped.
    ///
    /// A listing that stops before the cursor is exhausted always ends with an
    /// error item, even when the channel was full at the time of
    /// cancellation.
    #[instrument(skip(self, cancel))]
    pub async fn list_posts(&self, cancel: CancellationToken) -> Result<PostStream, BlogError> {
        let mut cursor = until_cancelled(&cancel, async {
            self.store
                .find(Filter::All)
                .await
                .map_err(|e| BlogError::Internal(format!("failed to open cursor: {e}")))
        })
        .await?;

        let (tx, rx) = mpsc::channel::<Result<Post, BlogError>>(LIST_BUFFER);
        let exhausted = Arc::new(AtomicBool::new(false));
        let producer_exhausted = Arc::clone(&exhausted);
        let producer_cancel = cancel.clone();

        tokio::spawn(
            async move {
                let cancel = producer_cancel;
                let mut sent = 0usize;
                loop {
                    let next = tokio::select! {
                        biased;
                        _ = cancel.cancelled() => {
                            debug!(sent, "post listing cancelled");
                            return;
                        }
                        _ = tx.closed() => {
                            debug!(sent, "post listing abandoned by consumer");
                            return;
                        }
                        next = cursor.next() => next,
                    };

                    let item = match next {
                        Some(Ok(post)) => Ok(post),
                        Some(Err(e)) => Err(list_error(e)),
                        None => break,
                    };
                    let failed = item.is_err();

                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => {
                            debug!(sent, "post listing cancelled");
                            return;
                        }
                        res = tx.send(item) => {
                            if res.is_err() {
                                return;
                            }
                        }
                    }

                    if failed {
                        warn!(sent, "post listing aborted by cursor error");
                        return;
                    }
                    sent += 1;
                }
                producer_exhausted.store(true, Ordering::Release);
                debug!(sent, "post listing complete");
            }
            .in_current_span(),
        );

        Ok(listing(rx, exhausted, cancel))
    }

    async fn fetch(&self, id: &str) -> Result<Post, BlogError> {
        match self.store.find_one(Filter::id(id)).await {
            Ok(Some(post)) => Ok(post),
            Ok(None) => Err(BlogError::NotFound(id.to_string())),
            Err(StoreError::Decode(e)) => {
                warn!(post_id = %id, "stored post failed to decode: {}", e);
                Err(BlogError::NotFound(id.to_string()))
            }
            Err(e @ StoreError::Backend(_)) => {
                Err(BlogError::Internal(format!("failed to fetch post: {e}")))
            }
        }
    }
}

/// Consumer side of a listing. Ends after the first error item; if the
/// producer went away without exhausting the cursor and without sending an
/// error, the listing ends with `Cancelled` (or `Internal` if nobody
/// cancelled it).
fn listing(
    rx: mpsc::Receiver<Result<Post, BlogError>>,
    exhausted: Arc<AtomicBool>,
    cancel: CancellationToken,
) -> PostStream {
    stream::unfold(Some(rx), move |state| {
        let exhausted = Arc::clone(&exhausted);
        let cancel = cancel.clone();
        async move {
            let mut rx = state?;
            match rx.recv().await {
                Some(Ok(post)) => Some((Ok(post), Some(rx))),
                Some(Err(e)) => Some((Err(e), None)),
                None if exhausted.load(Ordering::Acquire) => None,
                None if cancel.is_cancelled() => Some((Err(BlogError::Cancelled), None)),
                None => Some((
                    Err(BlogError::Internal("post listing stopped early".to_string())),
                    None,
                )),
            }
        }
    })
    .boxed()
}

fn list_error(err: StoreError) -> BlogError {
    BlogError::Internal(format!("failed to read post from cursor: {err}"))
}

async fn until_cancelled<T, F>(cancel: &CancellationToken, fut: F) -> Result<T, BlogError>
where
    F: Future<Output = Result<T, BlogError>>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(BlogError::Cancelled),
        res = fut => res,
    }
}
