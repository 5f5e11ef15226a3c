use crate::application::post_service::PostService;
use crate::blog::blog_service_server::BlogService;
use crate::blog::{
    CreatePostRequest, DeletePostRequest, ListPostsRequest, Post as ProtoPost, ReadPostRequest,
    UpdatePostRequest, UpdatePostResponse,
};
use crate::data::post_store::PostStore;
use crate::domain::error::BlogError;
use crate::domain::post::Post;
use futures_util::StreamExt;
use futures_util::stream::BoxStream;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::{CancellationToken, DropGuard};
use tonic::{Request, Response, Status};

pub struct BlogGrpcService<S>
where
    S: PostStore + 'static,
{
    post_service: Arc<PostService<S>>,
    list_deadline: Option<Duration>,
}

impl<S> Clone for BlogGrpcService<S>
where
    S: PostStore + 'static,
{
    fn clone(&self) -> Self {
        Self {
            post_service: Arc::clone(&self.post_service),
            list_deadline: self.list_deadline,
        }
    }
}

impl<S> BlogGrpcService<S>
where
    S: PostStore + 'static,
{
    pub fn new(post_service: Arc<PostService<S>>) -> Self {
        Self {
            post_service,
            list_deadline: None,
        }
    }

    /// Bounds how long a ListPosts stream may keep producing. The server-wide
    /// request timeout only covers the response head, not the streamed body.
    pub fn with_list_deadline(mut self, deadline: Option<Duration>) -> Self {
        self.list_deadline = deadline;
        self
    }
}

#[tonic::async_trait]
impl<S> BlogService for BlogGrpcService<S>
where
    S: PostStore + 'static,
{
    type ListPostsStream = BoxStream<'static, Result<ProtoPost, Status>>;

    async fn create_post(
        &self,
        request: Request<CreatePostRequest>,
    ) -> Result<Response<ProtoPost>, Status> {
        let (cancel, _guard) = call_token();
        let req = request.into_inner();
        tracing::info!(author_id = %req.author_id, "create post request");

        let post = self
            .post_service
            .create_post(req.author_id, req.title, req.content, &cancel)
            .await
            .map_err(map_blog_error_to_status)?;

        tracing::info!(post_id = %post.id, "created new post");

        Ok(Response::new(post.into()))
    }

    async fn read_post(
        &self,
        request: Request<ReadPostRequest>,
    ) -> Result<Response<ProtoPost>, Status> {
        let (cancel, _guard) = call_token();
        let req = request.into_inner();
        tracing::info!(post_id = %req.id, "read post request");

        let post = self
            .post_service
            .get_post(&req.id, &cancel)
            .await
            .map_err(map_blog_error_to_status)?;

        Ok(Response::new(post.into()))
    }

    async fn update_post(
        &self,
        request: Request<UpdatePostRequest>,
    ) -> Result<Response<UpdatePostResponse>, Status> {
        let (cancel, _guard) = call_token();
        let post = Post::from(request.into_inner());
        let post_id = post.id.clone();
        tracing::info!(post_id = %post_id, "update post request");

        self.post_service
            .update_post(post, &cancel)
            .await
            .map_err(map_blog_error_to_status)?;

        tracing::info!(post_id = %post_id, "updated post");

        Ok(Response::new(UpdatePostResponse {}))
    }

    async fn delete_post(
        &self,
        request: Request<DeletePostRequest>,
    ) -> Result<Response<ProtoPost>, Status> {
        let (cancel, _guard) = call_token();
        let req = request.into_inner();
        tracing::info!(post_id = %req.id, "delete post request");

        let snapshot = self
            .post_service
            .delete_post(&req.id, &cancel)
            .await
            .map_err(map_blog_error_to_status)?;

        tracing::info!(post_id = %snapshot.id, "deleted post");

        Ok(Response::new(snapshot.into()))
    }

    async fn list_posts(
        &self,
        _request: Request<ListPostsRequest>,
    ) -> Result<Response<Self::ListPostsStream>, Status> {
        let (cancel, guard) = call_token();
        tracing::info!("list posts request");
        if let Some(deadline) = self.list_deadline {
            cancel_after(&cancel, deadline);
        }

        let posts = self
            .post_service
            .list_posts(cancel)
            .await
            .map_err(map_blog_error_to_status)?;

        // The guard travels with the response stream: once tonic drops the
        // stream (finished, client gone, deadline hit) the producer is
        // cancelled and its cursor released.
        let stream = posts.map(move |item| {
            let _call = &guard;
            item.map(ProtoPost::from).map_err(map_blog_error_to_status)
        });

        Ok(Response::new(stream.boxed()))
    }
}

/// Cancels `cancel` once `deadline` has elapsed, unless it was cancelled
/// earlier for another reason.
fn cancel_after(cancel: &CancellationToken, deadline: Duration) {
    let cancel = cancel.clone();
    tokio::spawn(async move {
        tokio::select! {
            _ = cancel.cancelled() => {}
            _ = tokio::time::sleep(deadline) => {
                tracing::warn!(?deadline, "list posts deadline exceeded");
                cancel.cancel();
            }
        }
    });
}

/// Token for one call, cancelled when the returned guard is dropped.
fn call_token() -> (CancellationToken, DropGuard) {
    let cancel = CancellationToken::new();
    let guard = cancel.clone().drop_guard();
    (cancel, guard)
}

fn map_blog_error_to_status(err: BlogError) -> Status {
    match err {
        BlogError::NotFound(id) => {
            Status::not_found(format!("Cannot find post with specified ID: {id}"))
        }
        BlogError::Internal(msg) => Status::internal(format!("Internal error: {msg}")),
        BlogError::Cancelled => Status::cancelled("Operation cancelled"),
    }
}

impl From<Post> for ProtoPost {
    fn from(p: Post) -> Self {
        ProtoPost {
            id: p.id,
            author_id: p.author_id,
            title: p.title,
            content: p.content,
        }
    }
}

impl From<UpdatePostRequest> for Post {
    fn from(update: UpdatePostRequest) -> Self {
        Post {
            id: update.id,
            author_id: update.author_id,
            title: update.title,
            content: update.content,
        }
    }
}
