use crate::blog::blog_service_client::BlogServiceClient;
use crate::blog::{
    CreatePostRequest, DeletePostRequest, ListPostsRequest, ReadPostRequest, UpdatePostRequest,
};
use crate::error::BlogClientError;
use crate::Post;
use tonic::Streaming;
use tonic::transport::Channel;
use tracing::debug;

#[derive(Clone)]
pub struct BlogClientGrpc {
    client: BlogServiceClient<Channel>,
}

impl BlogClientGrpc {
    /// Connects to a blog gRPC server, e.g. `http://127.0.0.1:50051`.
    pub async fn connect(endpoint: &str) -> Result<Self, BlogClientError> {
        let channel = Channel::from_shared(endpoint.to_owned())
            .map_err(|e| BlogClientError::InvalidEndpoint(format!("{endpoint}: {e}")))?
            .connect()
            .await?;
        Ok(Self {
            client: BlogServiceClient::new(channel),
        })
    }

    /// Returns the stored post, including the id the server assigned.
    pub async fn create_post(
        &mut self,
        author_id: String,
        title: String,
        content: String,
    ) -> Result<Post, BlogClientError> {
        let response = self
            .client
            .create_post(CreatePostRequest {
                author_id,
                title,
                content,
            })
            .await?;
        Ok(response.into_inner())
    }

    pub async fn read_post(&mut self, id: String) -> Result<Post, BlogClientError> {
        let response = self.client.read_post(ReadPostRequest { id }).await?;
        Ok(response.into_inner())
    }

    /// Replaces author, title and content of the post with `post.id`.
    pub async fn update_post(&mut self, post: Post) -> Result<(), BlogClientError> {
        self.client
            .update_post(UpdatePostRequest {
                id: post.id,
                author_id: post.author_id,
                title: post.title,
                content: post.content,
            })
            .await?;
        Ok(())
    }

    /// Deletes the post and returns it as it was before deletion.
    pub async fn delete_post(&mut self, id: String) -> Result<Post, BlogClientError> {
        let response = self.client.delete_post(DeletePostRequest { id }).await?;
        Ok(response.into_inner())
    }

    /// Opens the server stream of all posts.
    pub async fn stream_posts(&mut self) -> Result<Streaming<Post>, BlogClientError> {
        let response = self.client.list_posts(ListPostsRequest {}).await?;
        Ok(response.into_inner())
    }

    /// Drains the post stream into memory.
    pub async fn list_posts(&mut self) -> Result<Vec<Post>, BlogClientError> {
        let mut stream = self.stream_posts().await?;
        let mut posts = Vec::new();
        while let Some(post) = stream.message().await? {
            posts.push(post);
        }
        debug!(count = posts.len(), "received posts");
        Ok(posts)
    }
}
