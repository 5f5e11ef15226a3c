mod error;
mod grpc_client;

pub use error::BlogClientError;
pub use grpc_client::BlogClientGrpc;

pub mod blog {
    tonic::include_proto!("blog");
}

pub use blog::Post;

impl std::fmt::Display for Post {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Post {{ id: {}, author_id: {}, title: {}, content: {} }}",
            self.id, self.author_id, self.title, self.content
        )
    }
}
