pub mod application;
pub mod data;
pub mod domain;
pub mod infrastructure;
pub mod presentation;
pub mod server;

pub mod blog {
    tonic::include_proto!("blog");
}
