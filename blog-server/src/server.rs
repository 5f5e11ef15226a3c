use crate::application::post_service::PostService;
use crate::blog::blog_service_server::BlogServiceServer;
use crate::data::post_store::PostStore;
use crate::infrastructure::config::AppConfig;
use crate::presentation::grpc_service::BlogGrpcService;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::signal;
use tokio_stream::wrappers::TcpListenerStream;
use tonic::transport::Server;
use tonic::transport::server::Router;
use tracing::{error, info};

/// Serves the blog gRPC API on the configured address until Ctrl-C.
pub async fn start_grpc_server<S>(
    config: &AppConfig,
    post_service: Arc<PostService<S>>,
) -> anyhow::Result<()>
where
    S: PostStore + 'static,
{
    let addr = config.bind_addr()?;

    info!(%addr, service = %config.service_name, "gRPC server starting");

    build_router(config.request_timeout(), post_service)
        .serve_with_shutdown(addr, shutdown_signal())
        .await?;

    info!("gRPC server stopped");
    Ok(())
}

/// Serves on an already-bound listener until `shutdown` resolves.
pub async fn serve_with_incoming<S, F>(
    listener: TcpListener,
    post_service: Arc<PostService<S>>,
    request_timeout: Option<Duration>,
    shutdown: F,
) -> anyhow::Result<()>
where
    S: PostStore + 'static,
    F: Future<Output = ()>,
{
    let incoming = TcpListenerStream::new(listener);
    build_router(request_timeout, post_service)
        .serve_with_incoming_shutdown(incoming, shutdown)
        .await?;
    Ok(())
}

fn build_router<S>(request_timeout: Option<Duration>, post_service: Arc<PostService<S>>) -> Router
where
    S: PostStore + 'static,
{
    let mut builder = Server::builder();
    if let Some(timeout) = request_timeout {
        builder = builder.timeout(timeout);
    }
    // `timeout` stops at the response head; list streams carry their own deadline.
    let service = BlogGrpcService::new(post_service).with_list_deadline(request_timeout);
    builder.add_service(BlogServiceServer::new(service))
}

async fn shutdown_signal() {
    match signal::ctrl_c().await {
        Ok(()) => info!("gRPC server received shutdown signal"),
        Err(e) => {
            error!("failed to listen for ctrl+c: {}", e);
            std::future::pending::<()>().await;
        }
    }
}
