use std::sync::Arc;

use blog_server::application::post_service::PostService;
use blog_server::data::memory_store::InMemoryPostStore;
use blog_server::data::mongo_store::MongoPostStore;
use blog_server::data::post_store::PostStore;
use blog_server::infrastructure::config::{AppConfig, StorageBackend};
use blog_server::infrastructure::database;
use blog_server::infrastructure::logging::init_logging;
use blog_server::server::start_grpc_server;
use tracing::warn;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();

    let config = AppConfig::load()?;

    match config.storage {
        StorageBackend::Mongo => {
            let collection = database::connect(&config.db, &config.service_name).await?;
            let store = MongoPostStore::new(collection);
            store.ensure_indexes().await?;
            run(&config, store).await
        }
        StorageBackend::Memory => {
            warn!("using in-memory storage, posts will not survive a restart");
            run(&config, InMemoryPostStore::new()).await
        }
    }
}

async fn run<S>(config: &AppConfig, store: S) -> anyhow::Result<()>
where
    S: PostStore + 'static,
{
    let post_service = Arc::new(PostService::new(Arc::new(store)));
    start_grpc_server(config, post_service).await
}
