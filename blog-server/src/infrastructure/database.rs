use crate::data::mongo_store::PostDocument;
use crate::infrastructure::config::MongoConfig;
use mongodb::bson::doc;
use mongodb::options::ClientOptions;
use mongodb::{Client, Collection};
use std::time::Duration;
use tracing::info;

/// Connects to MongoDB and checks the deployment is reachable before handing
/// out the posts collection.
pub async fn connect(
    config: &MongoConfig,
    app_name: &str,
) -> Result<Collection<PostDocument>, mongodb::error::Error> {
    let mut options = ClientOptions::parse(&config.uri).await?;
    options.app_name = Some(app_name.to_string());
    options.server_selection_timeout = Some(Duration::from_secs(5));
    options.connect_timeout = Some(Duration::from_secs(5));

    let client = Client::with_options(options)?;
    let database = client.database(&config.database);
    database.run_command(doc! { "ping": 1 }).await?;
    info!(
        database = %config.database,
        collection = %config.collection,
        "connected to MongoDB"
    );

    Ok(database.collection::<PostDocument>(&config.collection))
}
