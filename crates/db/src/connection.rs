use gatehouse_config::DatabaseSettings;
use mongodb::{Client, Database, options::ClientOptions};
use tracing::info;

/// Opens the pool described by `database` and pings it before handing it out.
pub async fn connect(database: &DatabaseSettings) -> Result<Database, mongodb::error::Error> {
    let mut client_options = ClientOptions::parse(&database.url).await?;
    client_options.app_name = Some("gatehouse".to_string());
    client_options.max_pool_size = database.max_pool_size;
    client_options.min_pool_size = database.min_pool_size;

    let client = Client::with_options(client_options)?;

    client
        .database("admin")
        .run_command(bson::doc! { "ping": 1 })
        .await?;

    info!(db = %database.name, "Connected to MongoDB");

    Ok(client.database(&database.name))
}
