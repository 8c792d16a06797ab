use gatehouse_config::{DatabaseBackend, DatabaseSettings};
use gatehouse_db::{connect, indexes::ensure_indexes};
use mongodb::Database;

/// A fresh, indexed database on the MongoDB named by `GATEHOUSE__DATABASE__URL`.
///
/// Returns `None` when the variable is unset; Mongo-backed tests then return
/// early. Each call gets its own database name for isolation.
pub async fn test_database() -> Option<Database> {
    let url = std::env::var("GATEHOUSE__DATABASE__URL").ok()?;
    let settings = DatabaseSettings {
        backend: DatabaseBackend::Mongo,
        url,
        name: format!("gatehouse_test_{}", nanoid::nanoid!(12, &nanoid::alphabet::SAFE)),
        max_pool_size: Some(5),
        min_pool_size: Some(1),
    };

    let db = connect(&settings)
        .await
        .expect("Failed to connect to test MongoDB");
    ensure_indexes(&db).await.expect("Failed to create indexes");
    Some(db)
}
