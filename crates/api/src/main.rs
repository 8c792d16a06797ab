use gatehouse_api::{build_router, state::AppState};
use gatehouse_config::{DatabaseBackend, Settings};
use gatehouse_db::{connect, indexes::ensure_indexes};
use gatehouse_services::Stores;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file (silently ignore if missing)
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            "gatehouse_api=debug,gatehouse_services=debug,gatehouse_db=debug,tower_http=debug"
                .into()
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let settings = Settings::load()?;
    info!("Starting Gatehouse API on {}:{}", settings.app.host, settings.app.port);

    let stores = match settings.database.backend {
        DatabaseBackend::Mongo => {
            let db = connect(&settings.database).await?;
            ensure_indexes(&db).await?;
            Stores::mongo(&db)
        }
        DatabaseBackend::Memory => {
            warn!("Using the in-memory store; data is lost on restart");
            Stores::memory()
        }
    };

    let app_state = AppState::new(stores, settings.clone())?;
    let app = build_router(app_state);

    let addr = format!("{}:{}", settings.app.host, settings.app.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
