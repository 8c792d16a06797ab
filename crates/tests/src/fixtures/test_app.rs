use std::net::SocketAddr;
use std::sync::Arc;

use gatehouse_api::{build_router, state::AppState};
use gatehouse_config::{
    AppSettings, DatabaseBackend, DatabaseSettings, JwtSettings, OAuthSettings, Settings,
    SyncSettings,
};
use gatehouse_services::{AuthService, MemoryStore, Stores};
use tokio::net::TcpListener;

/// A running test application backed by its own in-memory store.
///
/// The store handle stands in for the hosted identity backend: tests create
/// identities on it directly and mint session tokens with `auth`.
pub struct TestApp {
    pub addr: SocketAddr,
    pub base_url: String,
    pub store: Arc<MemoryStore>,
    pub settings: Settings,
    pub auth: AuthService,
    pub client: reqwest::Client,
}

impl TestApp {
    pub async fn spawn() -> Self {
        Self::spawn_with_settings(|_| {}).await
    }

    /// Spawn a test server with customized settings.
    ///
    /// The `mutator` closure receives a `&mut Settings` after defaults are applied.
    pub async fn spawn_with_settings(mutator: impl FnOnce(&mut Settings)) -> Self {
        let mut settings = test_settings();
        mutator(&mut settings);

        let store = Arc::new(MemoryStore::new());
        let app_state = AppState::new(Stores::from_memory(store.clone()), settings.clone())
            .expect("Failed to create AppState");
        let app = build_router(app_state);

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let client = reqwest::Client::builder()
            .build()
            .expect("Failed to build HTTP client");

        Self {
            addr,
            base_url: format!("http://{}", addr),
            auth: AuthService::new(settings.jwt.clone()),
            store,
            settings,
            client,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.client.get(self.url(path))
    }

    pub fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.client.post(self.url(path))
    }

    pub fn auth_get(&self, path: &str, token: &str) -> reqwest::RequestBuilder {
        self.client
            .get(self.url(path))
            .header("Authorization", format!("Bearer {}", token))
    }

    pub fn auth_post(&self, path: &str, token: &str) -> reqwest::RequestBuilder {
        self.client
            .post(self.url(path))
            .header("Authorization", format!("Bearer {}", token))
    }

    pub fn auth_put(&self, path: &str, token: &str) -> reqwest::RequestBuilder {
        self.client
            .put(self.url(path))
            .header("Authorization", format!("Bearer {}", token))
    }

    pub fn auth_delete(&self, path: &str, token: &str) -> reqwest::RequestBuilder {
        self.client
            .delete(self.url(path))
            .header("Authorization", format!("Bearer {}", token))
    }
}

fn test_settings() -> Settings {
    Settings {
        app: AppSettings {
            host: "127.0.0.1".to_string(),
            port: 0,
        },
        database: DatabaseSettings {
            backend: DatabaseBackend::Memory,
            url: "mongodb://localhost:27017".to_string(),
            name: "gatehouse_test".to_string(),
            max_pool_size: Some(5),
            min_pool_size: Some(1),
        },
        jwt: JwtSettings {
            secret: "test-secret-key-for-jwt-signing-minimum-32-chars".to_string(),
            access_token_ttl_secs: 3600,
            issuer: "gatehouse".to_string(),
        },
        oauth: OAuthSettings {
            http_timeout_secs: 5,
            refresh_skew_secs: 60,
            state_secret: "test-state-secret".to_string(),
        },
        sync: SyncSettings {
            max_pages: 10,
            page_size: 100,
        },
    }
}
