use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use axum::{
    Form, Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::post,
};
use serde_json::{Value, json};
use tokio::net::TcpListener;

/// A Notion-shaped provider: an OAuth token endpoint plus a paginated search.
///
/// Every token issued is `access-{n}` / `refresh-{n}` where `n` counts token
/// endpoint hits.
#[derive(Clone)]
pub struct FakeProvider {
    pub base_url: String,
    pub token_hits: Arc<AtomicUsize>,
    pub search_hits: Arc<AtomicUsize>,
    pub reject_refresh: Arc<AtomicBool>,
}

impl FakeProvider {
    pub async fn spawn() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind fake provider");
        let addr = listener.local_addr().unwrap();

        let provider = Self {
            base_url: format!("http://{}", addr),
            token_hits: Arc::new(AtomicUsize::new(0)),
            search_hits: Arc::new(AtomicUsize::new(0)),
            reject_refresh: Arc::new(AtomicBool::new(false)),
        };

        let app = Router::new()
            .route("/token", post(token))
            .route("/v1/search", post(search))
            .with_state(provider.clone());

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        provider
    }

    pub fn token_hits(&self) -> usize {
        self.token_hits.load(Ordering::SeqCst)
    }

    pub fn search_hits(&self) -> usize {
        self.search_hits.load(Ordering::SeqCst)
    }
}

async fn token(
    State(provider): State<FakeProvider>,
    Form(form): Form<HashMap<String, String>>,
) -> Response {
    let grant = form.get("grant_type").map(String::as_str).unwrap_or_default();
    if grant == "refresh_token" && provider.reject_refresh.load(Ordering::SeqCst) {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "invalid_grant", "error_description": "token revoked" })),
        )
            .into_response();
    }

    let n = provider.token_hits.fetch_add(1, Ordering::SeqCst) + 1;
    Json(json!({
        "access_token": format!("access-{n}"),
        "refresh_token": format!("refresh-{n}"),
        "expires_in": 3600,
        "token_type": "bearer",
    }))
    .into_response()
}

fn page(id: &str, title: &str, parent: Value) -> Value {
    json!({
        "object": "page",
        "id": id,
        "url": format!("https://notion.so/{id}"),
        "parent": parent,
        "properties": {
            "Name": { "type": "title", "title": [{ "plain_text": title }] }
        }
    })
}

/// Two pages of results. `page-2` is nested and `page-1` shows up twice.
async fn search(
    State(provider): State<FakeProvider>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let authorized = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("Bearer access-"));
    if !authorized {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "object": "error", "message": "API token is invalid." })),
        )
            .into_response();
    }
    provider.search_hits.fetch_add(1, Ordering::SeqCst);

    let workspace = json!({ "type": "workspace", "workspace": true });
    match body.get("start_cursor").and_then(Value::as_str) {
        None => Json(json!({
            "object": "list",
            "results": [
                page("page-1", "Roadmap", workspace.clone()),
                page("page-2", "Nested", json!({ "type": "page_id", "page_id": "page-1" })),
                {
                    "object": "database",
                    "id": "db-1",
                    "url": "https://notion.so/db-1",
                    "parent": workspace,
                    "title": [{ "plain_text": "Tasks" }]
                }
            ],
            "next_cursor": "cursor-2",
            "has_more": true
        }))
        .into_response(),
        Some(_) => Json(json!({
            "object": "list",
            "results": [
                page("page-1", "Roadmap (dup)", workspace.clone()),
                page("page-3", "", workspace)
            ],
            "next_cursor": null,
            "has_more": false
        }))
        .into_response(),
    }
}
