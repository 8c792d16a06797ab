pub mod error;
pub mod extractors;
pub mod routes;
pub mod state;

use axum::{
    Router,
    routing::{delete, get, post, put},
};
use state::AppState;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Privileged member actions with an optional organization scope
    let admin_routes = Router::new()
        .route("/delete-user", post(routes::admin::delete_user))
        .route("/reset-password", post(routes::admin::reset_password));

    let organization_routes = Router::new().route("/", post(routes::organization::create));

    // Member routes (under organization)
    let member_routes = Router::new()
        .route("/", post(routes::member::add))
        .route("/{user_id}", delete(routes::member::delete))
        .route("/{user_id}/password", put(routes::member::reset_password))
        .route("/{user_id}/role", put(routes::member::change_role));

    // Group routes (under organization)
    let group_routes = Router::new()
        .route("/", post(routes::group::create))
        .route("/{group_id}/member", post(routes::group::add_member))
        .route("/{group_id}/permission", post(routes::group::grant))
        .route(
            "/{group_id}/permission/{resource_id}",
            delete(routes::group::revoke),
        );

    // Integration administration (under organization)
    let org_integration_routes = Router::new()
        .route(
            "/",
            get(routes::integration::list).post(routes::integration::create),
        )
        .route("/{integration_id}", delete(routes::integration::remove));

    let resource_routes = Router::new().route("/", get(routes::resource::list));

    // Per-user credential and sync routes
    let integration_routes = Router::new()
        .route("/callback", post(routes::integration::callback))
        .route("/refresh", post(routes::integration::refresh))
        .route("/sync", post(routes::integration::sync))
        .route(
            "/{integration_id}/authorize",
            get(routes::integration::authorize),
        )
        .route(
            "/{integration_id}/credential",
            delete(routes::integration::disconnect),
        );

    let api = Router::new()
        .nest("/admin", admin_routes)
        .nest("/organization", organization_routes)
        .nest("/organization/{organization_id}/member", member_routes)
        .nest("/organization/{organization_id}/group", group_routes)
        .nest(
            "/organization/{organization_id}/integration",
            org_integration_routes,
        )
        .nest("/organization/{organization_id}/resource", resource_routes)
        .nest("/integration", integration_routes);

    // Health check
    let health = Router::new().route("/health", get(health_check));

    Router::new()
        .nest("/api", api)
        .merge(health)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn health_check() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
