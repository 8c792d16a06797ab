use std::sync::atomic::Ordering;

use bson::oid::ObjectId;
use gatehouse_services::store::CredentialStore;
use serde_json::Value;

use crate::fixtures::{fake_provider::FakeProvider, test_app::TestApp};

async fn refresh(app: &TestApp, token: &str, integration_id: &str) -> reqwest::Response {
    app.auth_post("/api/integration/refresh", token)
        .json(&serde_json::json!({ "integration_id": integration_id }))
        .send()
        .await
        .unwrap()
}

#[tokio::test]
async fn integration_views_never_expose_the_client_secret() {
    let app = TestApp::spawn().await;
    let provider = FakeProvider::spawn().await;
    let acme = app.seed_organization("acme").await;
    app.create_integration(&acme, &provider.base_url).await;

    let resp = app
        .auth_get(
            &format!("/api/organization/{}/integration", acme.organization_id),
            &acme.member.access_token,
        )
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);

    let body = resp.text().await.unwrap();
    assert!(!body.contains("test-secret"));
    let integrations: Vec<Value> = serde_json::from_str(&body).unwrap();
    assert_eq!(integrations.len(), 1);
    assert_eq!(integrations[0]["provider"], "notion");
    assert!(integrations[0]["last_synced_at"].is_null());
}

#[tokio::test]
async fn only_owners_create_integrations() {
    let app = TestApp::spawn().await;
    let acme = app.seed_organization("acme").await;

    let resp = app
        .auth_post(
            &format!("/api/organization/{}/integration", acme.organization_id),
            &acme.member.access_token,
        )
        .json(&serde_json::json!({
            "name": "Drive",
            "provider": "google_drive",
            "client_id": "id",
            "client_secret": "secret",
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status().as_u16(), 403);
}

#[tokio::test]
async fn non_http_endpoint_is_invalid_input() {
    let app = TestApp::spawn().await;
    let acme = app.seed_organization("acme").await;

    let resp = app
        .auth_post(
            &format!("/api/organization/{}/integration", acme.organization_id),
            &acme.owner.access_token,
        )
        .json(&serde_json::json!({
            "name": "Wiki",
            "provider": "notion",
            "client_id": "id",
            "client_secret": "secret",
            "token_url": "file:///etc/passwd",
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status().as_u16(), 422);
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["reason"], "token_url");
}

#[tokio::test]
async fn consent_url_requires_http_redirect() {
    let app = TestApp::spawn().await;
    let provider = FakeProvider::spawn().await;
    let acme = app.seed_organization("acme").await;
    let integration_id = app.create_integration(&acme, &provider.base_url).await;

    let resp = app
        .auth_get(
            &format!(
                "/api/integration/{}/authorize?redirect_uri=javascript:alert(1)",
                integration_id
            ),
            &acme.member.access_token,
        )
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 422);
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["reason"], "redirect_uri");

    let resp = app
        .auth_get(
            &format!(
                "/api/integration/{}/authorize?redirect_uri=http://localhost/cb",
                integration_id
            ),
            &acme.member.access_token,
        )
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    let json: Value = resp.json().await.unwrap();
    let url = json["url"].as_str().unwrap();
    assert!(url.starts_with(&format!("{}/authorize?", provider.base_url)));
    assert!(url.contains("client_id=test-client"));
    assert!(!url.contains("test-secret"));
}

#[tokio::test]
async fn callback_stores_credential() {
    let app = TestApp::spawn().await;
    let provider = FakeProvider::spawn().await;
    let acme = app.seed_organization("acme").await;
    let integration_id = app.create_integration(&acme, &provider.base_url).await;

    let credential = app.connect(&acme.member, &integration_id).await;

    assert_eq!(credential["access_token"], "access-1");
    assert_eq!(credential["has_refresh_token"], true);
    assert_eq!(credential["version"], 1);
    assert!(credential.get("refresh_token").is_none());
    assert!(credential["expires_at"].is_string());
    assert_eq!(provider.token_hits(), 1);
}

#[tokio::test]
async fn tampered_state_is_rejected() {
    let app = TestApp::spawn().await;
    let provider = FakeProvider::spawn().await;
    let acme = app.seed_organization("acme").await;
    app.create_integration(&acme, &provider.base_url).await;

    let resp = app
        .auth_post("/api/integration/callback", &acme.member.access_token)
        .json(&serde_json::json!({
            "state": format!("{}.{}.forged.00", acme.member.id, ObjectId::new().to_hex()),
            "code": "code",
            "redirect_uri": "http://localhost/cb",
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status().as_u16(), 422);
    assert_eq!(provider.token_hits(), 0);
}

#[tokio::test]
async fn refresh_rotates_tokens_and_bumps_version() {
    let app = TestApp::spawn().await;
    let provider = FakeProvider::spawn().await;
    let acme = app.seed_organization("acme").await;
    let integration_id = app.create_integration(&acme, &provider.base_url).await;
    app.connect(&acme.member, &integration_id).await;

    let resp = refresh(&app, &acme.member.access_token, &integration_id).await;
    assert_eq!(resp.status().as_u16(), 200);
    let credential: Value = resp.json().await.unwrap();

    assert_eq!(credential["access_token"], "access-2");
    assert_eq!(credential["version"], 2);
    let stored = app
        .store
        .find_credential(
            acme.member.object_id(),
            ObjectId::parse_str(&integration_id).unwrap(),
        )
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.refresh_token.as_deref(), Some("refresh-2"));
}

#[tokio::test]
async fn refresh_without_credential_needs_reauthorization() {
    let app = TestApp::spawn().await;
    let provider = FakeProvider::spawn().await;
    let acme = app.seed_organization("acme").await;
    let integration_id = app.create_integration(&acme, &provider.base_url).await;

    let resp = refresh(&app, &acme.member.access_token, &integration_id).await;

    assert_eq!(resp.status().as_u16(), 409);
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["error"], "no_refresh_token");
    assert_eq!(provider.token_hits(), 0);
}

#[tokio::test]
async fn provider_rejection_leaves_credential_untouched() {
    let app = TestApp::spawn().await;
    let provider = FakeProvider::spawn().await;
    let acme = app.seed_organization("acme").await;
    let integration_id = app.create_integration(&acme, &provider.base_url).await;
    app.connect(&acme.member, &integration_id).await;
    provider.reject_refresh.store(true, Ordering::SeqCst);

    let resp = refresh(&app, &acme.member.access_token, &integration_id).await;

    assert_eq!(resp.status().as_u16(), 502);
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["error"], "refresh_failed");
    assert!(json["message"].as_str().unwrap().contains("invalid_grant"));

    let stored = app
        .store
        .find_credential(
            acme.member.object_id(),
            ObjectId::parse_str(&integration_id).unwrap(),
        )
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.access_token, "access-1");
    assert_eq!(stored.version, 1);
}

#[tokio::test]
async fn disconnect_removes_credential() {
    let app = TestApp::spawn().await;
    let provider = FakeProvider::spawn().await;
    let acme = app.seed_organization("acme").await;
    let integration_id = app.create_integration(&acme, &provider.base_url).await;
    app.connect(&acme.member, &integration_id).await;
    let path = format!("/api/integration/{}/credential", integration_id);

    let resp = app
        .auth_delete(&path, &acme.member.access_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 204);

    let resp = refresh(&app, &acme.member.access_token, &integration_id).await;
    assert_eq!(resp.status().as_u16(), 409);

    let resp = app
        .auth_delete(&path, &acme.member.access_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 404);
}

#[tokio::test]
async fn sync_without_credential_needs_reauthorization() {
    let app = TestApp::spawn().await;
    let provider = FakeProvider::spawn().await;
    let acme = app.seed_organization("acme").await;
    let integration_id = app.create_integration(&acme, &provider.base_url).await;

    let resp = app
        .auth_post("/api/integration/sync", &acme.owner.access_token)
        .json(&serde_json::json!({ "integration_id": integration_id }))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status().as_u16(), 409);
    assert_eq!(provider.search_hits(), 0);
}

#[tokio::test]
async fn undrained_listing_fails_sync() {
    let app = TestApp::spawn_with_settings(|s| s.sync.max_pages = 1).await;
    let provider = FakeProvider::spawn().await;
    let acme = app.seed_organization("acme").await;
    let integration_id = app.create_integration(&acme, &provider.base_url).await;
    app.connect(&acme.owner, &integration_id).await;

    let resp = app
        .auth_post("/api/integration/sync", &acme.owner.access_token)
        .json(&serde_json::json!({ "integration_id": integration_id }))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status().as_u16(), 502);
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["error"], "sync_failed");

    let resp = app
        .auth_get(
            &format!("/api/organization/{}/integration", acme.organization_id),
            &acme.owner.access_token,
        )
        .send()
        .await
        .unwrap();
    let integrations: Vec<Value> = resp.json().await.unwrap();
    assert!(integrations[0]["last_synced_at"].is_null());
}

#[tokio::test]
async fn removing_integration_cascades() {
    let app = TestApp::spawn().await;
    let provider = FakeProvider::spawn().await;
    let acme = app.seed_organization("acme").await;
    let integration_id = app.create_integration(&acme, &provider.base_url).await;
    app.connect(&acme.member, &integration_id).await;

    let resp = app
        .auth_delete(
            &format!(
                "/api/organization/{}/integration/{}",
                acme.organization_id, integration_id
            ),
            &acme.owner.access_token,
        )
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 204);

    let resp = refresh(&app, &acme.member.access_token, &integration_id).await;
    assert_eq!(resp.status().as_u16(), 404);
    assert!(
        app.store
            .find_credential(
                acme.member.object_id(),
                ObjectId::parse_str(&integration_id).unwrap(),
            )
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn health_reports_version() {
    let app = TestApp::spawn().await;

    let resp = app.get("/health").send().await.unwrap();

    assert_eq!(resp.status().as_u16(), 200);
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["status"], "ok");
}
