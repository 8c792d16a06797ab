use serde_json::Value;

use crate::fixtures::{fake_provider::FakeProvider, seed::SeededOrganization, test_app::TestApp};

async fn list_resources(app: &TestApp, org: &SeededOrganization, token: &str) -> Vec<Value> {
    let resp = app
        .auth_get(
            &format!("/api/organization/{}/resource", org.organization_id),
            token,
        )
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    resp.json().await.unwrap()
}

fn resource_ids(resources: &[Value]) -> Vec<&str> {
    resources
        .iter()
        .map(|r| r["resource_id"].as_str().unwrap())
        .collect()
}

async fn sync(app: &TestApp, token: &str, integration_id: &str) -> Value {
    let resp = app
        .auth_post("/api/integration/sync", token)
        .json(&serde_json::json!({ "integration_id": integration_id }))
        .send()
        .await
        .unwrap();
    assert!(
        resp.status().is_success(),
        "Sync failed: {}",
        resp.text().await.unwrap_or_default()
    );
    resp.json().await.unwrap()
}

/// Seeds an organization, connects the owner to a fake Notion and syncs once.
async fn synced_organization(app: &TestApp, slug: &str) -> (SeededOrganization, FakeProvider, String) {
    let provider = FakeProvider::spawn().await;
    let org = app.seed_organization(slug).await;
    let integration_id = app.create_integration(&org, &provider.base_url).await;
    app.connect(&org.owner, &integration_id).await;
    sync(app, &org.owner.access_token, &integration_id).await;
    (org, provider, integration_id)
}

#[tokio::test]
async fn sync_keeps_only_top_level_items() {
    let app = TestApp::spawn().await;
    let provider = FakeProvider::spawn().await;
    let acme = app.seed_organization("acme").await;
    let integration_id = app.create_integration(&acme, &provider.base_url).await;
    app.connect(&acme.owner, &integration_id).await;

    let report = sync(&app, &acme.owner.access_token, &integration_id).await;

    assert_eq!(report["pages"], 2);
    assert_eq!(report["fetched"], 5);
    assert_eq!(report["stored"], 3);
    assert_eq!(report["kind"], "document");
    assert_eq!(provider.search_hits(), 2);
}

#[tokio::test]
async fn members_without_groups_see_nothing() {
    let app = TestApp::spawn().await;
    let (acme, _, _) = synced_organization(&app, "acme").await;

    assert!(list_resources(&app, &acme, &acme.member.access_token).await.is_empty());
    // Owners get no implicit visibility either.
    assert!(list_resources(&app, &acme, &acme.owner.access_token).await.is_empty());
}

#[tokio::test]
async fn grants_make_synced_resources_visible() {
    let app = TestApp::spawn().await;
    let (acme, _, _) = synced_organization(&app, "acme").await;
    let group_id = app.create_group(&acme, "Engineering").await;
    app.add_group_member(&acme, &group_id, &acme.member).await;
    app.grant(&acme, &group_id, "page-1").await;
    app.grant(&acme, &group_id, "db-1").await;
    // Nested item never synced, so the grant has nothing to show.
    app.grant(&acme, &group_id, "page-2").await;

    let resources = list_resources(&app, &acme, &acme.member.access_token).await;

    assert_eq!(resource_ids(&resources), vec!["db-1", "page-1"]);
    assert_eq!(resources[0]["name"], "Tasks");
    assert_eq!(resources[1]["name"], "Roadmap");
    assert_eq!(resources[1]["url"], "https://notion.so/page-1");
}

#[tokio::test]
async fn untitled_items_get_a_placeholder_name() {
    let app = TestApp::spawn().await;
    let (acme, _, _) = synced_organization(&app, "acme").await;
    let group_id = app.create_group(&acme, "Everyone").await;
    app.add_group_member(&acme, &group_id, &acme.member).await;
    app.grant(&acme, &group_id, "page-3").await;

    let resources = list_resources(&app, &acme, &acme.member.access_token).await;

    assert_eq!(resources.len(), 1);
    assert_eq!(resources[0]["name"], "Untitled");
}

#[tokio::test]
async fn grant_made_before_sync_applies_after_sync() {
    let app = TestApp::spawn().await;
    let provider = FakeProvider::spawn().await;
    let acme = app.seed_organization("acme").await;
    let group_id = app.create_group(&acme, "Early").await;
    app.add_group_member(&acme, &group_id, &acme.member).await;
    app.grant(&acme, &group_id, "page-1").await;
    assert!(list_resources(&app, &acme, &acme.member.access_token).await.is_empty());

    let integration_id = app.create_integration(&acme, &provider.base_url).await;
    app.connect(&acme.owner, &integration_id).await;
    sync(&app, &acme.owner.access_token, &integration_id).await;

    let resources = list_resources(&app, &acme, &acme.member.access_token).await;
    assert_eq!(resource_ids(&resources), vec!["page-1"]);
}

#[tokio::test]
async fn resync_replaces_rows_but_keeps_grants() {
    let app = TestApp::spawn().await;
    let (acme, _, integration_id) = synced_organization(&app, "acme").await;
    let group_id = app.create_group(&acme, "Engineering").await;
    app.add_group_member(&acme, &group_id, &acme.member).await;
    app.grant(&acme, &group_id, "page-1").await;
    let before = list_resources(&app, &acme, &acme.member.access_token).await;

    sync(&app, &acme.owner.access_token, &integration_id).await;

    let after = list_resources(&app, &acme, &acme.member.access_token).await;
    assert_eq!(resource_ids(&after), vec!["page-1"]);
    assert_ne!(before[0]["id"], after[0]["id"]);
}

#[tokio::test]
async fn revoke_hides_resource() {
    let app = TestApp::spawn().await;
    let (acme, _, _) = synced_organization(&app, "acme").await;
    let group_id = app.create_group(&acme, "Engineering").await;
    app.add_group_member(&acme, &group_id, &acme.member).await;
    app.grant(&acme, &group_id, "page-1").await;
    let path = format!(
        "/api/organization/{}/group/{}/permission/page-1",
        acme.organization_id, group_id
    );

    let resp = app
        .auth_delete(&path, &acme.owner.access_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 204);
    assert!(list_resources(&app, &acme, &acme.member.access_token).await.is_empty());

    let resp = app
        .auth_delete(&path, &acme.owner.access_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 404);
}

#[tokio::test]
async fn members_cannot_manage_groups() {
    let app = TestApp::spawn().await;
    let acme = app.seed_organization("acme").await;

    let resp = app
        .auth_post(
            &format!("/api/organization/{}/group", acme.organization_id),
            &acme.member.access_token,
        )
        .json(&serde_json::json!({ "name": "Sneaky" }))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status().as_u16(), 403);
}

#[tokio::test]
async fn empty_group_name_is_rejected() {
    let app = TestApp::spawn().await;
    let acme = app.seed_organization("acme").await;

    let resp = app
        .auth_post(
            &format!("/api/organization/{}/group", acme.organization_id),
            &acme.owner.access_token,
        )
        .json(&serde_json::json!({ "name": "" }))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status().as_u16(), 422);
}
