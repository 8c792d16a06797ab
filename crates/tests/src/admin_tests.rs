use gatehouse_services::store::{IdentityBackend, MemberStore};
use serde_json::Value;

use crate::fixtures::{seed::password_matches, test_app::TestApp};

#[tokio::test]
async fn delete_user_without_session_is_unauthenticated() {
    let app = TestApp::spawn().await;
    let acme = app.seed_organization("acme").await;

    let resp = app
        .post("/api/admin/delete-user")
        .json(&serde_json::json!({
            "userId": acme.member.id,
            "organizationId": acme.organization_id,
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status().as_u16(), 401);
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["error"], "unauthenticated");
    assert!(
        app.store
            .find_identity(acme.member.object_id())
            .await
            .unwrap()
            .is_some()
    );
}

#[tokio::test]
async fn invalid_token_is_rejected() {
    let app = TestApp::spawn().await;
    let acme = app.seed_organization("acme").await;

    let resp = app
        .auth_post("/api/admin/delete-user", "not-a-jwt")
        .json(&serde_json::json!({ "userId": acme.member.id }))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status().as_u16(), 401);
}

#[tokio::test]
async fn owner_deletes_member() {
    let app = TestApp::spawn().await;
    let acme = app.seed_organization("acme").await;

    let resp = app
        .auth_post("/api/admin/delete-user", &acme.owner.access_token)
        .json(&serde_json::json!({
            "userId": acme.member.id,
            "organizationId": acme.organization_id,
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status().as_u16(), 200);
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["success"], true);
    assert_eq!(json["action"], "delete_member");
    assert_eq!(json["user_id"], acme.member.id);

    assert!(
        app.store
            .find_identity(acme.member.object_id())
            .await
            .unwrap()
            .is_none()
    );
    assert!(
        app.store
            .find_memberships(acme.member.object_id())
            .await
            .unwrap()
            .is_empty()
    );
}

#[tokio::test]
async fn single_membership_is_used_as_implicit_scope() {
    let app = TestApp::spawn().await;
    let acme = app.seed_organization("acme").await;

    let resp = app
        .auth_post("/api/admin/delete-user", &acme.owner.access_token)
        .json(&serde_json::json!({ "userId": acme.member.id }))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status().as_u16(), 200);
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["organization_id"], acme.organization_id);
}

#[tokio::test]
async fn implicit_scope_is_ambiguous_with_two_memberships() {
    let app = TestApp::spawn().await;
    let acme = app.seed_organization("acme").await;
    app.create_organization("Second", &acme.owner).await;

    let resp = app
        .auth_post("/api/admin/delete-user", &acme.owner.access_token)
        .json(&serde_json::json!({ "userId": acme.member.id }))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status().as_u16(), 422);
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["error"], "invalid_input");
    assert_eq!(json["reason"], "organization_id");
}

#[tokio::test]
async fn member_cannot_delete_other_member() {
    let app = TestApp::spawn().await;
    let acme = app.seed_organization("acme").await;
    let other = app.create_user("other@acme.test").await;
    app.add_member(&acme.organization_id, &acme.owner, &other).await;

    let resp = app
        .auth_post("/api/admin/delete-user", &acme.member.access_token)
        .json(&serde_json::json!({
            "userId": other.id,
            "organizationId": acme.organization_id,
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status().as_u16(), 403);
    assert!(app.store.find_identity(other.object_id()).await.unwrap().is_some());
}

#[tokio::test]
async fn owner_cannot_delete_self() {
    let app = TestApp::spawn().await;
    let acme = app.seed_organization("acme").await;

    let resp = app
        .auth_post("/api/admin/delete-user", &acme.owner.access_token)
        .json(&serde_json::json!({
            "userId": acme.owner.id,
            "organizationId": acme.organization_id,
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status().as_u16(), 403);
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["reason"], "self-delete");
}

#[tokio::test]
async fn reset_password_enforces_minimum_length() {
    let app = TestApp::spawn().await;
    let acme = app.seed_organization("acme").await;

    let resp = app
        .auth_post("/api/admin/reset-password", &acme.owner.access_token)
        .json(&serde_json::json!({
            "userId": acme.member.id,
            "newPassword": "short",
            "organizationId": acme.organization_id,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 422);
    let user = app
        .store
        .find_identity(acme.member.object_id())
        .await
        .unwrap()
        .unwrap();
    assert!(user.password_hash.is_none());

    let resp = app
        .auth_post("/api/admin/reset-password", &acme.owner.access_token)
        .json(&serde_json::json!({
            "userId": acme.member.id,
            "newPassword": "a-much-longer-password",
            "organizationId": acme.organization_id,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);

    let user = app
        .store
        .find_identity(acme.member.object_id())
        .await
        .unwrap()
        .unwrap();
    let hash = user.password_hash.expect("password should be set");
    assert!(password_matches("a-much-longer-password", &hash));
    assert!(!password_matches("short", &hash));
}

#[tokio::test]
async fn member_routes_cover_delete_password_and_role() {
    let app = TestApp::spawn().await;
    let acme = app.seed_organization("acme").await;
    let base = format!(
        "/api/organization/{}/member/{}",
        acme.organization_id, acme.member.id
    );

    let resp = app
        .auth_put(&format!("{}/password", base), &acme.owner.access_token)
        .json(&serde_json::json!({ "newPassword": "correct-horse-battery" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);

    let resp = app
        .auth_put(&format!("{}/role", base), &acme.owner.access_token)
        .json(&serde_json::json!({ "role": "owner" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["action"], "change_role");

    // The promoted member can now administer the organization.
    let resp = app
        .auth_post(
            &format!("/api/organization/{}/group", acme.organization_id),
            &acme.member.access_token,
        )
        .json(&serde_json::json!({ "name": "Promoted" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 201);

    let resp = app
        .auth_delete(&base, &acme.owner.access_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    assert!(
        app.store
            .find_identity(acme.member.object_id())
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn owner_cannot_demote_self() {
    let app = TestApp::spawn().await;
    let acme = app.seed_organization("acme").await;

    let resp = app
        .auth_put(
            &format!(
                "/api/organization/{}/member/{}/role",
                acme.organization_id, acme.owner.id
            ),
            &acme.owner.access_token,
        )
        .json(&serde_json::json!({ "role": "member" }))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status().as_u16(), 403);
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["reason"], "self-demote");
}

#[tokio::test]
async fn malformed_user_id_is_bad_request() {
    let app = TestApp::spawn().await;
    let acme = app.seed_organization("acme").await;

    let resp = app
        .auth_post("/api/admin/delete-user", &acme.owner.access_token)
        .json(&serde_json::json!({ "userId": "not-an-id" }))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status().as_u16(), 400);
}
