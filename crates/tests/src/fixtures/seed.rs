use bson::oid::ObjectId;
use gatehouse_services::store::IdentityBackend;
use serde_json::Value;

use super::test_app::TestApp;

/// An organization with one owner and one plain member.
pub struct SeededOrganization {
    pub organization_id: String,
    pub slug: String,
    pub owner: SeededUser,
    pub member: SeededUser,
}

pub struct SeededUser {
    pub id: String,
    pub email: String,
    pub access_token: String,
}

impl SeededUser {
    pub fn object_id(&self) -> ObjectId {
        ObjectId::parse_str(&self.id).unwrap()
    }
}

/// Checks `password` against an argon2 hash stored by the identity backend.
pub fn password_matches(password: &str, hash: &str) -> bool {
    use argon2::{Argon2, PasswordHash, PasswordVerifier};

    let parsed = PasswordHash::new(hash).unwrap();
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

impl TestApp {
    /// Create an identity in the identity backend and mint a session for it.
    pub async fn create_user(&self, email: &str) -> SeededUser {
        let user = self
            .store
            .create_identity(email.to_string(), email.to_string())
            .await
            .expect("Failed to create identity");
        let user_id = user.id.unwrap();
        let access_token = self
            .auth
            .issue_access_token(user_id, email)
            .expect("Failed to issue token");

        SeededUser {
            id: user_id.to_hex(),
            email: email.to_string(),
            access_token,
        }
    }

    pub async fn create_organization(&self, name: &str, owner: &SeededUser) -> Value {
        let resp = self
            .auth_post("/api/organization", &owner.access_token)
            .json(&serde_json::json!({ "name": name }))
            .send()
            .await
            .expect("Create organization failed");

        assert!(
            resp.status().is_success(),
            "Create organization failed: {}",
            resp.text().await.unwrap_or_default()
        );
        resp.json().await.unwrap()
    }

    pub async fn add_member(&self, organization_id: &str, owner: &SeededUser, user: &SeededUser) {
        let resp = self
            .auth_post(
                &format!("/api/organization/{}/member", organization_id),
                &owner.access_token,
            )
            .json(&serde_json::json!({ "userId": user.id }))
            .send()
            .await
            .expect("Add member failed");

        assert!(
            resp.status().is_success(),
            "Add member failed: {}",
            resp.text().await.unwrap_or_default()
        );
    }

    /// Seed an organization with `owner@{slug}.test` and `member@{slug}.test`.
    pub async fn seed_organization(&self, slug: &str) -> SeededOrganization {
        let owner = self.create_user(&format!("owner@{}.test", slug)).await;
        let member = self.create_user(&format!("member@{}.test", slug)).await;

        let org = self
            .create_organization(&format!("{} Corp", slug), &owner)
            .await;
        let organization_id = org["id"].as_str().unwrap().to_string();
        assert_eq!(org["role"], "owner");

        self.add_member(&organization_id, &owner, &member).await;

        SeededOrganization {
            organization_id,
            slug: org["slug"].as_str().unwrap().to_string(),
            owner,
            member,
        }
    }

    /// Create a group and return its id.
    pub async fn create_group(&self, org: &SeededOrganization, name: &str) -> String {
        let resp = self
            .auth_post(
                &format!("/api/organization/{}/group", org.organization_id),
                &org.owner.access_token,
            )
            .json(&serde_json::json!({ "name": name }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status().as_u16(), 201);

        let json: Value = resp.json().await.unwrap();
        json["id"].as_str().unwrap().to_string()
    }

    pub async fn add_group_member(&self, org: &SeededOrganization, group_id: &str, user: &SeededUser) {
        let resp = self
            .auth_post(
                &format!(
                    "/api/organization/{}/group/{}/member",
                    org.organization_id, group_id
                ),
                &org.owner.access_token,
            )
            .json(&serde_json::json!({ "userId": user.id }))
            .send()
            .await
            .unwrap();
        assert!(resp.status().is_success());
    }

    pub async fn grant(&self, org: &SeededOrganization, group_id: &str, resource_id: &str) {
        let resp = self
            .auth_post(
                &format!(
                    "/api/organization/{}/group/{}/permission",
                    org.organization_id, group_id
                ),
                &org.owner.access_token,
            )
            .json(&serde_json::json!({ "resourceId": resource_id }))
            .send()
            .await
            .unwrap();
        assert!(resp.status().is_success());
    }

    /// Register a Notion integration whose endpoints point at `provider_base`.
    pub async fn create_integration(&self, org: &SeededOrganization, provider_base: &str) -> String {
        let resp = self
            .auth_post(
                &format!("/api/organization/{}/integration", org.organization_id),
                &org.owner.access_token,
            )
            .json(&serde_json::json!({
                "name": "Team wiki",
                "provider": "notion",
                "client_id": "test-client",
                "client_secret": "test-secret",
                "authorize_url": format!("{}/authorize", provider_base),
                "token_url": format!("{}/token", provider_base),
                "api_base_url": provider_base,
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(
            resp.status().as_u16(),
            201,
            "Create integration failed: {}",
            resp.text().await.unwrap_or_default()
        );

        let json: Value = resp.json().await.unwrap();
        json["id"].as_str().unwrap().to_string()
    }

    /// Runs the consent round trip for `user` and returns the stored credential.
    pub async fn connect(&self, user: &SeededUser, integration_id: &str) -> Value {
        let redirect_uri = "http://localhost:5173/callback";
        let resp = self
            .auth_get(
                &format!(
                    "/api/integration/{}/authorize?redirect_uri={}",
                    integration_id, redirect_uri
                ),
                &user.access_token,
            )
            .send()
            .await
            .unwrap();
        assert!(resp.status().is_success());
        let json: Value = resp.json().await.unwrap();
        let url = reqwest::Url::parse(json["url"].as_str().unwrap()).unwrap();
        let state = url
            .query_pairs()
            .find(|(k, _)| k == "state")
            .map(|(_, v)| v.into_owned())
            .expect("state missing from consent url");

        let resp = self
            .auth_post("/api/integration/callback", &user.access_token)
            .json(&serde_json::json!({
                "state": state,
                "code": "consent-code",
                "redirect_uri": redirect_uri,
            }))
            .send()
            .await
            .unwrap();
        assert!(
            resp.status().is_success(),
            "Callback failed: {}",
            resp.text().await.unwrap_or_default()
        );
        resp.json().await.unwrap()
    }
}
