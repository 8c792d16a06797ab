//! OAuth 2.0 token-endpoint client and consent `state` signing.

use std::time::Duration;

use bson::{oid::ObjectId, DateTime};
use gatehouse_db::models::{Integration, TokenSet};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Deserializer};
use sha2::Sha256;
use thiserror::Error;
use tracing::debug;

type HmacSha256 = Hmac<Sha256>;

const MAX_PROVIDER_MESSAGE: usize = 200;

#[derive(Debug, Error)]
pub enum OAuthError {
    #[error("token endpoint timed out")]
    Timeout,
    #[error("token endpoint unreachable: {0}")]
    Transport(String),
    #[error("provider returned {status}: {message}")]
    Provider { status: u16, message: String },
    #[error("malformed token response: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for OAuthError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            OAuthError::Timeout
        } else if e.is_decode() {
            OAuthError::Decode(e.to_string())
        } else {
            OAuthError::Transport(e.to_string())
        }
    }
}

/// Successful token-endpoint response.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default, deserialize_with = "lenient_seconds")]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub scope: Option<String>,
}

impl TokenResponse {
    /// Builds the values to persist. A missing or blank `refresh_token`
    /// keeps `previous_refresh_token`; a missing `expires_in` leaves the
    /// expiry unset.
    pub fn into_token_set(self, now: DateTime, previous_refresh_token: Option<String>) -> TokenSet {
        let expires_at = self.expires_in.and_then(|secs| expiry_after(now, secs));
        let refresh_token = self
            .refresh_token
            .filter(|t| !t.trim().is_empty())
            .or(previous_refresh_token);

        TokenSet {
            access_token: self.access_token,
            refresh_token,
            expires_at,
            scope: self.scope,
        }
    }
}

/// Negative lifetimes expire at `now`. A lifetime past the representable
/// range is treated like a missing one.
fn expiry_after(now: DateTime, secs: i64) -> Option<DateTime> {
    secs.max(0)
        .checked_mul(1000)
        .and_then(|ms| now.timestamp_millis().checked_add(ms))
        .map(DateTime::from_millis)
}

#[derive(Debug, Deserialize)]
struct TokenErrorResponse {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

/// Some providers send `expires_in` as a numeric string.
fn lenient_seconds<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Seconds {
        Number(i64),
        Text(String),
    }

    Ok(match Option::<Seconds>::deserialize(deserializer)? {
        Some(Seconds::Number(n)) => Some(n),
        Some(Seconds::Text(s)) => s.trim().parse().ok(),
        None => None,
    })
}

/// Builds the shared outbound client; every call is bounded by `timeout_secs`.
pub fn http_client(timeout_secs: u64) -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
}

#[derive(Clone)]
pub struct OAuthClient {
    client: reqwest::Client,
}

impl OAuthClient {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    pub fn authorize_url(integration: &Integration, redirect_uri: &str, state: &str) -> String {
        let mut url = format!(
            "{}?client_id={}&redirect_uri={}&response_type=code&state={}",
            integration.authorize_url,
            urlencoding::encode(&integration.client_id),
            urlencoding::encode(redirect_uri),
            urlencoding::encode(state),
        );
        if !integration.scopes.is_empty() {
            url.push_str("&scope=");
            url.push_str(&urlencoding::encode(&integration.scopes.join(" ")));
            url.push_str("&access_type=offline&prompt=consent");
        }
        url
    }

    pub async fn refresh(
        &self,
        integration: &Integration,
        refresh_token: &str,
    ) -> Result<TokenResponse, OAuthError> {
        self.token_request(
            integration,
            &[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token),
                ("client_id", &integration.client_id),
                ("client_secret", &integration.client_secret),
            ],
        )
        .await
    }

    pub async fn exchange_code(
        &self,
        integration: &Integration,
        code: &str,
        redirect_uri: &str,
    ) -> Result<TokenResponse, OAuthError> {
        self.token_request(
            integration,
            &[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("redirect_uri", redirect_uri),
                ("client_id", &integration.client_id),
                ("client_secret", &integration.client_secret),
            ],
        )
        .await
    }

    async fn token_request(
        &self,
        integration: &Integration,
        form: &[(&str, &str)],
    ) -> Result<TokenResponse, OAuthError> {
        let resp = self
            .client
            .post(&integration.token_url)
            .header(reqwest::header::ACCEPT, "application/json")
            .form(form)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(OAuthError::Provider {
                status: status.as_u16(),
                message: provider_message(status, &body),
            });
        }

        let tokens = resp.json::<TokenResponse>().await?;
        if tokens.access_token.trim().is_empty() {
            return Err(OAuthError::Decode("empty access_token".to_string()));
        }

        debug!(
            provider = integration.provider.as_str(),
            rotated = tokens.refresh_token.is_some(),
            expires_in = ?tokens.expires_in,
            "Token endpoint responded"
        );
        Ok(tokens)
    }
}

fn provider_message(status: reqwest::StatusCode, body: &str) -> String {
    if let Ok(err) = serde_json::from_str::<TokenErrorResponse>(body) {
        return match err.error_description {
            Some(description) => format!("{}: {}", err.error, description),
            None => err.error,
        };
    }

    let body = body.trim();
    if body.is_empty() {
        status
            .canonical_reason()
            .unwrap_or("unknown error")
            .to_string()
    } else {
        body.chars().take(MAX_PROVIDER_MESSAGE).collect()
    }
}

/// Signs and verifies the `state` round-tripped through the consent screen.
///
/// Format: `<user>.<integration>.<nonce>.<hex hmac>`.
#[derive(Clone)]
pub struct StateSigner {
    mac: HmacSha256,
}

impl StateSigner {
    pub fn new(secret: &str) -> Result<Self, hmac::digest::InvalidLength> {
        Ok(Self {
            mac: HmacSha256::new_from_slice(secret.as_bytes())?,
        })
    }

    pub fn sign(&self, user_id: ObjectId, integration_id: ObjectId) -> String {
        let payload = format!(
            "{}.{}.{}",
            user_id.to_hex(),
            integration_id.to_hex(),
            nanoid::nanoid!(16)
        );
        let mut mac = self.mac.clone();
        mac.update(payload.as_bytes());
        format!("{}.{}", payload, hex::encode(mac.finalize().into_bytes()))
    }

    /// Returns `(user_id, integration_id)` when the signature checks out.
    pub fn verify(&self, state: &str) -> Option<(ObjectId, ObjectId)> {
        let (payload, signature) = state.rsplit_once('.')?;
        let signature = hex::decode(signature).ok()?;

        let mut mac = self.mac.clone();
        mac.update(payload.as_bytes());
        mac.verify_slice(&signature).ok()?;

        let mut parts = payload.splitn(3, '.');
        let user_id = ObjectId::parse_str(parts.next()?).ok()?;
        let integration_id = ObjectId::parse_str(parts.next()?).ok()?;
        Some((user_id, integration_id))
    }
}
