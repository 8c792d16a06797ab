use bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};

/// OAuth token material for one (user, integration) pair.
///
/// `version` is bumped on every write; refreshes only land when the version
/// they read is still current.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Credential {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub user_id: ObjectId,
    pub integration_id: ObjectId,
    pub access_token: String,
    pub refresh_token: Option<String>,
    /// `None` means the provider gave no lifetime; treated as non-expiring.
    pub expires_at: Option<DateTime>,
    pub scope: Option<String>,
    #[serde(default)]
    pub version: i64,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

impl Credential {
    pub const COLLECTION: &'static str = "credentials";

    pub fn usable_refresh_token(&self) -> Option<&str> {
        self.refresh_token
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }

    /// True when the token expires at or before `now + skew_secs`.
    /// The horizon saturates, so an oversized skew counts every expiry.
    pub fn expires_within(&self, now: DateTime, skew_secs: i64) -> bool {
        match self.expires_at {
            Some(at) => {
                let horizon = now
                    .timestamp_millis()
                    .saturating_add(skew_secs.saturating_mul(1000));
                at.timestamp_millis() <= horizon
            }
            None => false,
        }
    }
}

/// Token values to persist for a credential.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenSet {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_at: Option<DateTime>,
    pub scope: Option<String>,
}
