use axum::{
    extract::{FromRef, FromRequestParts, OptionalFromRequestParts},
    http::{header, request::Parts},
};
use bson::oid::ObjectId;
use gatehouse_services::Session;

use crate::{error::ApiError, state::AppState};

/// The caller identified by a JWT from the `Authorization: Bearer` header or
/// the `access_token` cookie.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: ObjectId,
    pub email: String,
}

impl AuthUser {
    pub fn session(&self) -> Session {
        Session::new(self.user_id)
    }
}

fn token_from_parts(parts: &Parts) -> Option<String> {
    parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|s| s.trim().to_string())
        .or_else(|| {
            parts
                .headers
                .get(header::COOKIE)
                .and_then(|v| v.to_str().ok())
                .and_then(|cookies| {
                    cookies.split(';').find_map(|cookie| {
                        cookie
                            .trim()
                            .strip_prefix("access_token=")
                            .map(|s| s.to_string())
                    })
                })
        })
        .filter(|t| !t.is_empty())
}

fn resolve(state: &AppState, token: &str) -> Result<AuthUser, ApiError> {
    let claims = state.auth.verify_access_token(token)?;
    let user_id = ObjectId::parse_str(&claims.sub)
        .map_err(|_| ApiError::Unauthorized("Invalid user ID in token".to_string()))?;

    Ok(AuthUser {
        user_id,
        email: claims.email,
    })
}

impl<S> FromRequestParts<S> for AuthUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);
        let token = token_from_parts(parts)
            .ok_or_else(|| ApiError::Unauthorized("No token provided".to_string()))?;
        resolve(&app_state, &token)
    }
}

/// No token yields `None` so the access layer can report the missing
/// session itself; a bad token is still rejected.
impl<S> OptionalFromRequestParts<S> for AuthUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &S,
    ) -> Result<Option<Self>, Self::Rejection> {
        let app_state = AppState::from_ref(state);
        match token_from_parts(parts) {
            Some(token) => resolve(&app_state, &token).map(Some),
            None => Ok(None),
        }
    }
}
