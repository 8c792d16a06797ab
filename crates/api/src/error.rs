use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use gatehouse_services::AccessError;
use gatehouse_services::auth::AuthError;
use gatehouse_services::dao::base::DaoError;
use serde::Serialize;
use tracing::error;

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Unauthorized(String),
    NotFound(String),
    Validation(String),
    /// 409 with the given error kind.
    Conflict(&'static str, String),
    /// 502 with the given error kind.
    Upstream(&'static str, String),
    Internal(String),
    /// Access-layer refusal that carries a structured reason.
    Refused {
        status: StatusCode,
        kind: &'static str,
        reason: &'static str,
        message: String,
    },
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<&'static str>,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type, reason, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", None, msg),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "unauthenticated", None, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", None, msg),
            ApiError::Validation(msg) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "invalid_input", None, msg)
            }
            ApiError::Conflict(kind, msg) => (StatusCode::CONFLICT, kind, None, msg),
            ApiError::Upstream(kind, msg) => (StatusCode::BAD_GATEWAY, kind, None, msg),
            ApiError::Internal(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "storage_error", None, msg)
            }
            ApiError::Refused {
                status,
                kind,
                reason,
                message,
            } => (status, kind, Some(reason), message),
        };

        let body = ErrorResponse {
            error: error_type.to_string(),
            reason,
            message,
        };

        (status, Json(body)).into_response()
    }
}

impl From<AccessError> for ApiError {
    fn from(err: AccessError) -> Self {
        let message = err.to_string();
        match err {
            AccessError::Unauthenticated => ApiError::Unauthorized(message),
            AccessError::Forbidden(_) => refused(StatusCode::FORBIDDEN, &err, message),
            AccessError::NotFound(_) => refused(StatusCode::NOT_FOUND, &err, message),
            AccessError::InvalidInput(_) => {
                refused(StatusCode::UNPROCESSABLE_ENTITY, &err, message)
            }
            AccessError::NoRefreshToken => ApiError::Conflict(err.kind(), message),
            AccessError::RefreshFailed(_) | AccessError::SyncFailed(_) => {
                ApiError::Upstream(err.kind(), message)
            }
            AccessError::Storage(e) => e.into(),
        }
    }
}

fn refused(status: StatusCode, err: &AccessError, message: String) -> ApiError {
    ApiError::Refused {
        status,
        kind: err.kind(),
        reason: err.reason().unwrap_or_default(),
        message,
    }
}

impl From<DaoError> for ApiError {
    fn from(err: DaoError) -> Self {
        match err {
            DaoError::NotFound => ApiError::NotFound("Resource not found".to_string()),
            DaoError::DuplicateKey(msg) => ApiError::Conflict("conflict", msg),
            DaoError::Conflict => ApiError::Conflict("conflict", err.to_string()),
            other => {
                error!(error = %other, "Storage failure");
                ApiError::Internal("Storage error".to_string())
            }
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::TokenExpired => ApiError::Unauthorized("Token expired".to_string()),
            AuthError::InvalidToken(msg) => ApiError::Unauthorized(msg),
            AuthError::HashError(msg) => {
                error!(error = %msg, "Password hashing failed");
                ApiError::Internal("Password hash error".to_string())
            }
        }
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(err: validator::ValidationErrors) -> Self {
        ApiError::Validation(err.to_string())
    }
}
