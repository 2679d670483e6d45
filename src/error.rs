/// HTTP-facing error type.
/// Maps validation, auth, conflict and store failures onto status codes with a
/// `{"error": ...}` body.
use crate::auth::AuthError;
use crate::db::StoreError;
use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Internal server error")]
    Internal(String),
}

impl ApiError {
    pub fn required(field: &str) -> Self {
        ApiError::Validation(format!("{} is required", field))
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if let ApiError::Internal(detail) = self {
            log::error!("Internal error: {}", detail);
        }
        HttpResponse::build(self.status_code()).json(json!({
            "error": self.to_string()
        }))
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Duplicate(entry) => {
                ApiError::Conflict(format!("{} is already registered", entry))
            }
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::MissingToken => ApiError::Unauthorized(err.to_string()),
            AuthError::InvalidToken(_) => ApiError::Forbidden(err.to_string()),
            AuthError::NotInitialized | AuthError::InvalidPassword => {
                ApiError::Unauthorized(err.to_string())
            }
            AuthError::PasswordTooShort => ApiError::Validation(err.to_string()),
            AuthError::Signing(_) | AuthError::Hash(_) | AuthError::TokenLifetime(_) => {
                ApiError::Internal(err.to_string())
            }
            AuthError::Store(e) => ApiError::from(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    #[test]
    fn test_status_codes() {
        assert_eq!(ApiError::required("value").status_code(), 400);
        assert_eq!(ApiError::Unauthorized("x".into()).status_code(), 401);
        assert_eq!(ApiError::Forbidden("x".into()).status_code(), 403);
        assert_eq!(ApiError::Conflict("x".into()).status_code(), 409);
        assert_eq!(ApiError::Internal("x".into()).status_code(), 500);
    }

    #[test]
    fn test_duplicate_maps_to_conflict() {
        let err: ApiError = StoreError::Duplicate("0xabc".to_string()).into();
        assert!(matches!(err, ApiError::Conflict(_)));
    }

    #[actix_web::test]
    async fn test_internal_error_hides_detail() {
        let err = ApiError::Internal("disk I/O error at page 42".to_string());
        let body = to_bytes(err.error_response().into_body())
            .await
            .expect("Failed to read body");
        let json: serde_json::Value = serde_json::from_slice(&body).expect("Invalid JSON");

        assert_eq!(json["error"], "Internal server error");
    }

    #[test]
    fn test_auth_errors_map_to_documented_codes() {
        assert_eq!(ApiError::from(AuthError::MissingToken).status_code(), 401);
        assert_eq!(
            ApiError::from(AuthError::InvalidToken("expired".into())).status_code(),
            403
        );
        assert_eq!(ApiError::from(AuthError::NotInitialized).status_code(), 401);
        assert_eq!(ApiError::from(AuthError::InvalidPassword).status_code(), 401);
        assert_eq!(ApiError::from(AuthError::PasswordTooShort).status_code(), 400);
    }
}
