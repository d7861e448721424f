// API error handling
// Two kinds of failure cross this boundary: client-facing strings
// (validation, auth) and internal failures that surface only a category
// message while the cause goes to the logs.

use axum::{
    extract::{FromRequest, Request},
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Unauthorized(&'static str),

    #[error("{0}")]
    NotFound(&'static str),

    #[error("Rate limit exceeded")]
    RateLimited { limit: u32, window_secs: u64 },

    #[error("{0}")]
    Internal(&'static str),
}

impl ApiError {
    /// Wrap an internal failure: the cause is logged here, the client only
    /// ever sees the category string.
    pub fn internal(public: &'static str, source: impl std::fmt::Display) -> Self {
        tracing::error!("{}: {}", public, source);
        ApiError::Internal(public)
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<crate::utils::validation::ValidationError> for ApiError {
    fn from(err: crate::utils::validation::ValidationError) -> Self {
        ApiError::Validation(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(json!({ "error": self.to_string() }));

        let mut response = (status, body).into_response();

        if let ApiError::RateLimited { limit, window_secs } = self {
            let headers = response.headers_mut();
            headers.insert("X-RateLimit-Limit", HeaderValue::from(limit));
            headers.insert("X-RateLimit-Window", HeaderValue::from(window_secs));
        }

        response
    }
}

/// JSON extractor whose rejection matches the API error shape instead of
/// axum's default plain-text responses.
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    Json<T>: FromRequest<S, Rejection = axum::extract::rejection::JsonRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(ApiJson(value)),
            Err(rejection) => {
                tracing::debug!("Body decode failed: {}", rejection);
                Err(ApiError::Validation("Unable to decode parameters".into()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_match_error_taxonomy() {
        assert_eq!(
            ApiError::Validation("bad".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::Unauthorized("Token invalid").status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::NotFound("Item not found").status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::RateLimited {
                limit: 100,
                window_secs: 60
            }
            .status_code(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            ApiError::Internal("Character creation failed").status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
