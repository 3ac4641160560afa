//! Errores de la capa HTTP y su representación JSON.

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::warn;

use crate::error::SearchError;

/// Errores devueltos por los handlers HTTP
#[derive(Debug, Error)]
pub enum ApiError {
    /// Falta el texto de búsqueda (400)
    #[error("{0}")]
    Validation(String),

    /// Cuerpo ilegible (400)
    #[error("bad request: {0}")]
    BadRequest(String),

    /// El proveedor externo falló (500)
    #[error("search failed: {0}")]
    SearchFailed(String),

    /// Ventana de rate limit agotada (429)
    #[error("too many requests, retry in {retry_after}s")]
    RateLimited { retry_after: u64 },
}

impl From<SearchError> for ApiError {
    fn from(err: SearchError) -> Self {
        match err {
            SearchError::Validation(msg) => Self::Validation(msg),
            SearchError::SearchFailed(msg) => Self::SearchFailed(msg),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            Self::Validation(msg) | Self::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "error": msg }))).into_response()
            }
            Self::SearchFailed(details) => {
                warn!("search_failed: {}", details);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "search_failed", "details": details })),
                )
                    .into_response()
            }
            Self::RateLimited { retry_after } => {
                let mut response = (
                    StatusCode::TOO_MANY_REQUESTS,
                    Json(json!({
                        "error": "too_many_requests",
                        "details": "Too many requests, please try again later.",
                    })),
                )
                    .into_response();
                response
                    .headers_mut()
                    .insert(header::RETRY_AFTER, HeaderValue::from(retry_after));
                response
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_validation_is_bad_request() {
        let response = ApiError::from(SearchError::Validation("q required".into())).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await, json!({ "error": "q required" }));
    }

    #[tokio::test]
    async fn test_search_failed_carries_details() {
        let response = ApiError::from(SearchError::SearchFailed("timeout".into())).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body_json(response).await,
            json!({ "error": "search_failed", "details": "timeout" })
        );
    }

    #[tokio::test]
    async fn test_rate_limited_sets_retry_after() {
        let response = ApiError::RateLimited { retry_after: 12 }.into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers()[header::RETRY_AFTER], "12");
    }
}
