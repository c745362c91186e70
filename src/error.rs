use crate::store::StoreError;
use axum::{
    Json,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

/// Error response type
#[derive(Serialize, Deserialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}

/// Response type for successful create/update
#[derive(Serialize, Deserialize, utoipa::ToSchema)]
pub struct OkResponse {
    pub ok: bool,
}

impl OkResponse {
    pub fn json() -> Json<Self> {
        Json(Self { ok: true })
    }
}

/// Every failure the HTTP layer can report.
///
/// This is the only place a store error kind becomes a status code.
#[derive(Debug)]
pub enum ApiError {
    /// Item routes were requested but no store backend is wired in
    NotConfigured,
    /// No route matches the path
    RouteNotFound,
    /// The path matches but the method is not served
    MethodNotAllowed,
    /// Request body is not a JSON object
    InvalidJson,
    /// Item id in the path is empty, undecodable or contains a path separator
    InvalidItemId,
    /// Request body exceeds the body size limit
    BodyTooLarge,
    /// Failure from the service / repository / store chain
    Store(StoreError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            ApiError::NotConfigured => (
                StatusCode::NOT_FOUND,
                "item service not configured".to_string(),
            ),
            ApiError::RouteNotFound => (StatusCode::NOT_FOUND, "route not found".to_string()),
            ApiError::MethodNotAllowed => (
                StatusCode::METHOD_NOT_ALLOWED,
                "method not allowed".to_string(),
            ),
            ApiError::InvalidJson => (StatusCode::BAD_REQUEST, "invalid json".to_string()),
            ApiError::InvalidItemId => (StatusCode::NOT_FOUND, "invalid item id".to_string()),
            ApiError::BodyTooLarge => (
                StatusCode::PAYLOAD_TOO_LARGE,
                "request body too large".to_string(),
            ),
            ApiError::Store(err @ StoreError::NotFound(_)) => {
                (StatusCode::NOT_FOUND, err.to_string())
            }
            ApiError::Store(err @ StoreError::InvalidArgument(_)) => {
                (StatusCode::BAD_REQUEST, err.to_string())
            }
            ApiError::Store(StoreError::Unavailable(source)) => {
                tracing::error!(error = ?source, "storage backend failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "storage backend failure".to_string(),
                )
            }
            ApiError::Store(StoreError::Cancelled) => {
                tracing::debug!("request cancelled before the store answered");
                (StatusCode::GATEWAY_TIMEOUT, "request cancelled".to_string())
            }
        };

        let body = Json(ErrorResponse {
            error: error_message,
        });

        (status, body).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        ApiError::Store(err)
    }
}

/// `204 No Content` that still advertises the JSON content type.
pub fn no_content() -> Response {
    (
        StatusCode::NO_CONTENT,
        [(header::CONTENT_TYPE, "application/json")],
    )
        .into_response()
}
