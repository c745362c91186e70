use super::{item_service, path_key, read_item};
use crate::error::{ApiError, ErrorResponse, OkResponse};
use crate::state::AppState;
use axum::{
    Json,
    body::Bytes,
    extract::{
        Path, State,
        rejection::{BytesRejection, PathRejection},
    },
};

/// PUT /items/{id} handler - Replace an item
///
/// The id from the path always wins over any key field in the body.
#[utoipa::path(
    put,
    path = "/items/{id}",
    params(
        ("id" = String, Path, description = "Item id")
    ),
    request_body = serde_json::Value,
    responses(
        (status = 200, description = "Item stored", body = OkResponse),
        (status = 400, description = "Invalid JSON", body = ErrorResponse),
        (status = 404, description = "Invalid id or item service not configured", body = ErrorResponse),
        (status = 413, description = "Request body too large", body = ErrorResponse),
        (status = 500, description = "Storage backend failure", body = ErrorResponse)
    ),
    tag = "items"
)]
pub async fn put_handler(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<OkResponse>, ApiError> {
    let service = item_service(&state)?;
    let key = path_key(path)?;
    let mut item = read_item(body)?;
    item.extend(key);

    service.update(&state.request_context(), item).await?;

    Ok(OkResponse::json())
}

#[cfg(test)]
mod tests {
    use crate::handlers::test_support::{health_only, memory_app, send};
    use axum::http::StatusCode;
    use serde_json::json;

    #[tokio::test]
    async fn test_put_path_id_wins_over_body() {
        let (app, _) = memory_app();

        let (status, body) = send(
            app.clone(),
            "PUT",
            "/items/abc",
            Some(r#"{"id":"zzz","name":"x"}"#),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"ok": true}));

        let (status, body) = send(app.clone(), "GET", "/items/abc", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"id": "abc", "name": "x"}));

        let (status, _) = send(app, "GET", "/items/zzz", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_put_without_id_in_body() {
        let (app, _) = memory_app();

        let (status, _) = send(app.clone(), "PUT", "/items/k1", Some(r#"{"v":1}"#)).await;
        assert_eq!(status, StatusCode::OK);

        let (_, body) = send(app, "GET", "/items/k1", None).await;
        assert_eq!(body, json!({"id": "k1", "v": 1}));
    }

    #[tokio::test]
    async fn test_put_replaces_whole_item() {
        let (app, _) = memory_app();

        send(app.clone(), "PUT", "/items/k1", Some(r#"{"a":1,"b":2}"#)).await;
        send(app.clone(), "PUT", "/items/k1", Some(r#"{"a":3}"#)).await;

        let (_, body) = send(app, "GET", "/items/k1", None).await;
        assert_eq!(body, json!({"id": "k1", "a": 3}));
    }

    #[tokio::test]
    async fn test_put_invalid_json() {
        let (app, _) = memory_app();
        let (status, body) = send(app, "PUT", "/items/abc", Some("{broken")).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({"error": "invalid json"}));
    }

    #[tokio::test]
    async fn test_put_undecodable_id() {
        let (app, _) = memory_app();
        let (status, body) = send(app, "PUT", "/items/%FF", Some(r#"{"v":1}"#)).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({"error": "invalid item id"}));
    }

    #[tokio::test]
    async fn test_put_oversized_body() {
        let (app, _) = memory_app();
        let payload = format!(r#"{{"blob":"{}"}}"#, "x".repeat(3 * 1024 * 1024));
        let (status, body) = send(app, "PUT", "/items/big", Some(&payload)).await;

        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(body, json!({"error": "request body too large"}));
    }

    #[tokio::test]
    async fn test_put_not_configured() {
        let (status, body) = send(health_only(), "PUT", "/items/abc", Some("{}")).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({"error": "item service not configured"}));
    }
}
