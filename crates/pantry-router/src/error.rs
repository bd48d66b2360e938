use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tracing::error;

use pantry_storage::StorageError;

pub(crate) fn storage_error(err: StorageError) -> Response {
    let (status, kind) = match &err {
        StorageError::Db(_) => (StatusCode::INTERNAL_SERVER_ERROR, "storage_error"),
        StorageError::Invalid(_) => (StatusCode::BAD_REQUEST, "invalid_input"),
        StorageError::EmptyRequest => (StatusCode::BAD_REQUEST, "empty_request"),
        StorageError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
        StorageError::Conflict(_) => (StatusCode::CONFLICT, "conflict"),
        StorageError::AlreadyDecided(_) => (StatusCode::CONFLICT, "already_decided"),
        StorageError::InsufficientStock { .. } => (StatusCode::BAD_REQUEST, "insufficient_stock"),
    };
    if status == StatusCode::INTERNAL_SERVER_ERROR {
        error!(error = %err, "storage failure");
    }
    (
        status,
        Json(serde_json::json!({ "error": kind, "detail": err.to_string() })),
    )
        .into_response()
}

pub(crate) fn bad_request(kind: &str, detail: impl Into<String>) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(serde_json::json!({ "error": kind, "detail": detail.into() })),
    )
        .into_response()
}
