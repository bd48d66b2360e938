mod auth;
pub mod csv;
mod error;
mod manager;
mod member;

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::middleware;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};

use pantry_storage::PantryStorage;

#[derive(Clone)]
pub struct PantryState {
    pub storage: PantryStorage,
    pub manager_password: Arc<str>,
}

/// Public member routes plus the manager surface, which sits behind
/// manager credentials.
pub fn pantry_router(storage: PantryStorage, manager_password: &str) -> Router {
    let state = PantryState {
        storage,
        manager_password: Arc::from(manager_password),
    };

    let manager = manager::manager_routes()
        .layer(middleware::from_fn_with_state(state.clone(), auth::manager_auth));

    Router::new()
        .route("/health", get(health))
        .merge(member::member_routes())
        .merge(manager)
        .with_state(state)
}

async fn health(State(state): State<PantryState>) -> Response {
    match state.storage.health().await {
        Ok(()) => Json(serde_json::json!({ "status": "ok" })).into_response(),
        Err(err) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(serde_json::json!({ "error": "storage_error", "detail": err.to_string() })),
        )
            .into_response(),
    }
}
