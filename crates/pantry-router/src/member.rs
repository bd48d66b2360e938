use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use tracing::info;

use pantry_storage::{MemberRequestInput, RequestLineInput};

use crate::PantryState;
use crate::error::storage_error;

pub(crate) fn member_routes() -> Router<PantryState> {
    Router::new()
        .route("/member/items", get(list_catalog))
        .route("/member/requests", post(submit_request))
}

async fn list_catalog(State(state): State<PantryState>) -> Response {
    match state.storage.list_catalog().await {
        Ok(items) => Json(serde_json::json!({ "items": items })).into_response(),
        Err(err) => storage_error(err),
    }
}

#[derive(Debug, Deserialize)]
struct RequestLineBody {
    item_id: i64,
    qty: f64,
}

#[derive(Debug, Deserialize)]
struct SubmitRequestBody {
    name: String,
    phone: String,
    email: String,
    #[serde(default)]
    note: Option<String>,
    #[serde(default)]
    items: Vec<RequestLineBody>,
}

async fn submit_request(
    State(state): State<PantryState>,
    Json(body): Json<SubmitRequestBody>,
) -> Response {
    let input = MemberRequestInput {
        name: body.name,
        phone: body.phone,
        email: body.email,
        note: body.note,
        lines: body
            .items
            .into_iter()
            .map(|line| RequestLineInput {
                item_id: line.item_id,
                qty: line.qty,
            })
            .collect(),
    };

    match state.storage.submit_request(input).await {
        Ok(request_id) => {
            info!(request_id, "member request submitted");
            (
                StatusCode::CREATED,
                Json(serde_json::json!({ "request_id": request_id, "status": "PENDING" })),
            )
                .into_response()
        }
        Err(err) => storage_error(err),
    }
}
