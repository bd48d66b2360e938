use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::Deserialize;
use time::OffsetDateTime;
use tracing::info;

use pantry_storage::{
    Decision, FlagParams, ItemQuery, ItemSort, ItemUpdateInput, NewItemInput, RequestQuery,
    RequestSort, SortDirection,
};

use crate::PantryState;
use crate::csv::csv_response;
use crate::error::{bad_request, storage_error};

pub(crate) fn manager_routes() -> Router<PantryState> {
    Router::new()
        .route("/manager/items", get(list_items).post(add_item))
        .route("/manager/items.csv", get(list_items_csv))
        .route("/manager/items/{id}", put(update_item))
        .route("/manager/requests", get(list_requests))
        .route("/manager/requests.csv", get(list_requests_csv))
        .route("/manager/requests/{id}", get(get_request))
        .route("/manager/requests/{id}/decision", post(decide_request))
        .route("/manager/reports", get(report))
        .route("/manager/reports/export/{kind}", get(export_report))
}

#[derive(Debug, Default, Deserialize)]
struct ItemParams {
    q: Option<String>,
    sort: Option<String>,
    dir: Option<String>,
    low: Option<String>,
    exp: Option<String>,
}

impl ItemParams {
    fn query(&self) -> ItemQuery {
        ItemQuery {
            q: self.q.clone(),
            sort: ItemSort::from_param(self.sort.as_deref()),
            dir: SortDirection::from_param(self.dir.as_deref(), SortDirection::Asc),
        }
    }

    fn flags(&self) -> FlagParams {
        FlagParams::from_params(self.low.as_deref(), self.exp.as_deref())
    }
}

async fn list_items(State(state): State<PantryState>, Query(params): Query<ItemParams>) -> Response {
    let today = OffsetDateTime::now_utc().date();
    match state
        .storage
        .list_items(&params.query(), params.flags(), today)
        .await
    {
        Ok(items) => Json(serde_json::json!({ "items": items })).into_response(),
        Err(err) => storage_error(err),
    }
}

async fn list_items_csv(
    State(state): State<PantryState>,
    Query(params): Query<ItemParams>,
) -> Response {
    let today = OffsetDateTime::now_utc().date();
    let items = match state
        .storage
        .list_items(&params.query(), params.flags(), today)
        .await
    {
        Ok(items) => items,
        Err(err) => return storage_error(err),
    };

    let mut rows = vec![header(&[
        "item_name",
        "unit",
        "qty_available",
        "expiry_date",
        "status",
        "flags",
    ])];
    rows.extend(items.into_iter().map(|item| {
        vec![
            item.item_name,
            item.unit,
            item.qty_available.to_string(),
            item.expiry_date.unwrap_or_default(),
            item.status.to_string(),
            item.flags.join(", "),
        ]
    }));
    csv_response("stock_view.csv", &rows)
}

#[derive(Debug, Deserialize)]
struct AddItemBody {
    item_name: String,
    unit: String,
    #[serde(default)]
    sku: Option<String>,
    #[serde(default)]
    expiry_date: Option<String>,
    #[serde(default)]
    image_url: Option<String>,
    #[serde(default)]
    initial_qty: f64,
}

async fn add_item(State(state): State<PantryState>, Json(body): Json<AddItemBody>) -> Response {
    let input = NewItemInput {
        item_name: body.item_name,
        unit: body.unit,
        sku: body.sku,
        expiry_date: body.expiry_date,
        image_url: body.image_url,
        initial_qty: body.initial_qty,
    };
    match state.storage.add_item(input).await {
        Ok(id) => {
            info!(item_id = id, "item added");
            (StatusCode::CREATED, Json(serde_json::json!({ "id": id }))).into_response()
        }
        Err(err) => storage_error(err),
    }
}

#[derive(Debug, Deserialize)]
struct UpdateItemBody {
    #[serde(default)]
    add_qty: f64,
    #[serde(default)]
    expiry_date: Option<String>,
    #[serde(default)]
    is_active: Option<bool>,
}

async fn update_item(
    State(state): State<PantryState>,
    Path(id): Path<i64>,
    Json(body): Json<UpdateItemBody>,
) -> Response {
    let input = ItemUpdateInput {
        add_qty: body.add_qty,
        expiry_date: body.expiry_date,
        is_active: body.is_active,
    };
    match state.storage.update_item(id, input).await {
        Ok(()) => Json(serde_json::json!({ "ok": true })).into_response(),
        Err(err) => storage_error(err),
    }
}

#[derive(Debug, Default, Deserialize)]
struct RequestParams {
    q: Option<String>,
    sort: Option<String>,
    dir: Option<String>,
}

impl RequestParams {
    fn query(&self) -> RequestQuery {
        RequestQuery {
            q: self.q.clone(),
            sort: RequestSort::from_param(self.sort.as_deref()),
            dir: SortDirection::from_param(self.dir.as_deref(), SortDirection::Desc),
        }
    }
}

async fn list_requests(
    State(state): State<PantryState>,
    Query(params): Query<RequestParams>,
) -> Response {
    match state.storage.list_requests(&params.query()).await {
        Ok(requests) => Json(serde_json::json!({ "requests": requests })).into_response(),
        Err(err) => storage_error(err),
    }
}

async fn list_requests_csv(
    State(state): State<PantryState>,
    Query(params): Query<RequestParams>,
) -> Response {
    let requests = match state.storage.list_requests(&params.query()).await {
        Ok(requests) => requests,
        Err(err) => return storage_error(err),
    };

    let mut rows = vec![header(&[
        "request_id",
        "status",
        "created_at",
        "member_name",
        "phone",
        "email",
        "note",
        "items",
    ])];
    rows.extend(requests.into_iter().map(|request| {
        let items = request
            .lines
            .iter()
            .map(|line| format!("{} ({}) x {}", line.item_name, line.unit, line.qty_requested))
            .collect::<Vec<_>>()
            .join("; ");
        let (name, phone, email) = request
            .member
            .map(|m| (m.name, m.phone, m.email))
            .unwrap_or_default();
        vec![
            request.id.to_string(),
            request.status,
            request.created_at,
            name,
            phone,
            email,
            request.note.unwrap_or_default(),
            items,
        ]
    }));
    csv_response("requests.csv", &rows)
}

async fn get_request(State(state): State<PantryState>, Path(id): Path<i64>) -> Response {
    match state.storage.get_request(id).await {
        Ok(request) => Json(request).into_response(),
        Err(err) => storage_error(err),
    }
}

#[derive(Debug, Deserialize)]
struct DecisionBody {
    decision: String,
}

async fn decide_request(
    State(state): State<PantryState>,
    Path(id): Path<i64>,
    Json(body): Json<DecisionBody>,
) -> Response {
    let Some(decision) = Decision::parse(&body.decision) else {
        return bad_request("invalid_decision", "decision must be APPROVE or REJECT");
    };
    match state.storage.decide_request(id, decision).await {
        Ok(status) => {
            info!(request_id = id, status = status.as_str(), "request decided");
            Json(serde_json::json!({ "id": id, "status": status.as_str() })).into_response()
        }
        Err(err) => storage_error(err),
    }
}

#[derive(Debug, Default, Deserialize)]
struct ReportParams {
    low: Option<String>,
    exp: Option<String>,
}

impl ReportParams {
    fn flags(&self) -> FlagParams {
        FlagParams::from_params(self.low.as_deref(), self.exp.as_deref())
    }
}

async fn report(State(state): State<PantryState>, Query(params): Query<ReportParams>) -> Response {
    match state
        .storage
        .report(params.flags(), OffsetDateTime::now_utc())
        .await
    {
        Ok(report) => Json(report).into_response(),
        Err(err) => storage_error(err),
    }
}

async fn export_report(
    State(state): State<PantryState>,
    Path(kind): Path<String>,
    Query(params): Query<ReportParams>,
) -> Response {
    if kind != "low_stock" && kind != "expiring" {
        return (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({ "error": "not_found", "detail": "unknown export type" })),
        )
            .into_response();
    }
    let report = match state
        .storage
        .report(params.flags(), OffsetDateTime::now_utc())
        .await
    {
        Ok(report) => report,
        Err(err) => return storage_error(err),
    };

    if kind == "low_stock" {
        let mut rows = vec![header(&["item_name", "unit", "qty_available"])];
        rows.extend(
            report
                .low_stock
                .into_iter()
                .map(|it| vec![it.item_name, it.unit, it.qty_available.to_string()]),
        );
        return csv_response("low_stock.csv", &rows);
    }

    let mut rows = vec![header(&["item_name", "unit", "qty_available", "expiry_date"])];
    rows.extend(report.expiring.into_iter().map(|it| {
        vec![
            it.item_name,
            it.unit,
            it.qty_available.to_string(),
            it.expiry_date.unwrap_or_default(),
        ]
    }));
    csv_response("expiring_soon.csv", &rows)
}

fn header(columns: &[&str]) -> Vec<String> {
    columns.iter().map(|c| c.to_string()).collect()
}
