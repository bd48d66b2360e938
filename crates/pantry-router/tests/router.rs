use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use pantry_router::pantry_router;
use pantry_storage::PantryStorage;
use serde_json::{Value, json};
use tower::ServiceExt;

const PASSWORD: &str = "s3cret";

async fn app() -> Router {
    let dir = std::env::temp_dir().join(format!("pantry-router-{}", uuid::Uuid::new_v4()));
    std::fs::create_dir_all(&dir).unwrap();
    let dsn = format!("sqlite://{}?mode=rwc", dir.join("church_pantry.db").display());
    let storage = PantryStorage::connect(&dsn).await.unwrap();
    storage.sync().await.unwrap();
    pantry_router(storage, PASSWORD)
}

fn manager(method: &str, uri: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("x-manager-key", PASSWORD);
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

fn public(method: &str, uri: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder().method(method).uri(uri);
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Vec<u8>) {
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, bytes.to_vec())
}

async fn send_json(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let (status, bytes) = send(app, req).await;
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

#[tokio::test]
async fn health_is_public() {
    let app = app().await;
    let (status, body) = send_json(&app, public("GET", "/health", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn manager_routes_require_credentials() {
    let app = app().await;

    let (status, _) = send(&app, public("GET", "/manager/items", None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let wrong = Request::builder()
        .uri("/manager/items")
        .header(header::AUTHORIZATION, "Bearer nope")
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&app, wrong).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let basic = Request::builder()
        .uri("/manager/items")
        .header(
            header::AUTHORIZATION,
            format!("Basic {}", STANDARD.encode(format!("manager:{PASSWORD}"))),
        )
        .body(Body::empty())
        .unwrap();
    let (status, body) = send_json(&app, basic).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["items"], json!([]));
}

#[tokio::test]
async fn request_lifecycle() {
    let app = app().await;

    let (status, body) = send_json(
        &app,
        manager(
            "POST",
            "/manager/items",
            Some(json!({ "item_name": "Rice", "unit": "bag", "initial_qty": 10 })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let rice = body["id"].as_i64().unwrap();

    let (status, body) = send_json(&app, public("GET", "/member/items", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["items"][0]["item_name"], "Rice");

    let (status, body) = send_json(
        &app,
        public(
            "POST",
            "/member/requests",
            Some(json!({
                "name": "Ama Mensah",
                "phone": "555-0100",
                "email": "ama@example.com",
                "items": [{ "item_id": rice, "qty": 4 }],
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let request_id = body["request_id"].as_i64().unwrap();

    let decision = format!("/manager/requests/{request_id}/decision");
    let (status, body) = send_json(
        &app,
        manager("POST", &decision, Some(json!({ "decision": "APPROVE" }))),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "APPROVED");

    let (status, body) = send_json(
        &app,
        manager("POST", &decision, Some(json!({ "decision": "REJECT" }))),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "already_decided");

    let (status, body) = send_json(
        &app,
        manager("GET", &format!("/manager/requests/{request_id}"), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["lines"][0]["qty_available"], 6.0);

    let (status, body) = send_json(&app, manager("GET", "/manager/reports", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_requests"], 1);
    assert_eq!(body["movement_totals"]["OUT"], 4.0);
}

#[tokio::test]
async fn bad_member_requests_are_rejected() {
    let app = app().await;

    let (status, body) = send_json(
        &app,
        public(
            "POST",
            "/member/requests",
            Some(json!({ "name": "A", "phone": "1", "email": "a@b.c", "items": [] })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "empty_request");

    let (status, body) = send_json(
        &app,
        manager(
            "POST",
            "/manager/requests/1/decision",
            Some(json!({ "decision": "MAYBE" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_decision");

    let (status, _) = send(
        &app,
        manager(
            "POST",
            "/manager/requests/99/decision",
            Some(json!({ "decision": "APPROVE" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn csv_exports() {
    let app = app().await;
    let (status, _) = send(
        &app,
        manager(
            "POST",
            "/manager/items",
            Some(json!({ "item_name": "Beans, canned", "unit": "can", "initial_qty": 2 })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let resp = app
        .clone()
        .oneshot(manager("GET", "/manager/reports/export/low_stock", None))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(
        resp.headers()[header::CONTENT_TYPE]
            .to_str()
            .unwrap()
            .starts_with("text/csv")
    );
    assert_eq!(
        resp.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=low_stock.csv"
    );
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert_eq!(text, "item_name,unit,qty_available\r\n\"Beans, canned\",can,2\r\n");

    let (status, bytes) = send(&app, manager("GET", "/manager/items.csv", None)).await;
    assert_eq!(status, StatusCode::OK);
    let text = String::from_utf8(bytes).unwrap();
    assert!(text.starts_with("item_name,unit,qty_available,expiry_date,status,flags\r\n"));
    assert!(text.contains("Active,Low stock"));

    let (status, _) = send(&app, manager("GET", "/manager/reports/export/everything", None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn out_of_range_expiry_window_does_not_crash_reports() {
    let app = app().await;
    let (status, _) = send(
        &app,
        manager(
            "POST",
            "/manager/items",
            Some(json!({
                "item_name": "Pasta",
                "unit": "box",
                "initial_qty": 3,
                "expiry_date": "2031-01-15",
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send_json(
        &app,
        manager("GET", "/manager/reports?exp=9223372036854775807", None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["exp_days"], i64::MAX);
    assert_eq!(body["expiring"][0]["item_name"], "Pasta");

    let (status, _) = send(
        &app,
        manager("GET", "/manager/reports?exp=-9223372036854775808", None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let resp = app
        .clone()
        .oneshot(manager(
            "GET",
            "/manager/reports/export/expiring?exp=9223372036854775807",
            None,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=expiring_soon.csv"
    );
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert_eq!(
        text,
        "item_name,unit,qty_available,expiry_date\r\nPasta,box,3,2031-01-15\r\n"
    );
}
