use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use delivery_tracker::api::rest::router;
use delivery_tracker::engine::remote::FixtureOrders;
use delivery_tracker::models::connectivity::ConnectivityEvent;
use delivery_tracker::state::AppState;
use delivery_tracker::storage::file::FileKeyValueStore;
use delivery_tracker::storage::memory::MemoryKeyValueStore;
use delivery_tracker::storage::KeyValueStore;
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tower::ServiceExt;

async fn setup_with(
    backend: Arc<dyn KeyValueStore>,
) -> (axum::Router, Arc<AppState>, mpsc::Receiver<ConnectivityEvent>) {
    let (state, rx) = AppState::new(
        backend,
        Arc::new(FixtureOrders::new()),
        Duration::from_millis(10),
        16,
    );
    let shared = Arc::new(state);
    shared.repository.initialize().await;
    (router(shared.clone()), shared, rx)
}

async fn setup() -> (axum::Router, Arc<AppState>, mpsc::Receiver<ConnectivityEvent>) {
    setup_with(Arc::new(MemoryKeyValueStore::new())).await
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

fn get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn post_empty(uri: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_string(response: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn riya_request() -> Value {
    json!({
        "sender": "Me",
        "recipient": "Riya Sharma",
        "address": "55 Lakeview Road",
        "contact": "98...",
        "notes": ""
    })
}

#[tokio::test]
async fn health_returns_ok() {
    let (app, _state, _rx) = setup().await;
    let response = app.oneshot(get_request("/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["orders"], 4);
    assert_eq!(body["localOrders"], 0);
    assert_eq!(body["isOffline"], false);
}

#[tokio::test]
async fn metrics_returns_prometheus_format() {
    let (app, _state, _rx) = setup().await;
    let response = app.oneshot(get_request("/metrics")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let content_type = response
        .headers()
        .get("content-type")
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(content_type.contains("text/plain"));

    let body = body_string(response).await;
    assert!(body.contains("orders_published"));
}

#[tokio::test]
async fn list_orders_puts_in_transit_first() {
    let (app, _state, _rx) = setup().await;
    let response = app.oneshot(get_request("/orders")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    let orders = body["orders"].as_array().unwrap();
    assert_eq!(orders.len(), 4);
    assert_eq!(orders[0]["id"], "A10296");
    assert_eq!(orders[0]["status"], "In Transit");
    assert_eq!(orders[1]["id"], "A10293");
    assert_eq!(body["refreshing"], false);
    assert!(body["offlineBanner"].is_null());

    let sections = body["sections"].as_array().unwrap();
    assert_eq!(sections.len(), 1);
    assert_eq!(sections[0]["title"], "ALL ORDERS");
}

#[tokio::test]
async fn create_request_is_listed_first() {
    let (app, _state, _rx) = setup().await;
    let response = app
        .clone()
        .oneshot(json_request("POST", "/orders", riya_request()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    let id = body["order"]["id"].as_str().unwrap().to_string();
    assert!(id.starts_with("L-"));
    assert_eq!(body["order"]["status"], "Pending");
    assert_eq!(body["order"]["isLocal"], true);
    assert_eq!(body["savedLocally"], false);
    assert!(body.get("message").is_none());

    let response = app.oneshot(get_request("/orders")).await.unwrap();
    let body = body_json(response).await;
    let orders = body["orders"].as_array().unwrap();
    assert_eq!(orders.len(), 5);
    assert_eq!(orders[0]["id"], id);
    assert_eq!(body["pendingLocalCount"], 1);
    assert_eq!(body["sections"][0]["title"], "PENDING (LOCAL)");
}

#[tokio::test]
async fn create_request_with_blank_fields_returns_400() {
    let (app, state, _rx) = setup().await;
    let response = app
        .oneshot(json_request(
            "POST",
            "/orders",
            json!({
                "recipient": "  ",
                "address": "55 Lakeview Road",
                "contact": ""
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_json(response).await;
    let fields: Vec<&str> = body["fields"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["field"].as_str().unwrap())
        .collect();
    assert_eq!(fields, vec!["recipient", "contact"]);
    assert_eq!(state.repository.snapshot().orders.len(), 4);
}

#[tokio::test]
async fn get_order_returns_progress_and_route() {
    let (app, _state, _rx) = setup().await;

    let response = app
        .clone()
        .oneshot(get_request("/orders/A10293"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["order"]["recipient"], "Riya Sharma");
    assert_eq!(body["progressPercent"], 66);
    assert_eq!(body["route"], "Tracking");
    assert_eq!(body["order"]["lastKnownLocation"]["latitude"], 27.7172);

    let response = app.oneshot(get_request("/orders/A10294")).await.unwrap();
    let body = body_json(response).await;
    assert_eq!(body["progressPercent"], 100);
    assert_eq!(body["route"], "Details");
}

#[tokio::test]
async fn get_nonexistent_order_returns_404() {
    let (app, _state, _rx) = setup().await;
    let response = app
        .oneshot(get_request("/orders/L-missing-1"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn tracking_frame_for_in_transit_order() {
    let (app, _state, _rx) = setup().await;
    let response = app
        .oneshot(get_request("/orders/A10296/tracking?tick=0"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["orderId"], "A10296");
    assert_eq!(body["eta"], "15 mins");
    assert_eq!(body["position"]["latitude"], 27.7172);
    assert!(body["remainingKm"].as_f64().unwrap() > 0.0);
}

#[tokio::test]
async fn tracking_delivered_order_returns_409() {
    let (app, _state, _rx) = setup().await;
    let response = app
        .oneshot(get_request("/orders/A10294/tracking"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn refresh_keeps_local_orders() {
    let (app, _state, _rx) = setup().await;
    let created = body_json(
        app.clone()
            .oneshot(json_request("POST", "/orders", riya_request()))
            .await
            .unwrap(),
    )
    .await;

    let response = app.oneshot(post_empty("/orders/refresh")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    let orders = body["orders"].as_array().unwrap();
    assert_eq!(orders.len(), 5);
    assert_eq!(orders[0]["id"], created["order"]["id"]);
    assert_eq!(body["refreshing"], false);
}

#[tokio::test]
async fn offline_flow_reports_saved_locally() {
    let (app, state, rx) = setup().await;
    let listener = state.connectivity.clone().listen(rx);

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/connectivity",
            json!({ "isConnected": true, "isInternetReachable": false }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED);

    tokio::time::sleep(Duration::from_millis(100)).await;

    let body = body_json(
        app.clone()
            .oneshot(get_request("/connectivity"))
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(body["isOffline"], true);

    let body = body_json(
        app.clone()
            .oneshot(json_request("POST", "/orders", riya_request()))
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(body["savedLocally"], true);
    assert_eq!(
        body["message"],
        "Your request has been saved and will sync when online."
    );

    let body = body_json(app.clone().oneshot(get_request("/orders")).await.unwrap()).await;
    assert_eq!(body["isOffline"], true);
    assert_eq!(
        body["offlineBanner"]["subtitle"],
        "1 pending request - will sync when online"
    );

    app.clone()
        .oneshot(json_request(
            "POST",
            "/connectivity",
            json!({ "isConnected": true }),
        ))
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;

    let body = body_json(app.oneshot(get_request("/orders")).await.unwrap()).await;
    assert_eq!(body["isOffline"], false);
    assert!(body["offlineBanner"].is_null());

    listener.shutdown().await;
}

#[tokio::test]
async fn connectivity_event_is_applied_by_the_listener() {
    let (app, state, rx) = setup().await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/connectivity",
            json!({ "isConnected": false }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED);

    let body = body_json(
        app.clone()
            .oneshot(get_request("/connectivity"))
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(body["isOffline"], false);

    let listener = state.connectivity.clone().listen(rx);
    tokio::time::sleep(Duration::from_millis(100)).await;

    let body = body_json(app.oneshot(get_request("/connectivity")).await.unwrap()).await;
    assert_eq!(body["isOffline"], true);

    listener.shutdown().await;
}

#[tokio::test]
async fn local_orders_persist_across_restarts_on_disk() {
    let dir = tempfile::tempdir().unwrap();

    let created_id = {
        let (app, _state, _rx) =
            setup_with(Arc::new(FileKeyValueStore::new(dir.path()))).await;
        let body = body_json(
            app.oneshot(json_request("POST", "/orders", riya_request()))
                .await
                .unwrap(),
        )
        .await;
        body["order"]["id"].as_str().unwrap().to_string()
    };

    let stored = std::fs::read_to_string(dir.path().join("local_orders.json")).unwrap();
    let stored: Value = serde_json::from_str(&stored).unwrap();
    assert_eq!(stored.as_array().unwrap().len(), 1);
    assert_eq!(stored[0]["id"], created_id);
    assert_eq!(stored[0]["isLocal"], true);

    let (app, _state, _rx) = setup_with(Arc::new(FileKeyValueStore::new(dir.path()))).await;
    let body = body_json(app.oneshot(get_request("/orders")).await.unwrap()).await;
    let orders = body["orders"].as_array().unwrap();
    assert_eq!(orders.len(), 5);
    assert_eq!(orders[0]["id"], created_id);
}

#[tokio::test]
async fn corrupt_file_falls_back_to_remote_orders() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("local_orders.json"), "not json at all").unwrap();

    let (app, _state, _rx) = setup_with(Arc::new(FileKeyValueStore::new(dir.path()))).await;
    let body = body_json(app.oneshot(get_request("/orders")).await.unwrap()).await;

    assert_eq!(body["orders"].as_array().unwrap().len(), 4);
    assert_eq!(body["pendingLocalCount"], 0);
}
