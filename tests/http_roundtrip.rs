//! End-to-end HTTP dispatch tests against an in-process server.

use std::collections::HashMap;

use axum::extract::Query;
use axum::http::StatusCode;
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use apilink::{ApiLinkClient, ApiLinkError, Endpoint};

#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct Item {
    id: u64,
    name: String,
}

async fn items_handler(Query(params): Query<HashMap<String, String>>) -> Json<Value> {
    let id: u64 = params
        .get("id")
        .and_then(|v| v.parse().ok())
        .unwrap_or_default();
    Json(json!({"id": id, "name": "foo"}))
}

async fn echo_handler(Json(payload): Json<Value>) -> Json<Value> {
    Json(payload)
}

async fn spawn_server() -> String {
    let _ = env_logger::builder().is_test(true).try_init();
    let app = Router::new()
        .route("/items", get(items_handler))
        .route("/items", delete(|| async { Json(json!({"deleted": true})) }))
        .route("/echo", post(echo_handler))
        .route("/echo", put(echo_handler))
        .route("/empty", get(|| async { StatusCode::OK }))
        .route("/empty", post(|| async { StatusCode::NO_CONTENT }))
        .route("/notjson", get(|| async { "not json at all" }))
        .route(
            "/teapot",
            get(|| async { (StatusCode::IM_A_TEAPOT, Json(json!({"error": "teapot"}))) }),
        );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

#[tokio::test]
async fn test_get_decodes_record() {
    let base = spawn_server().await;
    let client = ApiLinkClient::new().unwrap();

    let item: Item = client
        .get(Endpoint::new(format!("{base}/items")).query("id", "42"))
        .await
        .unwrap();
    assert_eq!(
        item,
        Item {
            id: 42,
            name: "foo".to_string()
        }
    );
}

#[tokio::test]
async fn test_post_round_trips_payload() {
    let base = spawn_server().await;
    let client = ApiLinkClient::new().unwrap();

    let payload = json!({"name": "widget", "tags": ["a", "b"]});
    let echoed: Value = client.post(format!("{base}/echo"), &payload).await.unwrap();
    assert_eq!(echoed, payload);
}

#[tokio::test]
async fn test_put_round_trips_payload() {
    let base = spawn_server().await;
    let client = ApiLinkClient::new().unwrap();

    let payload = json!({"id": 7});
    let echoed: Value = client.put(format!("{base}/echo"), &payload).await.unwrap();
    assert_eq!(echoed, payload);
}

#[tokio::test]
async fn test_delete_decodes_response() {
    let base = spawn_server().await;
    let client = ApiLinkClient::new().unwrap();

    let resp: Value = client.delete(format!("{base}/items")).await.unwrap();
    assert_eq!(resp, json!({"deleted": true}));
}

#[tokio::test]
async fn test_empty_body_is_reported() {
    let base = spawn_server().await;
    let client = ApiLinkClient::new().unwrap();

    let err = client.get::<Value>(format!("{base}/empty")).await.unwrap_err();
    assert!(matches!(err, ApiLinkError::EmptyBody));
    assert_eq!(err.to_string(), "Response body is null");

    let err = client
        .post::<Value, _>(format!("{base}/empty"), &json!({"name": "x"}))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiLinkError::EmptyBody));
}

#[tokio::test]
async fn test_undecodable_body_is_reported() {
    let base = spawn_server().await;
    let client = ApiLinkClient::new().unwrap();

    let err = client.get::<Item>(format!("{base}/notjson")).await.unwrap_err();
    assert!(matches!(err, ApiLinkError::Decode(_)));
    assert!(err.to_string().starts_with("Failed to parse response:"));
}

#[tokio::test]
async fn test_error_status_with_body_still_decodes() {
    let base = spawn_server().await;
    let client = ApiLinkClient::new().unwrap();

    // The decoder does not gate on HTTP status; a body is decoded whatever
    // the status code.
    let resp: Value = client.get(format!("{base}/teapot")).await.unwrap();
    assert_eq!(resp, json!({"error": "teapot"}));
}

#[tokio::test]
async fn test_connection_refused_is_transport_failure() {
    let client = ApiLinkClient::new().unwrap();

    // Bind and drop a listener so the port is known-closed.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = client
        .get::<Value>(format!("http://{addr}/items"))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiLinkError::Transport(_)));
}

#[tokio::test]
async fn test_concurrent_dispatches_each_resolve_once() {
    let base = spawn_server().await;
    let client = ApiLinkClient::new().unwrap();

    let completions: Vec<_> = (0..50)
        .map(|i| {
            client.get::<Item>(
                Endpoint::new(format!("{base}/items")).query("id", i.to_string()),
            )
        })
        .collect();

    let results = futures_util::future::join_all(completions).await;
    assert_eq!(results.len(), 50);
    for (i, result) in results.into_iter().enumerate() {
        assert_eq!(result.unwrap().id, i as u64);
    }
}
