#![allow(dead_code)]

use axum::Router;
use axum::body::Body;
use http::{Request, StatusCode};
use http_body_util::BodyExt;
use order_server::{Config, DbService, MessageBus, ServerState, build_app};
use serde_json::{Value, json};
use tower::ServiceExt;

pub async fn test_state() -> ServerState {
    let db = DbService::in_memory().await.expect("in-memory database");
    ServerState::new(Config::default(), db, MessageBus::new(), chrono_tz::Asia::Jakarta)
}

pub fn app(state: &ServerState) -> Router {
    build_app(state.clone())
}

/// Send one request and decode the JSON body
pub async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string())),
        None => builder.body(Body::empty()),
    }
    .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

/// Create a menu item and return its JSON
pub async fn create_menu(app: &Router, name: &str, price: i64) -> Value {
    let (status, body) = send(
        app,
        "POST",
        "/api/menus",
        Some(json!({ "name": name, "price": price })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    body["data"].clone()
}

/// Cart line JSON for a menu item
pub fn line(menu: &Value, quantity: u32) -> Value {
    json!({
        "menu_id": menu["id"],
        "name": menu["name"],
        "price": menu["price"],
        "quantity": quantity,
    })
}
