use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use jyotish_progress::models::Lesson;
use jyotish_progress::routes::{self, AppState};
use jyotish_progress::store::{seed_if_empty, MemoryStore, ProgressStore};

/// Router over a fresh in-memory store carrying the seed curriculum.
pub async fn seeded_app() -> (Router, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    seed_if_empty(store.as_ref()).await.unwrap();
    (routes::router(AppState::new(store.clone())), store)
}

/// Router over a store holding exactly `lessons`.
pub async fn app_with(lessons: Vec<Lesson>) -> (Router, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    store.insert_lessons(&lessons).await.unwrap();
    (routes::router(AppState::new(store.clone())), store)
}

pub async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> Response<Body> {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    app.clone().oneshot(request).await.unwrap()
}

pub async fn get(app: &Router, uri: &str) -> Response<Body> {
    send(app, Method::GET, uri, None).await
}

pub async fn post(app: &Router, uri: &str, body: Option<Value>) -> Response<Body> {
    send(app, Method::POST, uri, body).await
}

pub async fn put(app: &Router, uri: &str, body: Value) -> Response<Body> {
    send(app, Method::PUT, uri, Some(body)).await
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
