#![allow(dead_code)]

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::response::Response;
use axum::Router;
use dishhub::AppState;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;

pub struct TestApp {
    pub router: Router,
    pub db: SqlitePool,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_backup_key(None).await
    }

    pub async fn with_backup_key(backup_key: Option<&str>) -> Self {
        let db = memory_pool().await;

        sqlx::migrate!("./migrations")
            .run(&db)
            .await
            .expect("Failed to run migrations");

        let router = dishhub::build_app(AppState {
            db: Some(db.clone()),
            backup_key: backup_key.map(String::from),
        });

        Self { router, db }
    }

    /// Send a request through the app and return the response.
    pub async fn request(&self, req: Request<Body>) -> Response {
        send(&self.router, req).await
    }

    pub async fn get(&self, uri: &str) -> Response {
        let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
        self.request(req).await
    }

    pub async fn get_with_header(&self, uri: &str, name: &str, value: &str) -> Response {
        let req = Request::builder()
            .uri(uri)
            .header(name, value)
            .body(Body::empty())
            .unwrap();
        self.request(req).await
    }

    pub async fn send_json(&self, method: &str, uri: &str, body: &Value) -> Response {
        self.send_raw(method, uri, body.to_string()).await
    }

    pub async fn send_raw(&self, method: &str, uri: &str, body: String) -> Response {
        let req = Request::builder()
            .uri(uri)
            .method(method)
            .header("content-type", "application/json")
            .body(Body::from(body))
            .unwrap();
        self.request(req).await
    }

    pub async fn delete(&self, uri: &str) -> Response {
        let req = Request::builder()
            .uri(uri)
            .method("DELETE")
            .body(Body::empty())
            .unwrap();
        self.request(req).await
    }

    /// Create a dish through the API and return its id.
    pub async fn create_dish(&self, payload: Value) -> i64 {
        let resp = self.send_json("POST", "/api/dishes", &payload).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        body_json(resp).await["id"].as_i64().expect("id in create response")
    }

    pub async fn create_named_dish(&self, name: &str) -> i64 {
        self.create_dish(dish_payload(name)).await
    }

    pub async fn create_log(&self, dish_id: i64, notes: &str) -> i64 {
        let resp = self
            .send_json("POST", "/api/logs", &json!({ "dish_id": dish_id, "notes": notes }))
            .await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        body_json(resp).await["id"].as_i64().expect("id in create response")
    }
}

pub async fn memory_pool() -> SqlitePool {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")
        .unwrap()
        .create_if_missing(true)
        .foreign_keys(true);

    SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .expect("Failed to create in-memory SQLite pool")
}

pub async fn send(router: &Router, req: Request<Body>) -> Response {
    tower::ServiceExt::oneshot(router.clone(), req)
        .await
        .unwrap()
}

pub fn dish_payload(name: &str) -> Value {
    json!({
        "name": name,
        "ingredients": ["鸡蛋", "番茄"],
        "instructions": ["打蛋", "炒制"],
    })
}

/// Read the full response body as a String.
pub async fn body_string(resp: Response) -> String {
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub async fn body_json(resp: Response) -> Value {
    serde_json::from_str(&body_string(resp).await).expect("response body should be JSON")
}

/// Assert the response is an error with the given status and code; returns the error object.
pub async fn assert_error(resp: Response, status: StatusCode, code: &str) -> Value {
    assert_eq!(resp.status(), status);
    let body = body_json(resp).await;
    assert_eq!(body["error"]["code"], code, "unexpected body: {body}");
    assert!(body["error"]["message"].is_string());
    body["error"].clone()
}
