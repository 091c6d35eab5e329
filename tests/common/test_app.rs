use std::sync::Arc;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{HeaderMap, Method, Request, StatusCode, header};
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use sintropia::auth::{KEY_ID_HEADER, StaticTokenVerifier};
use sintropia::config::PaginationLimits;
use sintropia::server::{AppState, create_router};
use sintropia::store::{SqliteStore, Store};

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

/// The full router over a throwaway database, driven in-process.
pub struct TestApp {
    _temp_dir: TempDir,
    router: Router,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_limits(PaginationLimits::default())
    }

    pub fn with_limits(limits: PaginationLimits) -> Self {
        let temp_dir = TempDir::new().expect("create temp dir");
        let store = SqliteStore::new(temp_dir.path().join("sintropia.db")).expect("open store");
        store.initialize().expect("initialize schema");

        let state = Arc::new(AppState::new(
            Arc::new(store),
            Arc::new(StaticTokenVerifier::default()),
            limits,
        ));

        Self {
            _temp_dir: temp_dir,
            router: create_router(state),
        }
    }

    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read body");
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("JSON body")
        };

        TestResponse {
            status,
            headers,
            body,
        }
    }

    /// Sends a request, authenticated with `token` and a key id when given.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder
                .header(header::AUTHORIZATION, format!("Bearer {token}"))
                .header(KEY_ID_HEADER, "test-key");
        }

        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("build request");

        self.send(request).await
    }

    pub async fn get(&self, uri: &str) -> TestResponse {
        self.request(Method::GET, uri, None, None).await
    }

    pub async fn get_as(&self, uri: &str, token: &str) -> TestResponse {
        self.request(Method::GET, uri, Some(token), None).await
    }

    pub async fn post(&self, uri: &str, token: &str, body: Value) -> TestResponse {
        self.request(Method::POST, uri, Some(token), Some(body)).await
    }

    pub async fn put(&self, uri: &str, token: &str, body: Value) -> TestResponse {
        self.request(Method::PUT, uri, Some(token), Some(body)).await
    }

    pub async fn patch(&self, uri: &str, token: &str, body: Value) -> TestResponse {
        self.request(Method::PATCH, uri, Some(token), Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: &str) -> TestResponse {
        self.request(Method::DELETE, uri, Some(token), None).await
    }

    /// Creates a resource and returns its id, asserting a 201.
    pub async fn create(&self, uri: &str, body: Value) -> i64 {
        let resp = self.post(uri, "test-token", body).await;
        assert_eq!(
            resp.status,
            StatusCode::CREATED,
            "POST {uri} failed: {}",
            resp.body
        );
        resp.body["data"]["id"].as_i64().expect("created id")
    }
}
