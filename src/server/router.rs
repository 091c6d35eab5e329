use std::sync::Arc;
use std::time::Instant;

use axum::Router;
use axum::extract::Request;
use axum::http::{HeaderName, Method, header};
use axum::middleware::{self, Next};
use axum::response::Response;
use tower_http::cors::{Any, CorsLayer};

use super::catalog::catalog_router;
use super::garden::garden_router;
use super::meta::meta_router;
use super::planting::planting_router;
use crate::auth::{CredentialVerifier, KEY_ID_HEADER};
use crate::config::PaginationLimits;
use crate::store::Store;

pub struct AppState {
    pub store: Arc<dyn Store>,
    pub verifier: Arc<dyn CredentialVerifier>,
    pub limits: PaginationLimits,
}

impl AppState {
    pub fn new(
        store: Arc<dyn Store>,
        verifier: Arc<dyn CredentialVerifier>,
        limits: PaginationLimits,
    ) -> Self {
        Self {
            store,
            verifier,
            limits,
        }
    }
}

async fn log_request(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = Instant::now();

    let response = next.run(request).await;

    let latency = start.elapsed();
    let status = response.status();

    tracing::info!(
        "{} {} {} {}ms",
        method,
        uri.path(),
        status.as_u16(),
        latency.as_millis()
    );

    response
}

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            header::ACCEPT,
            HeaderName::from_static(KEY_ID_HEADER),
        ])
}

pub fn create_router(state: Arc<AppState>) -> Router {
    let api = Router::new()
        .merge(meta_router())
        .merge(catalog_router())
        .merge(garden_router())
        .merge(planting_router());

    Router::new()
        .nest("/api/v1", api)
        .layer(middleware::from_fn(log_request))
        .layer(cors_layer())
        .with_state(state)
}
