use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use chrono::Utc;

use crate::auth::{OptionalAuth, RequireAuth};
use crate::server::AppState;
use crate::server::dto::{
    CreatePlantationRequest, ListPlantationsParams, PageWindow, UpdatePlantationRequest,
    non_empty,
};
use crate::server::response::{
    ApiError, ApiJson, ApiPath, ApiQuery, ApiResponse, PaginatedResponse, StoreOptionExt,
    StoreResultExt,
};
use crate::store::PlantationFilter;

pub async fn list_plantations(
    OptionalAuth(principal): OptionalAuth,
    State(state): State<Arc<AppState>>,
    ApiQuery(params): ApiQuery<ListPlantationsParams>,
) -> impl IntoResponse {
    let window = PageWindow::resolve(
        params.page.as_deref(),
        params.limit.as_deref(),
        &state.limits,
        principal.as_ref(),
    );
    let filter = PlantationFilter {
        site_id: params.site_id,
        search: non_empty(params.search),
    };

    let (plantations, total) = state
        .store
        .list_plantations(&filter, window.store_page())
        .api_err("Failed to list plantations")?;

    Ok::<_, ApiError>(Json(PaginatedResponse::new(
        plantations,
        window.pagination(total),
    )))
}

pub async fn create_plantation(
    RequireAuth(principal): RequireAuth,
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<CreatePlantationRequest>,
) -> impl IntoResponse {
    let plantation = state
        .store
        .create_plantation(&req.into_plantation(Utc::now()))
        .api_err("Failed to create plantation")?;

    tracing::info!(
        user_id = principal.user_id,
        id = plantation.id,
        site_id = plantation.site_id,
        "plantation created"
    );

    Ok::<_, ApiError>((
        StatusCode::CREATED,
        Json(ApiResponse::success(plantation).with_message("plantation created")),
    ))
}

pub async fn get_plantation(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<i64>,
) -> impl IntoResponse {
    let plantation = state
        .store
        .get_plantation(id)
        .api_err("Failed to get plantation")?
        .or_not_found("Plantation not found")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(plantation)))
}

pub async fn update_plantation(
    RequireAuth(principal): RequireAuth,
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(req): ApiJson<UpdatePlantationRequest>,
) -> impl IntoResponse {
    let store = state.store.as_ref();

    let mut plantation = store
        .get_plantation(id)
        .api_err("Failed to get plantation")?
        .or_not_found("Plantation not found")?;

    req.apply_to(&mut plantation);

    let plantation = store
        .update_plantation(&plantation)
        .api_err("Failed to update plantation")?;

    tracing::info!(user_id = principal.user_id, id, "plantation updated");

    Ok::<_, ApiError>(Json(
        ApiResponse::success(plantation).with_message("plantation updated"),
    ))
}

pub async fn delete_plantation(
    RequireAuth(principal): RequireAuth,
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<i64>,
) -> impl IntoResponse {
    let store = state.store.as_ref();

    store
        .get_plantation(id)
        .api_err("Failed to get plantation")?
        .or_not_found("Plantation not found")?;

    store
        .delete_plantation(id)
        .api_err("Failed to delete plantation")?;

    tracing::info!(user_id = principal.user_id, id, "plantation deleted");

    Ok::<_, ApiError>(Json(ApiResponse::message("plantation deleted")))
}
