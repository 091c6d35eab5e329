use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use chrono::Utc;

use crate::auth::{OptionalAuth, RequireAuth};
use crate::server::AppState;
use crate::server::dto::{
    CreateSpeciesRequest, ListSpeciesParams, PageWindow, UpdateSpeciesRequest, non_empty,
};
use crate::server::response::{
    ApiError, ApiJson, ApiPath, ApiQuery, ApiResponse, PaginatedResponse, StoreOptionExt,
    StoreResultExt,
};
use crate::store::SpeciesFilter;

pub fn catalog_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/plantas", get(list_species).post(create_species))
        .route(
            "/plantas/{id}",
            get(get_species).put(update_species).delete(delete_species),
        )
}

async fn list_species(
    OptionalAuth(principal): OptionalAuth,
    State(state): State<Arc<AppState>>,
    ApiQuery(params): ApiQuery<ListSpeciesParams>,
) -> impl IntoResponse {
    let window = PageWindow::resolve(
        params.page.as_deref(),
        params.limit.as_deref(),
        &state.limits,
        principal.as_ref(),
    );

    let filter = SpeciesFilter {
        search: non_empty(params.search),
        stratum: non_empty(params.stratum),
        function_ecol: non_empty(params.function_ecol),
        succession_stage: non_empty(params.succession_stage),
        desired: params.desired,
    };

    let (species, total) = state
        .store
        .list_species(&filter, window.store_page())
        .api_err("Failed to list species")?;

    Ok::<_, ApiError>(Json(PaginatedResponse::new(
        species,
        window.pagination(total),
    )))
}

async fn create_species(
    RequireAuth(principal): RequireAuth,
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<CreateSpeciesRequest>,
) -> impl IntoResponse {
    let store = state.store.as_ref();
    let species = req.into_species(Utc::now());

    if store
        .get_species_by_external_ref(&species.external_ref)
        .api_err("Failed to check external_ref")?
        .is_some()
    {
        return Err(ApiError::conflict(
            "a species with that external_ref already exists",
        ));
    }

    let species = store
        .create_species(&species)
        .api_err("Failed to create species")?;

    tracing::info!(
        user_id = principal.user_id,
        id = species.id,
        "species {} created",
        species.common_name
    );

    Ok::<_, ApiError>((
        StatusCode::CREATED,
        Json(ApiResponse::success(species).with_message("species created")),
    ))
}

async fn get_species(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<i64>,
) -> impl IntoResponse {
    let species = state
        .store
        .get_species(id)
        .api_err("Failed to get species")?
        .or_not_found("Species not found")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(species)))
}

async fn update_species(
    RequireAuth(principal): RequireAuth,
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(req): ApiJson<UpdateSpeciesRequest>,
) -> impl IntoResponse {
    let store = state.store.as_ref();

    let mut species = store
        .get_species(id)
        .api_err("Failed to get species")?
        .or_not_found("Species not found")?;

    req.apply_to(&mut species);

    let species = store
        .update_species(&species)
        .api_err("Failed to update species")?;

    tracing::info!(user_id = principal.user_id, id, "species updated");

    Ok::<_, ApiError>(Json(
        ApiResponse::success(species).with_message("species updated"),
    ))
}

async fn delete_species(
    RequireAuth(principal): RequireAuth,
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<i64>,
) -> impl IntoResponse {
    let store = state.store.as_ref();

    store
        .get_species(id)
        .api_err("Failed to get species")?
        .or_not_found("Species not found")?;

    store
        .delete_species(id)
        .api_err("Failed to delete species")?;

    tracing::info!(user_id = principal.user_id, id, "species deleted");

    Ok::<_, ApiError>(Json(ApiResponse::message("species deleted")))
}
