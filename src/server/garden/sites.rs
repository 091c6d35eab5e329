use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use chrono::Utc;

use crate::auth::{OptionalAuth, RequireAdmin, RequireAuth};
use crate::server::AppState;
use crate::server::dto::{
    CreateSiteRequest, ListSitesParams, PageWindow, SiteResponse, UpdateSiteRequest, non_empty,
};
use crate::server::response::{
    ApiError, ApiJson, ApiPath, ApiQuery, ApiResponse, PaginatedResponse, StoreOptionExt,
    StoreResultExt,
};
use crate::store::SiteFilter;

pub async fn list_sites(
    OptionalAuth(principal): OptionalAuth,
    State(state): State<Arc<AppState>>,
    ApiQuery(params): ApiQuery<ListSitesParams>,
) -> impl IntoResponse {
    let window = PageWindow::resolve(
        params.page.as_deref(),
        params.limit.as_deref(),
        &state.limits,
        principal.as_ref(),
    );
    let filter = SiteFilter {
        search: non_empty(params.search),
    };

    let (sites, total) = state
        .store
        .list_sites(&filter, window.store_page())
        .api_err("Failed to list sites")?;

    let sites: Vec<SiteResponse> = sites.into_iter().map(SiteResponse::from).collect();

    Ok::<_, ApiError>(Json(PaginatedResponse::new(sites, window.pagination(total))))
}

pub async fn create_site(
    RequireAuth(principal): RequireAuth,
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<CreateSiteRequest>,
) -> impl IntoResponse {
    let store = state.store.as_ref();
    let site = req.into_site(Utc::now());

    if store
        .get_site_by_name(&site.name)
        .api_err("Failed to check site name")?
        .is_some()
    {
        return Err(ApiError::conflict("a site with that name already exists"));
    }

    let site = store.create_site(&site).api_err("Failed to create site")?;

    tracing::info!(user_id = principal.user_id, id = site.id, "site {} created", site.name);

    Ok::<_, ApiError>((
        StatusCode::CREATED,
        Json(ApiResponse::success(SiteResponse::from(site)).with_message("site created")),
    ))
}

pub async fn get_site(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<i64>,
) -> impl IntoResponse {
    let site = state
        .store
        .get_site(id)
        .api_err("Failed to get site")?
        .or_not_found("Site not found")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(SiteResponse::from(site))))
}

pub async fn update_site(
    RequireAuth(principal): RequireAuth,
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(req): ApiJson<UpdateSiteRequest>,
) -> impl IntoResponse {
    let store = state.store.as_ref();

    let mut site = store
        .get_site(id)
        .api_err("Failed to get site")?
        .or_not_found("Site not found")?;

    req.apply_to(&mut site);

    let site = store.update_site(&site).api_err("Failed to update site")?;

    tracing::info!(user_id = principal.user_id, id, "site updated");

    Ok::<_, ApiError>(Json(
        ApiResponse::success(SiteResponse::from(site)).with_message("site updated"),
    ))
}

pub async fn delete_site(
    RequireAdmin(principal): RequireAdmin,
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<i64>,
) -> impl IntoResponse {
    let store = state.store.as_ref();

    store
        .get_site(id)
        .api_err("Failed to get site")?
        .or_not_found("Site not found")?;

    store.delete_site(id).api_err("Failed to delete site")?;

    tracing::info!(user_id = principal.user_id, id, "site deleted");

    Ok::<_, ApiError>(Json(ApiResponse::message("site deleted")))
}
