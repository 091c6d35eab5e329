use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use chrono::Utc;

use crate::auth::{OptionalAuth, RequireAuth};
use crate::server::AppState;
use crate::server::dto::{
    CreatePlotRequest, ListPlotsParams, PageWindow, PlotResponse, UpdatePlotRequest, non_empty,
};
use crate::server::response::{
    ApiError, ApiJson, ApiPath, ApiQuery, ApiResponse, PaginatedResponse, StoreOptionExt,
    StoreResultExt,
};
use crate::store::PlotFilter;

pub async fn list_plots(
    OptionalAuth(principal): OptionalAuth,
    State(state): State<Arc<AppState>>,
    ApiQuery(params): ApiQuery<ListPlotsParams>,
) -> impl IntoResponse {
    let window = PageWindow::resolve(
        params.page.as_deref(),
        params.limit.as_deref(),
        &state.limits,
        principal.as_ref(),
    );
    let filter = PlotFilter {
        plantation_id: params.plantation_id,
        plot_type: non_empty(params.plot_type),
    };

    let (plots, total) = state
        .store
        .list_plots(&filter, window.store_page())
        .api_err("Failed to list plots")?;

    let plots: Vec<PlotResponse> = plots.into_iter().map(PlotResponse::from).collect();

    Ok::<_, ApiError>(Json(PaginatedResponse::new(plots, window.pagination(total))))
}

pub async fn create_plot(
    RequireAuth(principal): RequireAuth,
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<CreatePlotRequest>,
) -> impl IntoResponse {
    let plot = state
        .store
        .create_plot(&req.into_plot(Utc::now()))
        .api_err("Failed to create plot")?;

    tracing::info!(
        user_id = principal.user_id,
        id = plot.id,
        plot_type = %plot.plot_type,
        "plot created"
    );

    Ok::<_, ApiError>((
        StatusCode::CREATED,
        Json(ApiResponse::success(PlotResponse::from(plot)).with_message("plot created")),
    ))
}

pub async fn get_plot(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<i64>,
) -> impl IntoResponse {
    let plot = state
        .store
        .get_plot(id)
        .api_err("Failed to get plot")?
        .or_not_found("Plot not found")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(PlotResponse::from(plot))))
}

pub async fn update_plot(
    RequireAuth(principal): RequireAuth,
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(req): ApiJson<UpdatePlotRequest>,
) -> impl IntoResponse {
    let store = state.store.as_ref();

    let mut plot = store
        .get_plot(id)
        .api_err("Failed to get plot")?
        .or_not_found("Plot not found")?;

    req.apply_to(&mut plot);

    let plot = store.update_plot(&plot).api_err("Failed to update plot")?;

    tracing::info!(user_id = principal.user_id, id, "plot updated");

    Ok::<_, ApiError>(Json(
        ApiResponse::success(PlotResponse::from(plot)).with_message("plot updated"),
    ))
}

pub async fn delete_plot(
    RequireAuth(principal): RequireAuth,
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<i64>,
) -> impl IntoResponse {
    let store = state.store.as_ref();

    store
        .get_plot(id)
        .api_err("Failed to get plot")?
        .or_not_found("Plot not found")?;

    store.delete_plot(id).api_err("Failed to delete plot")?;

    tracing::info!(user_id = principal.user_id, id, "plot deleted");

    Ok::<_, ApiError>(Json(ApiResponse::message("plot deleted")))
}
