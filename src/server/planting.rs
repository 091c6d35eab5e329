use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch},
};
use chrono::Utc;

use crate::auth::{OptionalAuth, RequireAuth};
use crate::server::AppState;
use crate::server::dto::{
    CreatePlantInstanceRequest, ListPlantInstancesParams, PageWindow, PlantInstanceResponse,
    StatusRequest, UpdatePlantInstanceRequest, non_empty,
};
use crate::server::response::{
    ApiError, ApiJson, ApiPath, ApiQuery, ApiResponse, PaginatedResponse, StoreOptionExt,
    StoreResultExt,
};
use crate::store::{PlantInstanceFilter, Store};
use crate::types::PlantInstance;

pub fn planting_router() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/plant-instances",
            get(list_plant_instances).post(create_plant_instance),
        )
        .route(
            "/plant-instances/{id}",
            get(get_plant_instance)
                .put(update_plant_instance)
                .delete(delete_plant_instance),
        )
        .route("/plant-instances/{id}/status", patch(update_status))
}

/// Area of the plot an instance lives in. Zero when the plot is gone.
fn plot_area(store: &dyn Store, plot_id: i64) -> Result<f64, ApiError> {
    let plot = store.get_plot(plot_id).api_err("Failed to get plot")?;
    Ok(plot.map(|p| p.area()).unwrap_or(0.0))
}

fn with_density(
    store: &dyn Store,
    instance: PlantInstance,
) -> Result<PlantInstanceResponse, ApiError> {
    let area = plot_area(store, instance.plot_id)?;
    Ok(PlantInstanceResponse::new(instance, area))
}

async fn list_plant_instances(
    OptionalAuth(principal): OptionalAuth,
    State(state): State<Arc<AppState>>,
    ApiQuery(params): ApiQuery<ListPlantInstancesParams>,
) -> impl IntoResponse {
    let store = state.store.as_ref();
    let window = PageWindow::resolve(
        params.page.as_deref(),
        params.limit.as_deref(),
        &state.limits,
        principal.as_ref(),
    );
    let filter = PlantInstanceFilter {
        plot_id: params.plot_id,
        species_id: params.species_id,
        status: non_empty(params.status),
    };

    let (instances, total) = store
        .list_plant_instances(&filter, window.store_page())
        .api_err("Failed to list plant instances")?;

    let mut areas: HashMap<i64, f64> = HashMap::new();
    let mut data = Vec::with_capacity(instances.len());
    for instance in instances {
        let area = match areas.get(&instance.plot_id) {
            Some(area) => *area,
            None => {
                let area = plot_area(store, instance.plot_id)?;
                areas.insert(instance.plot_id, area);
                area
            }
        };
        data.push(PlantInstanceResponse::new(instance, area));
    }

    Ok::<_, ApiError>(Json(PaginatedResponse::new(data, window.pagination(total))))
}

async fn create_plant_instance(
    RequireAuth(principal): RequireAuth,
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<CreatePlantInstanceRequest>,
) -> impl IntoResponse {
    let store = state.store.as_ref();

    let instance = store
        .create_plant_instance(&req.into_instance(Utc::now()))
        .api_err("Failed to create plant instance")?;

    tracing::info!(
        user_id = principal.user_id,
        id = instance.id,
        plot_id = instance.plot_id,
        species_id = instance.species_id,
        "plant instance created"
    );

    let body = with_density(store, instance)?;
    Ok::<_, ApiError>((
        StatusCode::CREATED,
        Json(ApiResponse::success(body).with_message("plant instance created")),
    ))
}

async fn get_plant_instance(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<i64>,
) -> impl IntoResponse {
    let store = state.store.as_ref();

    let instance = store
        .get_plant_instance(id)
        .api_err("Failed to get plant instance")?
        .or_not_found("Plant instance not found")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(with_density(store, instance)?)))
}

async fn update_plant_instance(
    RequireAuth(principal): RequireAuth,
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(req): ApiJson<UpdatePlantInstanceRequest>,
) -> impl IntoResponse {
    let store = state.store.as_ref();

    let mut instance = store
        .get_plant_instance(id)
        .api_err("Failed to get plant instance")?
        .or_not_found("Plant instance not found")?;

    req.apply_to(&mut instance, Utc::now());

    let instance = store
        .update_plant_instance(&instance)
        .api_err("Failed to update plant instance")?;

    tracing::info!(user_id = principal.user_id, id, "plant instance updated");

    let body = with_density(store, instance)?;
    Ok::<_, ApiError>(Json(
        ApiResponse::success(body).with_message("plant instance updated"),
    ))
}

async fn update_status(
    RequireAuth(principal): RequireAuth,
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(req): ApiJson<StatusRequest>,
) -> impl IntoResponse {
    let store = state.store.as_ref();

    let mut instance = store
        .get_plant_instance(id)
        .api_err("Failed to get plant instance")?
        .or_not_found("Plant instance not found")?;

    let previous = std::mem::take(&mut instance.status);
    instance.transition(req.status.trim(), Utc::now());

    let instance = store
        .update_plant_instance(&instance)
        .api_err("Failed to update plant instance status")?;

    tracing::info!(
        user_id = principal.user_id,
        id,
        from = %previous,
        to = %instance.status,
        "plant instance status changed"
    );

    let body = with_density(store, instance)?;
    Ok::<_, ApiError>(Json(
        ApiResponse::success(body).with_message("status updated"),
    ))
}

async fn delete_plant_instance(
    RequireAuth(principal): RequireAuth,
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<i64>,
) -> impl IntoResponse {
    let store = state.store.as_ref();

    store
        .get_plant_instance(id)
        .api_err("Failed to get plant instance")?
        .or_not_found("Plant instance not found")?;

    store
        .delete_plant_instance(id)
        .api_err("Failed to delete plant instance")?;

    tracing::info!(user_id = principal.user_id, id, "plant instance deleted");

    Ok::<_, ApiError>(Json(ApiResponse::message("plant instance deleted")))
}
