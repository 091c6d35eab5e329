use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use chrono::Utc;

use crate::auth::{OptionalAuth, RequireAuth};
use crate::server::AppState;
use crate::server::dto::{
    CreateTemplateRequest, ListTemplatesParams, PageWindow, UpdateTemplateRequest,
};
use crate::server::response::{
    ApiError, ApiJson, ApiPath, ApiQuery, ApiResponse, PaginatedResponse, StoreOptionExt,
    StoreResultExt,
};
use crate::store::TemplateFilter;

pub async fn list_templates(
    OptionalAuth(principal): OptionalAuth,
    State(state): State<Arc<AppState>>,
    ApiQuery(params): ApiQuery<ListTemplatesParams>,
) -> impl IntoResponse {
    let window = PageWindow::resolve(
        params.page.as_deref(),
        params.limit.as_deref(),
        &state.limits,
        principal.as_ref(),
    );
    let filter = TemplateFilter {
        plantation_id: params.plantation_id,
    };

    let (templates, total) = state
        .store
        .list_templates(&filter, window.store_page())
        .api_err("Failed to list suggestion templates")?;

    Ok::<_, ApiError>(Json(PaginatedResponse::new(
        templates,
        window.pagination(total),
    )))
}

pub async fn create_template(
    RequireAuth(principal): RequireAuth,
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<CreateTemplateRequest>,
) -> impl IntoResponse {
    let template = state
        .store
        .create_template(&req.into_template(Utc::now()))
        .api_err("Failed to create suggestion template")?;

    tracing::info!(
        user_id = principal.user_id,
        id = template.id,
        "suggestion template created"
    );

    Ok::<_, ApiError>((
        StatusCode::CREATED,
        Json(ApiResponse::success(template).with_message("suggestion template created")),
    ))
}

pub async fn get_template(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<i64>,
) -> impl IntoResponse {
    let template = state
        .store
        .get_template(id)
        .api_err("Failed to get suggestion template")?
        .or_not_found("Suggestion template not found")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(template)))
}

pub async fn update_template(
    RequireAuth(principal): RequireAuth,
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(req): ApiJson<UpdateTemplateRequest>,
) -> impl IntoResponse {
    let store = state.store.as_ref();

    let mut template = store
        .get_template(id)
        .api_err("Failed to get suggestion template")?
        .or_not_found("Suggestion template not found")?;

    req.apply_to(&mut template);

    let template = store
        .update_template(&template)
        .api_err("Failed to update suggestion template")?;

    tracing::info!(user_id = principal.user_id, id, "suggestion template updated");

    Ok::<_, ApiError>(Json(
        ApiResponse::success(template).with_message("suggestion template updated"),
    ))
}

pub async fn delete_template(
    RequireAuth(principal): RequireAuth,
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<i64>,
) -> impl IntoResponse {
    let store = state.store.as_ref();

    store
        .get_template(id)
        .api_err("Failed to get suggestion template")?
        .or_not_found("Suggestion template not found")?;

    store
        .delete_template(id)
        .api_err("Failed to delete suggestion template")?;

    tracing::info!(user_id = principal.user_id, id, "suggestion template deleted");

    Ok::<_, ApiError>(Json(ApiResponse::message("suggestion template deleted")))
}
