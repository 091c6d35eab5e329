mod plantations;
mod plots;
mod sites;
mod templates;

use std::sync::Arc;

use axum::{Router, routing::get};

use crate::server::AppState;

pub fn garden_router() -> Router<Arc<AppState>> {
    Router::new()
        // Sites
        .route("/sites", get(sites::list_sites).post(sites::create_site))
        .route(
            "/sites/{id}",
            get(sites::get_site)
                .put(sites::update_site)
                .delete(sites::delete_site),
        )
        // Plantations
        .route(
            "/plantations",
            get(plantations::list_plantations).post(plantations::create_plantation),
        )
        .route(
            "/plantations/{id}",
            get(plantations::get_plantation)
                .put(plantations::update_plantation)
                .delete(plantations::delete_plantation),
        )
        // Plots
        .route("/plots", get(plots::list_plots).post(plots::create_plot))
        .route(
            "/plots/{id}",
            get(plots::get_plot)
                .put(plots::update_plot)
                .delete(plots::delete_plot),
        )
        // Suggestion templates
        .route(
            "/suggestion-templates",
            get(templates::list_templates).post(templates::create_template),
        )
        .route(
            "/suggestion-templates/{id}",
            get(templates::get_template)
                .put(templates::update_template)
                .delete(templates::delete_template),
        )
}
