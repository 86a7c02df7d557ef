use axum::{
    middleware,
    routing::{get, patch, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use super::{action, competitors, handlers, middleware::metrics_middleware, preparation};
use super::{reports, results, settings, ws};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    let api_routes = Router::new()
        // Health and config
        .route("/health", get(handlers::health))
        .route("/config", get(handlers::get_config))
        // Settings
        .route("/settings", get(settings::export).put(settings::import))
        // Competitors
        .route("/competitors", get(competitors::list))
        .route("/competitors/setup", post(competitors::setup))
        .route("/competitors/{name}", patch(competitors::update))
        // Preparation and action
        .route("/preparation", post(preparation::run))
        .route("/action/start", post(action::start))
        .route("/action/stop", post(action::stop))
        .route("/action/status", get(action::status))
        // Results and reports
        .route("/results", get(results::get_results))
        .route("/reports/markdown", get(reports::markdown))
        .route("/reports/sql", get(reports::sql))
        // Live updates
        .route("/ws", get(ws::ws_handler));

    Router::new()
        .nest("/api/v1", api_routes)
        .route("/metrics", get(handlers::metrics))
        .with_state(state)
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
