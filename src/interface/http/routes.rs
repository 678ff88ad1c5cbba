use std::sync::Arc;

use axum::{routing::get, Router};
use tower_http::cors::CorsLayer;

use crate::application::{Autoscaler, CpuSampler};

use super::handlers::{autoscaler_handler, containers_handler, health_handler, AppState};

pub fn create_router(autoscaler: Arc<Autoscaler>, sampler: CpuSampler) -> Router {
    let state = AppState { autoscaler, sampler };

    Router::new()
        .route("/api/health", get(health_handler))
        .route("/api/autoscaler", get(autoscaler_handler))
        .route("/api/containers", get(containers_handler))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
