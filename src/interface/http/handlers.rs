use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::{IntoResponse, Response}, Json};
use serde::Serialize;

use crate::application::{Autoscaler, AutoscalerStatus, CpuSampler};
use crate::domain::ContainerRef;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub autoscaler: Arc<Autoscaler>,
    pub sampler: CpuSampler,
}

/// Response for /api/containers
#[derive(Debug, Serialize)]
pub struct ContainersResponse {
    pub timestamp: String,
    pub prefix: String,
    pub running: usize,
    pub containers: Vec<ContainerRef>,
}

/// Handler for GET /api/health
pub async fn health_handler() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::OK,
        Json(serde_json::json!({
            "status": "healthy",
            "service": "dockscale"
        })),
    )
}

/// Handler for GET /api/autoscaler
pub async fn autoscaler_handler(State(state): State<AppState>) -> Json<AutoscalerStatus> {
    Json(state.autoscaler.status())
}

/// Handler for GET /api/containers
pub async fn containers_handler(State(state): State<AppState>) -> Response {
    match state.sampler.matching_containers(true).await {
        Ok(containers) => (
            StatusCode::OK,
            Json(ContainersResponse {
                timestamp: chrono::Utc::now().to_rfc3339(),
                prefix: state.sampler.service().container_prefix(),
                running: containers.iter().filter(|c| c.state.is_running()).count(),
                containers,
            }),
        )
            .into_response(),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
    }
}
