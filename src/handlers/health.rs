use crate::AppState;
use axum::{Json, extract::State, response::IntoResponse};
use serde::Serialize;
use std::path::Path;
use utoipa::ToSchema;

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub upload_dir: String,
    pub output_dir: String,
    pub version: String,
}

async fn dir_status(path: &Path) -> &'static str {
    match tokio::fs::metadata(path).await {
        Ok(m) if m.is_dir() => "ready",
        Ok(_) => "not a directory",
        Err(_) => "missing",
    }
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Relay health status", body = HealthResponse)
    ),
    tag = "system"
)]
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let upload_dir = dir_status(&state.config.upload_dir).await;
    let output_dir = dir_status(&state.config.output_dir).await;

    Json(HealthResponse {
        status: "ok".to_string(),
        upload_dir: upload_dir.to_string(),
        output_dir: output_dir.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
