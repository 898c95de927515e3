pub mod config;
pub mod error;
pub mod handlers;
pub mod services;
pub mod utils;

use crate::config::RelayConfig;
use crate::services::relay::RelayService;
use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::relay::process_image,
        handlers::health::health_check
    ),
    components(
        schemas(
            handlers::health::HealthResponse
        )
    ),
    tags(
        (name = "relay", description = "Image upload and worker relay"),
        (name = "system", description = "Service health")
    )
)]
pub struct ApiDoc;

#[derive(Clone)]
pub struct AppState {
    pub relay: Arc<RelayService>,
    pub config: RelayConfig,
}

impl AppState {
    pub fn new(config: RelayConfig) -> Self {
        Self {
            relay: Arc::new(RelayService::new(config.clone())),
            config,
        }
    }
}

pub fn create_app(state: AppState) -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/health", get(handlers::health::health_check))
        .route("/process", post(handlers::relay::process_image))
        .with_state(state)
}
