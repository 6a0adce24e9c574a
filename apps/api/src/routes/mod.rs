pub mod health;

use std::time::Duration;

use anyhow::{Context, Result};
use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    routing::get,
    Router,
};
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::blob::keys::PUBLIC_PREFIX;
use crate::resources::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let upload_limit = state.config.max_upload_bytes;

    Router::new()
        .route("/", get(health::banner_handler))
        .route("/health", get(health::health_handler))
        .route(
            "/api/projects",
            get(handlers::handle_list_projects).post(handlers::handle_create_project),
        )
        .route(
            "/api/resume",
            get(handlers::handle_get_resume).post(handlers::handle_upload_resume),
        )
        .route(
            &format!("{PUBLIC_PREFIX}/:key"),
            get(handlers::handle_get_upload),
        )
        .layer(DefaultBodyLimit::max(upload_limit))
        .with_state(state)
}

/// CORS policy restricted to the configured origins, with credentials allowed.
pub fn cors_layer(origins: &[String]) -> Result<CorsLayer> {
    let origins = origins
        .iter()
        .map(|o| {
            HeaderValue::from_str(o).with_context(|| format!("Invalid CORS origin '{o}'"))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true)
        .max_age(Duration::from_secs(60 * 60)))
}
