//! Profiles uploaded CSV and spreadsheet files and asks an insight
//! generator to comment on the result.

use axum::http::{HeaderValue, Method};
use axum::Router;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod routes;
pub mod services;

pub use error::{AppError, ProfileError};
pub use models::{ColumnProfile, InsightReport, Profile};
pub use services::profile_file;

// Application state
#[derive(Clone)]
pub struct AppState {
    pub config: config::Config,
    pub insights: Arc<dyn services::insights::InsightGenerator>,
}

impl AppState {
    pub fn new(
        config: config::Config,
        insights: Arc<dyn services::insights::InsightGenerator>,
    ) -> Self {
        Self { config, insights }
    }
}

/// Builds the full router: health endpoints at the root and the analysis
/// endpoints under the configured API prefix.
pub fn app(state: Arc<AppState>) -> Router {
    let origins: Vec<HeaderValue> = state
        .config
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!("Ignoring invalid CORS origin {}: {}", origin, e);
                None
            }
        })
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any)
        .max_age(Duration::from_secs(3600));

    let analysis_path = format!("{}/analysis", state.config.api_prefix.trim_end_matches('/'));

    Router::new()
        .merge(routes::routes())
        .nest(&analysis_path, routes::analysis::routes(state.config.max_file_size))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
