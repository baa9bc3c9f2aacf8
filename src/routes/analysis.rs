use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    routing::post,
    Json, Router,
};
use bytes::Bytes;
use std::sync::Arc;
use crate::{
    error::AppError,
    models::AnalysisResponse,
    services::{self, table::loader::file_extension},
    AppState,
};

// Room for multipart boundaries and part headers on top of the file itself.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

pub fn routes(max_file_size: usize) -> Router<Arc<AppState>> {
    Router::new()
        .route("/analyze", post(analyze_file))
        .layer(DefaultBodyLimit::max(body_limit(max_file_size)))
}

fn body_limit(max_file_size: usize) -> usize {
    max_file_size.saturating_add(MULTIPART_OVERHEAD)
}

struct Upload {
    file_name: String,
    data: Bytes,
}

async fn read_upload(multipart: &mut Multipart) -> Result<Upload, AppError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field
            .file_name()
            .map(str::to_string)
            .filter(|name| !name.is_empty())
            .ok_or_else(|| AppError::InvalidInput("No filename provided".to_string()))?;
        let data = field.bytes().await?;
        return Ok(Upload { file_name, data });
    }

    Err(AppError::InvalidInput("No file provided".to_string()))
}

async fn analyze_file(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<AnalysisResponse>, AppError> {
    let start = std::time::Instant::now();

    let Upload { file_name, data } = read_upload(&mut multipart).await?;
    tracing::info!("Received {} ({}KB)", file_name, data.len() / 1024);

    let extension = file_extension(&file_name).unwrap_or_default();
    if !state.config.is_allowed_extension(&extension) {
        return Err(AppError::InvalidInput(format!(
            "File type not allowed. Supported: {}",
            state.config.allowed_file_types.join(", ")
        )));
    }

    if data.len() > state.config.max_file_size {
        return Err(AppError::PayloadTooLarge(format!(
            "File too large. Max size: {}MB",
            state.config.max_file_size / (1024 * 1024)
        )));
    }

    let profile_name = file_name.clone();
    let profile = tokio::task::spawn_blocking(move || services::profile_file(&data, &profile_name)).await??;

    let llm_start = std::time::Instant::now();
    let report = state.insights.generate_insights(&profile).await?;
    tracing::info!("Insights generated in {:?}", llm_start.elapsed());

    tracing::info!("Total processing of {} completed in {:?}", file_name, start.elapsed());
    Ok(Json(AnalysisResponse::new(file_name, profile, report)))
}
