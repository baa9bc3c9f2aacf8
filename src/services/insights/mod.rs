use futures::future::BoxFuture;
use std::sync::Arc;
use crate::config::{Config, InsightsProvider};
use crate::error::AppError;
use crate::models::{InsightReport, Profile};

pub mod heuristic;
pub mod openai;

pub use heuristic::HeuristicInsightGenerator;
pub use openai::OpenAiInsightGenerator;

/// Turns a profile into natural-language insights. Implementations own any
/// prompting and response clean-up; callers pass the report through as is.
pub trait InsightGenerator: Send + Sync {
    fn generate_insights<'a>(
        &'a self,
        profile: &'a Profile,
    ) -> BoxFuture<'a, Result<InsightReport, AppError>>;
}

/// Picks the generator named by the configuration.
pub fn from_config(config: &Config) -> Result<Arc<dyn InsightGenerator>, AppError> {
    match config.insights_provider {
        InsightsProvider::OpenAi => {
            let key = config.openai_key.as_deref().ok_or_else(|| {
                AppError::InvalidInput("OPENAI_API_KEY is required for the openai insights provider".to_string())
            })?;
            tracing::info!("Using OpenAI insight generator with model {}", config.openai_model);
            Ok(Arc::new(OpenAiInsightGenerator::new(key, &config.openai_model)))
        }
        InsightsProvider::Heuristic => {
            tracing::info!("Using heuristic insight generator");
            Ok(Arc::new(HeuristicInsightGenerator))
        }
    }
}
