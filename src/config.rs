use anyhow::{anyhow, Context, Result};
use dotenvy::dotenv;
use std::net::SocketAddr;
use std::str::FromStr;

const DEFAULT_MAX_FILE_SIZE_MB: usize = 10;
const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8000";
const DEFAULT_CORS_ORIGINS: &str = "http://localhost:3000,http://localhost:5173";
const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";

/// Which insight generator the service uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsightsProvider {
    OpenAi,
    Heuristic,
}

impl FromStr for InsightsProvider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(InsightsProvider::OpenAi),
            "heuristic" | "mock" => Ok(InsightsProvider::Heuristic),
            other => Err(anyhow!("Unknown INSIGHTS_PROVIDER: {}", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub max_file_size: usize,
    pub allowed_file_types: Vec<String>,
    pub bind_addr: SocketAddr,
    pub environment: String,
    pub api_prefix: String,
    pub cors_origins: Vec<String>,
    pub openai_key: Option<String>,
    pub openai_model: String,
    pub insights_provider: InsightsProvider,
}

impl Config {
    pub fn new() -> Result<Self> {
        // Load .env file first
        dotenv().ok();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any key lookup; `new` uses the process
    /// environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let max_file_size = match get("MAX_FILE_SIZE_MB") {
            Some(raw) => raw
                .trim()
                .parse::<usize>()
                .with_context(|| format!("Invalid MAX_FILE_SIZE_MB: {}", raw))?
                .checked_mul(1024 * 1024)
                .ok_or_else(|| anyhow!("MAX_FILE_SIZE_MB too large: {}", raw))?,
            None => DEFAULT_MAX_FILE_SIZE_MB * 1024 * 1024,
        };

        let bind_addr_raw = get("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_addr_raw
            .trim()
            .parse::<SocketAddr>()
            .with_context(|| format!("Invalid BIND_ADDR: {}", bind_addr_raw))?;

        let openai_key = get("OPENAI_API_KEY");
        let insights_provider = match get("INSIGHTS_PROVIDER") {
            Some(raw) => raw.parse()?,
            None if openai_key.is_some() => InsightsProvider::OpenAi,
            None => InsightsProvider::Heuristic,
        };
        if insights_provider == InsightsProvider::OpenAi && openai_key.is_none() {
            return Err(anyhow!("Failed to load OPENAI_API_KEY: required by the openai insights provider"));
        }

        Ok(Config {
            max_file_size,
            allowed_file_types: split_list(&get("ALLOWED_FILE_TYPES").unwrap_or_else(|| "csv,xlsx,xls".to_string()))
                .into_iter()
                .map(|t| t.to_ascii_lowercase())
                .collect(),
            bind_addr,
            environment: get("ENVIRONMENT").unwrap_or_else(|| "development".to_string()),
            api_prefix: get("API_V1_PREFIX").unwrap_or_else(|| "/api/v1".to_string()),
            cors_origins: split_list(&get("BACKEND_CORS_ORIGINS").unwrap_or_else(|| DEFAULT_CORS_ORIGINS.to_string())),
            openai_key,
            openai_model: get("OPENAI_MODEL").unwrap_or_else(|| DEFAULT_OPENAI_MODEL.to_string()),
            insights_provider,
        })
    }

    pub fn is_allowed_extension(&self, extension: &str) -> bool {
        self.allowed_file_types
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(extension))
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            max_file_size: DEFAULT_MAX_FILE_SIZE_MB * 1024 * 1024,
            allowed_file_types: vec!["csv".to_string(), "xlsx".to_string(), "xls".to_string()],
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 8000)),
            environment: "development".to_string(),
            api_prefix: "/api/v1".to_string(),
            cors_origins: split_list(DEFAULT_CORS_ORIGINS),
            openai_key: None,
            openai_model: DEFAULT_OPENAI_MODEL.to_string(),
            insights_provider: InsightsProvider::Heuristic,
        }
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}
