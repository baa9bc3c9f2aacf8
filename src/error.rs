use axum::{
    response::{IntoResponse, Response},
    http::StatusCode,
};
use axum::extract::multipart::MultipartError;
use serde_json::json;
use axum::Json;
use thiserror::Error;

/// Failures raised by the profiling core (table loading and profiling).
#[derive(Debug, Error)]
pub enum ProfileError {
    /// The file name's extension is not one the loader can read.
    #[error("Unsupported file format: {file_name}")]
    UnsupportedFormat { file_name: String },

    /// The extension is known but the bytes do not parse as that format.
    #[error("Malformed {format} input: {reason}")]
    MalformedInput { format: &'static str, reason: String },

    /// Broken internal state; never caused by file content.
    #[error("Internal profiling error: {0}")]
    Internal(String),
}

impl ProfileError {
    pub fn malformed(format: &'static str, reason: impl Into<String>) -> Self {
        ProfileError::MalformedInput {
            format,
            reason: reason.into(),
        }
    }

    /// True when the caller's input is at fault rather than the service.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, ProfileError::Internal(_))
    }
}

#[derive(Debug)]
pub enum AppError {
    InvalidInput(String),
    UnsupportedFormat(String),
    MalformedInput(String),
    PayloadTooLarge(String),
    IoError(std::io::Error),
    LlmError(String),
    Internal(String),
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AppError::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            AppError::UnsupportedFormat(msg) => write!(f, "Unsupported format: {}", msg),
            AppError::MalformedInput(msg) => write!(f, "Malformed input: {}", msg),
            AppError::PayloadTooLarge(msg) => write!(f, "Payload too large: {}", msg),
            AppError::IoError(err) => write!(f, "IO error: {}", err),
            AppError::LlmError(msg) => write!(f, "LLM error: {}", msg),
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::IoError(err)
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Internal(format!("JSON serialization failed: {}", err))
    }
}

impl From<ProfileError> for AppError {
    fn from(err: ProfileError) -> Self {
        match err {
            ProfileError::UnsupportedFormat { .. } => AppError::UnsupportedFormat(err.to_string()),
            ProfileError::MalformedInput { .. } => AppError::MalformedInput(err.to_string()),
            ProfileError::Internal(msg) => AppError::Internal(msg),
        }
    }
}

impl From<MultipartError> for AppError {
    fn from(err: MultipartError) -> Self {
        AppError::InvalidInput(format!("Failed to read upload: {}", err.body_text()))
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(err: tokio::task::JoinError) -> Self {
        AppError::Internal(format!("Profiling task failed: {}", err))
    }
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::UnsupportedFormat(_) => StatusCode::BAD_REQUEST,
            AppError::MalformedInput(_) => StatusCode::BAD_REQUEST,
            AppError::PayloadTooLarge(_) => StatusCode::BAD_REQUEST,
            AppError::IoError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::LlmError(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match self {
            AppError::InvalidInput(msg)
            | AppError::UnsupportedFormat(msg)
            | AppError::MalformedInput(msg)
            | AppError::PayloadTooLarge(msg)
            | AppError::LlmError(msg) => msg,
            AppError::IoError(err) => err.to_string(),
            AppError::Internal(msg) => format!("Error processing file: {}", msg),
        };

        if status.is_server_error() {
            tracing::error!("Request failed with {}: {}", status, message);
        } else {
            tracing::warn!("Request rejected with {}: {}", status, message);
        }

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_errors_map_to_client_and_server_statuses() {
        let unsupported: AppError = ProfileError::UnsupportedFormat {
            file_name: "data.json".to_string(),
        }
        .into();
        assert_eq!(unsupported.status_code(), StatusCode::BAD_REQUEST);

        let malformed: AppError = ProfileError::malformed("csv", "unterminated quote").into();
        assert_eq!(malformed.status_code(), StatusCode::BAD_REQUEST);
        assert!(malformed.to_string().contains("unterminated quote"));

        let internal: AppError = ProfileError::Internal("column length mismatch".to_string()).into();
        assert_eq!(internal.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn internal_errors_are_not_client_errors() {
        assert!(!ProfileError::Internal("boom".to_string()).is_client_error());
        assert!(ProfileError::malformed("spreadsheet", "bad zip").is_client_error());
    }
}
