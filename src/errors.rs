use std::future::Future;

use thiserror::Error;
use tracing::warn;

/// Top-level client error.
/// Every variant renders as a plain-language message safe to show the user.
#[derive(Debug, Error)]
pub enum AppError {
    // ── Validation errors ────────────────────────────────────────────────────
    #[error("Please select at least one file to process")]
    EmptyBatch,

    // ── Upload errors ────────────────────────────────────────────────────────
    #[error("Failed to upload {file_name}")]
    UploadFailed {
        file_name: String,
        #[source]
        source: Box<AppError>,
    },

    #[error("Document service rejected the file: {message}")]
    Rejected { message: String },

    // ── Transport errors ─────────────────────────────────────────────────────
    #[error("Network error calling {endpoint}: {source}")]
    Network {
        endpoint: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("Server error from {endpoint}: {status}")]
    Status {
        endpoint: &'static str,
        status: reqwest::StatusCode,
    },

    #[error("Parse error from {endpoint}: {source}")]
    Decode {
        endpoint: &'static str,
        #[source]
        source: reqwest::Error,
    },

    // ── System errors ────────────────────────────────────────────────────────
    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

impl AppError {
    pub fn upload_failed(file_name: impl Into<String>, source: AppError) -> Self {
        AppError::UploadFailed { file_name: file_name.into(), source: Box::new(source) }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, AppError::EmptyBatch)
    }

    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            AppError::Network { .. } | AppError::Status { .. } | AppError::Decode { .. }
        )
    }

    /// Name of the file an upload failure refers to.
    pub fn failed_file(&self) -> Option<&str> {
        match self {
            AppError::UploadFailed { file_name, .. } => Some(file_name),
            _ => None,
        }
    }
}

/// Runs a side effect whose failure must never reach the caller.
///
/// The error is written to the log sink under `operation` and collapsed to
/// `None`; callers that only care about completion can ignore the result.
pub async fn best_effort<T, F>(operation: &'static str, fut: F) -> Option<T>
where
    F: Future<Output = Result<T, AppError>>,
{
    match fut.await {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(operation, "best-effort operation failed: {e}");
            None
        }
    }
}
