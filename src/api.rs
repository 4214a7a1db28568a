use std::future::Future;

use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};
use tracing::debug;

use crate::config::ClientConfig;
use crate::errors::AppError;
use crate::models::{
    ClearResponse, DocumentCount, HealthStatus, ProcessResponse, QueryRequest, QueryResponse,
    StagedFile,
};

// ── Capabilities ──────────────────────────────────────────────────────────────

/// Resets the server-side document context.
pub trait ContextResetter: Send + Sync {
    fn reset_context(&self) -> impl Future<Output = Result<(), AppError>> + Send;
}

/// Accepts one file into the document context.
pub trait DocumentStore: Send + Sync {
    fn upload(&self, file: &StagedFile) -> impl Future<Output = Result<UploadReceipt, AppError>> + Send;
}

/// Answers one question against the document context.
pub trait QueryService: Send + Sync {
    fn query(&self, request: &QueryRequest) -> impl Future<Output = Result<QueryResponse, AppError>> + Send;
}

/// What the service reported for a successfully uploaded file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadReceipt {
    pub message: Option<String>,
    pub document_count: Option<u32>,
}

// ── HTTP client ───────────────────────────────────────────────────────────────

/// `reqwest`-backed client for the document-QA service.
#[derive(Debug, Clone)]
pub struct DocumentQaClient {
    http: Client,
    config: ClientConfig,
}

impl DocumentQaClient {
    pub fn new(config: ClientConfig) -> Self {
        Self { http: Client::new(), config }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// GET `/health`
    pub async fn health(&self) -> Result<HealthStatus, AppError> {
        const ENDPOINT: &str = "/health";
        let resp = self
            .http
            .get(self.config.endpoint(ENDPOINT))
            .send()
            .await
            .map_err(|source| AppError::Network { endpoint: ENDPOINT, source })?;
        let resp = ensure_success(ENDPOINT, resp)?;
        resp.json::<HealthStatus>()
            .await
            .map_err(|source| AppError::Decode { endpoint: ENDPOINT, source })
    }

    /// GET `/documents/count`
    pub async fn document_count(&self) -> Result<u64, AppError> {
        const ENDPOINT: &str = "/documents/count";
        let resp = self
            .http
            .get(self.config.endpoint(ENDPOINT))
            .send()
            .await
            .map_err(|source| AppError::Network { endpoint: ENDPOINT, source })?;
        let resp = ensure_success(ENDPOINT, resp)?;
        let body = resp
            .json::<DocumentCount>()
            .await
            .map_err(|source| AppError::Decode { endpoint: ENDPOINT, source })?;
        Ok(body.count)
    }
}

impl ContextResetter for DocumentQaClient {
    /// DELETE `/clear`
    async fn reset_context(&self) -> Result<(), AppError> {
        const ENDPOINT: &str = "/clear";
        let resp = self
            .http
            .delete(self.config.endpoint(ENDPOINT))
            .send()
            .await
            .map_err(|source| AppError::Network { endpoint: ENDPOINT, source })?;
        let resp = ensure_success(ENDPOINT, resp)?;

        // Body is informational only.
        if let Ok(body) = resp.json::<ClearResponse>().await {
            debug!("context reset: {}", body.message);
        }
        Ok(())
    }
}

impl DocumentStore for DocumentQaClient {
    /// POST `/upload` with the payload in multipart field `file`.
    async fn upload(&self, file: &StagedFile) -> Result<UploadReceipt, AppError> {
        const ENDPOINT: &str = "/upload";
        let part = Part::bytes(file.payload().to_vec()).file_name(file.name().to_string());
        let form = Form::new().part("file", part);

        let resp = self
            .http
            .post(self.config.endpoint(ENDPOINT))
            .multipart(form)
            .send()
            .await
            .map_err(|source| AppError::Network { endpoint: ENDPOINT, source })?;
        let resp = ensure_success(ENDPOINT, resp)?;

        let body = resp
            .bytes()
            .await
            .map_err(|source| AppError::Decode { endpoint: ENDPOINT, source })?;
        interpret_upload_body(&body)
    }
}

impl QueryService for DocumentQaClient {
    /// POST `/query`
    async fn query(&self, request: &QueryRequest) -> Result<QueryResponse, AppError> {
        const ENDPOINT: &str = "/query";
        let resp = self
            .http
            .post(self.config.endpoint(ENDPOINT))
            .json(request)
            .send()
            .await
            .map_err(|source| AppError::Network { endpoint: ENDPOINT, source })?;
        let resp = ensure_success(ENDPOINT, resp)?;
        resp.json::<QueryResponse>()
            .await
            .map_err(|source| AppError::Decode { endpoint: ENDPOINT, source })
    }
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn ensure_success(endpoint: &'static str, resp: Response) -> Result<Response, AppError> {
    let status = resp.status();
    if !status.is_success() {
        return Err(AppError::Status { endpoint, status });
    }
    Ok(resp)
}

/// A 2xx upload counts as accepted unless the body explicitly says
/// `"success": false`. Empty or foreign bodies are accepted as-is.
fn interpret_upload_body(body: &[u8]) -> Result<UploadReceipt, AppError> {
    match serde_json::from_slice::<ProcessResponse>(body) {
        Ok(process) if !process.success => Err(AppError::Rejected { message: process.message }),
        Ok(process) => Ok(UploadReceipt {
            message: Some(process.message).filter(|m| !m.is_empty()),
            document_count: process.document_count,
        }),
        Err(_) => Ok(UploadReceipt::default()),
    }
}
