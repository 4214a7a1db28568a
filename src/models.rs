use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Fixed number of context chunks requested per question.
pub const QUERY_RESULT_COUNT: u32 = 5;

// ── Upload screen ─────────────────────────────────────────────────────────────

/// A file selected by the user but not yet uploaded.
///
/// The payload is shared, so cloning a staged file (e.g. to snapshot a batch
/// before uploading it) never copies the bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedFile {
    name: String,
    payload: Arc<[u8]>,
}

impl StagedFile {
    pub fn new(name: impl Into<String>, payload: impl Into<Vec<u8>>) -> Self {
        Self { name: name.into(), payload: Arc::from(payload.into()) }
    }

    /// Reads a file from disk, using its file name as the display name.
    pub async fn load(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self::new(name, bytes))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn size(&self) -> usize {
        self.payload.len()
    }

    /// Size rounded to whole KiB, as shown in the staged list.
    pub fn size_kib(&self) -> u64 {
        (self.payload.len() as f64 / 1024.0).round() as u64
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }
}

// ── Chat screen ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

impl MessageRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
        }
    }
}

impl std::fmt::Display for MessageRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One turn of the conversation. Never mutated once appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub role: MessageRole,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl Message {
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            role,
            content: content.into(),
            created_at: Utc::now(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageRole::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(MessageRole::Assistant, content)
    }

    pub fn is_user(&self) -> bool {
        self.role == MessageRole::User
    }

    /// Assistant turns carry markdown, user turns are plain text.
    pub fn is_markdown(&self) -> bool {
        self.role == MessageRole::Assistant
    }
}

// ── Wire models ───────────────────────────────────────────────────────────────

/// Request body for `POST /query`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryRequest {
    pub question: String,
    pub n_results: u32,
}

impl QueryRequest {
    pub fn new(question: impl Into<String>) -> Self {
        Self { question: question.into(), n_results: QUERY_RESULT_COUNT }
    }
}

/// Response body of `POST /query`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResponse {
    pub answer: String,
    #[serde(default)]
    pub sources: Vec<String>,
    #[serde(default = "default_true")]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
}

/// Response body of `POST /upload`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessResponse {
    pub success: bool,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub document_count: Option<u32>,
}

/// Response body of `DELETE /clear`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClearResponse {
    #[serde(default)]
    pub message: String,
    #[serde(default = "default_true")]
    pub success: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ComponentStatus {
    #[serde(default)]
    pub embeddings: bool,
    #[serde(default)]
    pub database: bool,
    #[serde(default)]
    pub llm: bool,
}

/// Response body of `GET /health`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    #[serde(default)]
    pub components: ComponentStatus,
    #[serde(default)]
    pub embedding_dimension: Option<u32>,
}

impl HealthStatus {
    pub fn is_ready(&self) -> bool {
        let c = &self.components;
        c.embeddings && c.database && c.llm
    }
}

/// Response body of `GET /documents/count`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentCount {
    pub count: u64,
    #[serde(default = "default_true")]
    pub success: bool,
}

fn default_true() -> bool {
    true
}
