/// Fixed local address of the document-QA service.
pub const DEFAULT_API_BASE: &str = "http://localhost:8000";

const API_BASE_ENV: &str = "DOCQA_API_BASE_URL";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub api_base: String,
}

impl ClientConfig {
    pub fn new(api_base: impl Into<String>) -> Self {
        let api_base = api_base.into();
        Self { api_base: api_base.trim_end_matches('/').to_string() }
    }

    /// Reads `DOCQA_API_BASE_URL`, falling back to [`DEFAULT_API_BASE`].
    pub fn from_env() -> Self {
        Self::new(std::env::var(API_BASE_ENV).unwrap_or_else(|_| DEFAULT_API_BASE.to_string()))
    }

    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.api_base)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(DEFAULT_API_BASE)
    }
}
