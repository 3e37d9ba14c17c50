use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("not configured: {0}")]
    NotConfigured(String),
    #[error("query synthesis failed: {0}")]
    QuerySynthesis(String),
    #[error("llm failed: {0}")]
    Llm(String),
    #[error("upstream overloaded: {0}")]
    Overloaded(String),
    #[error("search failed: {0}")]
    Search(String),
    #[error("fetch failed: {0}")]
    Fetch(String),
}

impl Error {
    /// True for the transient overload signal the backoff executor retries on.
    pub fn is_overloaded(&self) -> bool {
        matches!(self, Error::Overloaded(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// The two query lists derived from one user message. Built once per run,
/// immutable afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchQuerySet {
    pub video_queries: Vec<String>,
    pub article_queries: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoCandidate {
    pub title: String,
    pub link: String,
    pub summary: String,
}

/// An article the model proposed. Nothing about it has been verified yet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArticleCandidate {
    pub title: String,
    pub link: String,
    pub summary: String,
}

/// Web source reported alongside a grounded reply. `index` is 1-based and
/// ascending in source order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Citation {
    pub title: String,
    pub url: String,
    pub index: usize,
}

/// An article that passed validation. Fields reflect the metadata observed at
/// fetch time, or the candidate/citation fields when a fallback tier produced
/// it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidatedArticle {
    pub title: String,
    pub link: String,
    pub summary: String,
    pub image: Option<String>,
}

/// The assembled answer: intro text plus capped video and article lists.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceBundle {
    pub intro: String,
    pub videos: Vec<VideoCandidate>,
    pub articles: Vec<ValidatedArticle>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

/// One prior conversation turn. Accepted for context; the pipeline does not
/// currently condition on it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: Role,
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateRequest {
    pub prompt: String,
    /// If true, the model may consult web search and report its sources.
    pub search_grounding: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateReply {
    pub text: String,
    /// Sources the model consulted when grounding was on; empty otherwise.
    pub sources: Vec<GroundingSource>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroundingSource {
    pub title: Option<String>,
    pub uri: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreviewRequest {
    pub url: String,
    /// Timeout for the whole fetch (connect + body).
    pub timeout_ms: u64,
}

impl PreviewRequest {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Page metadata as observed by a preview fetch. Adapters normalize blank
/// strings to `None`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PagePreview {
    pub title: Option<String>,
    pub description: Option<String>,
    pub images: Vec<String>,
}

#[async_trait::async_trait]
pub trait GenerativeModel: Send + Sync {
    async fn generate(&self, req: &GenerateRequest) -> Result<GenerateReply>;
}

#[async_trait::async_trait]
pub trait VideoSearchProvider: Send + Sync {
    fn name(&self) -> &'static str;
    async fn search(&self, query: &str) -> Result<Vec<VideoCandidate>>;
}

#[async_trait::async_trait]
pub trait PreviewBackend: Send + Sync {
    async fn preview(&self, req: &PreviewRequest) -> Result<PagePreview>;
}
