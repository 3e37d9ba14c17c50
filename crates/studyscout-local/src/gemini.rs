//! Gemini text backend (Generative Language API).
//!
//! One adapter covers both call shapes the pipeline needs: plain text
//! generation, and search-grounded generation where the model may consult web
//! search and report its sources. Endpoint, model and timeout are
//! env-overridable so tests can point at a local fixture server.

use serde::{Deserialize, Serialize};
use studyscout_core::{
    Error, GenerateReply, GenerateRequest, GenerativeModel, GroundingSource, Result,
};

fn env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

pub fn gemini_api_key_from_env() -> Option<String> {
    env("STUDYSCOUT_GEMINI_API_KEY").or_else(|| env("GEMINI_API_KEY"))
}

pub fn gemini_model_from_env() -> String {
    env("STUDYSCOUT_GEMINI_MODEL").unwrap_or_else(|| "gemini-2.5-flash".to_string())
}

pub fn gemini_timeout_ms_from_env() -> u64 {
    // Model calls can hang without an explicit timeout. Keep a conservative
    // cap even if callers pass something huge.
    env("STUDYSCOUT_GEMINI_TIMEOUT_MS")
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or(30_000)
        .clamp(1_000, 120_000)
}

fn gemini_base_url_from_env() -> String {
    env("STUDYSCOUT_GEMINI_BASE_URL")
        .unwrap_or_else(|| "https://generativelanguage.googleapis.com".to_string())
}

#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: reqwest::Client,
    api_key: String,
    model: String,
}

impl GeminiClient {
    pub fn from_env(client: reqwest::Client) -> Result<Self> {
        let api_key = gemini_api_key_from_env().ok_or_else(|| {
            Error::NotConfigured("missing STUDYSCOUT_GEMINI_API_KEY (or GEMINI_API_KEY)".to_string())
        })?;
        Ok(Self {
            client,
            api_key,
            model: gemini_model_from_env(),
        })
    }

    fn endpoint(&self) -> String {
        // Key-in-query like the API samples. Proxying goes through
        // STUDYSCOUT_GEMINI_BASE_URL.
        let base = gemini_base_url_from_env();
        format!(
            "{base}/v1beta/models/{model}:generateContent?key={key}",
            base = base.trim_end_matches('/'),
            model = self.model,
            key = self.api_key,
        )
    }
}

#[derive(Debug, Serialize)]
struct GenerateContentRequest {
    contents: Vec<ReqContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<Tool>>,
}

#[derive(Debug, Serialize)]
struct ReqContent {
    parts: Vec<ReqPart>,
}

#[derive(Debug, Serialize)]
struct ReqPart {
    text: String,
}

#[derive(Debug, Serialize)]
struct Tool {
    google_search: GoogleSearch,
}

#[derive(Debug, Serialize)]
struct GoogleSearch {}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
    #[serde(rename = "groundingMetadata", default)]
    grounding_metadata: Option<GroundingMetadata>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GroundingMetadata {
    #[serde(rename = "groundingChunks", default)]
    grounding_chunks: Vec<GroundingChunk>,
}

#[derive(Debug, Deserialize)]
struct GroundingChunk {
    #[serde(default)]
    web: Option<WebSource>,
}

#[derive(Debug, Deserialize)]
struct WebSource {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    uri: Option<String>,
}

fn non_blank(s: String) -> Option<String> {
    let t = s.trim();
    if t.is_empty() {
        None
    } else {
        Some(t.to_string())
    }
}

fn reply_from_response(parsed: GenerateContentResponse) -> GenerateReply {
    let Some(first) = parsed.candidates.into_iter().next() else {
        return GenerateReply {
            text: String::new(),
            sources: Vec::new(),
        };
    };

    // candidates[0].content.parts[*].text joined with newlines.
    let mut text = String::new();
    if let Some(content) = first.content {
        for part in content.parts {
            let Some(t) = part.text else { continue };
            if !text.is_empty() {
                text.push('\n');
            }
            text.push_str(&t);
        }
    }

    // Only chunks that carry web data become sources; blanks normalize to None.
    let sources = first
        .grounding_metadata
        .map(|meta| {
            meta.grounding_chunks
                .into_iter()
                .filter_map(|chunk| chunk.web)
                .map(|web| GroundingSource {
                    title: web.title.and_then(non_blank),
                    uri: web.uri.and_then(non_blank),
                })
                .collect()
        })
        .unwrap_or_default();

    GenerateReply { text, sources }
}

#[async_trait::async_trait]
impl GenerativeModel for GeminiClient {
    async fn generate(&self, req: &GenerateRequest) -> Result<GenerateReply> {
        let timeout_ms = gemini_timeout_ms_from_env();
        let body = GenerateContentRequest {
            contents: vec![ReqContent {
                parts: vec![ReqPart {
                    text: req.prompt.clone(),
                }],
            }],
            tools: req.search_grounding.then(|| {
                vec![Tool {
                    google_search: GoogleSearch {},
                }]
            }),
        };

        let resp = self
            .client
            .post(self.endpoint())
            .timeout(std::time::Duration::from_millis(timeout_ms))
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::Llm(e.to_string()))?;
        let status = resp.status();
        if status == reqwest::StatusCode::SERVICE_UNAVAILABLE {
            return Err(Error::Overloaded(format!(
                "gemini generateContent HTTP {status}"
            )));
        }
        if !status.is_success() {
            return Err(Error::Llm(format!("gemini generateContent HTTP {status}")));
        }

        let parsed: GenerateContentResponse =
            resp.json().await.map_err(|e| Error::Llm(e.to_string()))?;
        Ok(reply_from_response(parsed))
    }
}
