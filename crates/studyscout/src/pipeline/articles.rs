//! Article candidate resolution via a search-grounded model call.
//!
//! The grounded call yields two things: the JSON candidate list the model
//! was asked for, and the citation sources the grounding machinery attaches
//! on the side. Either one may be empty; downstream validation decides what
//! to do with whatever survives. A hard failure here degrades to an empty
//! resolution instead of failing the run.

use serde::Deserialize;
use studyscout_core::{ArticleCandidate, Citation, GenerateRequest, GenerativeModel, GroundingSource};
use tracing::{debug, warn};

use crate::pipeline::scan;
use crate::retry::retry;

#[derive(Debug, Default)]
pub(crate) struct ArticleResolution {
    pub candidates: Vec<ArticleCandidate>,
    pub citations: Vec<Citation>,
}

fn article_prompt(queries: &[String]) -> String {
    format!(
        "Based on these queries: {}\n\nUsing your Google Search grounding, find 5-7 high-quality articles or blogs about this topic. Return ONLY a JSON array in this format:\n\n[\n  {{\n    \"title\": \"Article title\",\n    \"link\": \"Full URL\",\n    \"summary\": \"Brief 2-3 sentence summary\"\n  }}\n]\n\nReturn ONLY valid JSON, no additional text.",
        queries.join(", ")
    )
}

#[derive(Debug, Deserialize)]
struct ArticleCandidateWire {
    #[serde(default)]
    title: String,
    #[serde(default)]
    link: String,
    #[serde(default)]
    summary: String,
}

/// Scans the reply for a JSON array of candidates. Anything unparseable
/// yields an empty list, never an error.
pub(crate) fn parse_candidates(text: &str) -> Vec<ArticleCandidate> {
    let Some(raw) = scan::first_json_array(text) else {
        debug!("no JSON array in article reply");
        return Vec::new();
    };
    match serde_json::from_str::<Vec<ArticleCandidateWire>>(raw) {
        Ok(wire) => wire
            .into_iter()
            .map(|w| ArticleCandidate {
                title: w.title,
                link: w.link,
                summary: w.summary,
            })
            .collect(),
        Err(e) => {
            debug!(error = %e, "unparseable article candidate JSON");
            Vec::new()
        }
    }
}

/// Numbers the web-bearing grounding sources 1-based in reply order.
pub(crate) fn citations_from_sources(sources: &[GroundingSource]) -> Vec<Citation> {
    sources
        .iter()
        .enumerate()
        .map(|(i, source)| Citation {
            title: source
                .title
                .clone()
                .unwrap_or_else(|| "Untitled".to_string()),
            url: source.uri.clone().unwrap_or_default(),
            index: i + 1,
        })
        .collect()
}

pub(crate) async fn resolve(
    model: &dyn GenerativeModel,
    article_queries: &[String],
) -> ArticleResolution {
    let req = GenerateRequest {
        prompt: article_prompt(article_queries),
        search_grounding: true,
    };
    let reply = match retry(|| model.generate(&req)).await {
        Ok(reply) => reply,
        Err(e) => {
            warn!(error = %e, "article resolution failed, continuing without candidates");
            return ArticleResolution::default();
        }
    };
    ArticleResolution {
        candidates: parse_candidates(&reply.text),
        citations: citations_from_sources(&reply.sources),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use studyscout_core::{Error, GenerateReply, Result};

    struct FailingModel;

    #[async_trait::async_trait]
    impl GenerativeModel for FailingModel {
        async fn generate(&self, req: &GenerateRequest) -> Result<GenerateReply> {
            assert!(req.search_grounding, "article resolution must be grounded");
            Err(Error::Llm("backend down".to_string()))
        }
    }

    #[test]
    fn prompt_joins_queries_with_commas() {
        let prompt = article_prompt(&["rust async".to_string(), "tokio tutorial".to_string()]);
        assert!(prompt.starts_with("Based on these queries: rust async, tokio tutorial\n\n"));
        assert!(prompt.contains("JSON array"));
    }

    #[test]
    fn candidates_parse_from_prose_wrapped_array() {
        let text = "Here are some articles:\n[\n  {\"title\": \"T1\", \"link\": \"https://a.example/1\", \"summary\": \"S1\"},\n  {\"link\": \"https://a.example/2\"}\n]\nEnjoy.";
        let candidates = parse_candidates(text);
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].title, "T1");
        // Missing fields default to empty rather than dropping the batch.
        assert_eq!(candidates[1].title, "");
        assert_eq!(candidates[1].link, "https://a.example/2");
    }

    #[test]
    fn unparseable_replies_yield_no_candidates() {
        assert!(parse_candidates("I could not find anything.").is_empty());
        assert!(parse_candidates("[not json]").is_empty());
    }

    #[test]
    fn citations_number_sources_from_one_and_fill_gaps() {
        let sources = vec![
            GroundingSource {
                title: Some("Rust Book".to_string()),
                uri: Some("https://doc.rust-lang.org/book/".to_string()),
            },
            GroundingSource {
                title: None,
                uri: Some("https://blog.example/post".to_string()),
            },
        ];
        let citations = citations_from_sources(&sources);
        assert_eq!(citations.len(), 2);
        assert_eq!(citations[0].index, 1);
        assert_eq!(citations[0].title, "Rust Book");
        assert_eq!(citations[1].index, 2);
        assert_eq!(citations[1].title, "Untitled");
        assert_eq!(citations[1].url, "https://blog.example/post");
    }

    #[tokio::test]
    async fn hard_model_failure_degrades_to_an_empty_resolution() {
        let out = resolve(&FailingModel, &["q".to_string()]).await;
        assert!(out.candidates.is_empty());
        assert!(out.citations.is_empty());
    }
}
