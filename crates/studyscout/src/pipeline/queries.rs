//! Search-query synthesis.
//!
//! One model call turns the learner's topic into a video query list and an
//! article query list. This is the only step the pipeline cannot degrade
//! around: without queries there is nothing downstream to resolve.

use serde::Deserialize;
use studyscout_core::{Error, GenerateRequest, GenerativeModel, Result, SearchQuerySet};
use tracing::debug;

use crate::pipeline::scan;
use crate::retry::retry;

/// A parsed query plan plus the verbatim model text it was scanned from.
#[derive(Debug)]
pub(crate) struct SynthesizedQueries {
    pub plan: SearchQuerySet,
    pub raw_text: String,
}

fn query_prompt(message: &str) -> String {
    format!(
        "{message}\n\nGenerate ONLY search queries in the following JSON format:\n\n{{\n  \"youtubeQueries\": [\"search query 1\", \"search query 2\", \"search query 3\"],\n  \"articleQueries\": [\"search query 1\", \"search query 2\", \"search query 3\"]\n}}\n\nGenerate 3-5 YouTube search queries and 3-5 article/blog search queries. Return ONLY valid JSON, no other text."
    )
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QueryPlanWire {
    #[serde(default)]
    youtube_queries: Vec<String>,
    #[serde(default)]
    article_queries: Vec<String>,
}

pub(crate) fn parse_query_plan(text: &str) -> Result<SearchQuerySet> {
    let raw = scan::first_json_object(text)
        .ok_or_else(|| Error::QuerySynthesis("no JSON object in model output".to_string()))?;
    let wire: QueryPlanWire = serde_json::from_str(raw)
        .map_err(|e| Error::QuerySynthesis(format!("unparseable query JSON: {e}")))?;
    if wire.youtube_queries.is_empty() || wire.article_queries.is_empty() {
        return Err(Error::QuerySynthesis(
            "model output is missing video or article queries".to_string(),
        ));
    }
    Ok(SearchQuerySet {
        video_queries: wire.youtube_queries,
        article_queries: wire.article_queries,
    })
}

pub(crate) async fn synthesize(
    model: &dyn GenerativeModel,
    message: &str,
) -> Result<SynthesizedQueries> {
    let req = GenerateRequest {
        prompt: query_prompt(message),
        search_grounding: false,
    };
    let reply = retry(|| model.generate(&req)).await?;
    debug!(chars = reply.text.len(), "query synthesis reply received");
    let plan = parse_query_plan(&reply.text)?;
    Ok(SynthesizedQueries {
        plan,
        raw_text: reply.text,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use studyscout_core::GenerateReply;

    struct CannedModel(&'static str);

    #[async_trait::async_trait]
    impl GenerativeModel for CannedModel {
        async fn generate(&self, req: &GenerateRequest) -> Result<GenerateReply> {
            assert!(!req.search_grounding, "query synthesis must not be grounded");
            Ok(GenerateReply {
                text: self.0.to_string(),
                sources: Vec::new(),
            })
        }
    }

    #[test]
    fn prompt_leads_with_the_topic_and_names_both_lists() {
        let prompt = query_prompt("intro to sourdough baking");
        assert!(prompt.starts_with("intro to sourdough baking\n\n"));
        assert!(prompt.contains("youtubeQueries"));
        assert!(prompt.contains("articleQueries"));
    }

    #[test]
    fn plan_parses_from_prose_wrapped_json() {
        let text = "Sure, here you go:\n{\"youtubeQueries\": [\"a\", \"b\"], \"articleQueries\": [\"c\"]}\nEnjoy!";
        let plan = parse_query_plan(text).unwrap();
        assert_eq!(plan.video_queries, vec!["a", "b"]);
        assert_eq!(plan.article_queries, vec!["c"]);
    }

    #[test]
    fn missing_json_is_a_synthesis_error() {
        let err = parse_query_plan("I cannot help with that.").unwrap_err();
        assert!(matches!(err, Error::QuerySynthesis(_)));
    }

    #[test]
    fn malformed_json_is_a_synthesis_error() {
        let err = parse_query_plan("{\"youtubeQueries\": [oops]}").unwrap_err();
        assert!(matches!(err, Error::QuerySynthesis(_)));
    }

    #[test]
    fn empty_query_lists_are_a_synthesis_error() {
        let err =
            parse_query_plan("{\"youtubeQueries\": [], \"articleQueries\": [\"c\"]}").unwrap_err();
        assert!(matches!(err, Error::QuerySynthesis(_)));

        let err = parse_query_plan("{\"youtubeQueries\": [\"a\"]}").unwrap_err();
        assert!(matches!(err, Error::QuerySynthesis(_)));
    }

    #[tokio::test]
    async fn synthesize_keeps_the_raw_reply_text() {
        let model =
            CannedModel("{\"youtubeQueries\": [\"a\"], \"articleQueries\": [\"b\"]}");
        let out = synthesize(&model, "topic").await.unwrap();
        assert_eq!(out.plan.video_queries, vec!["a"]);
        assert_eq!(out.raw_text, model.0);
    }
}
