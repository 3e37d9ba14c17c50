//! The resolution pipeline: topic in, resource bundle out.
//!
//! Stages run in a fixed order: query synthesis, video fan-out, intro
//! summary, grounded article resolution, article validation. Only query
//! synthesis is fatal; every other stage degrades to defaults or to an
//! empty section of the bundle.

mod articles;
mod queries;
mod scan;
mod validate;
mod videos;

use std::sync::Arc;

use studyscout_core::{
    ChatTurn, Error, GenerateRequest, GenerativeModel, PreviewBackend, ResourceBundle, Result,
    VideoSearchProvider,
};
use studyscout_local::gemini::GeminiClient;
use studyscout_local::preview::LocalPreviewFetcher;
use studyscout_local::youtube::YouTubeSearchProvider;
use tracing::{debug, info, warn};

use crate::retry::retry;

/// Intro shown when the summary call fails or comes back blank.
pub const DEFAULT_INTRO: &str =
    "Here are the best resources I found to help you learn about this topic.";

const MAX_VIDEOS: usize = 5;

pub struct Pipeline {
    model: Arc<dyn GenerativeModel>,
    videos: Arc<dyn VideoSearchProvider>,
    previews: Arc<dyn PreviewBackend>,
}

/// What one pipeline run produced: the bundle plus the verbatim synthesis
/// text the HTTP layer echoes back as the conversational message.
#[derive(Debug)]
pub struct PipelineOutcome {
    pub synthesis_text: String,
    pub bundle: ResourceBundle,
}

impl Pipeline {
    pub fn new(
        model: Arc<dyn GenerativeModel>,
        videos: Arc<dyn VideoSearchProvider>,
        previews: Arc<dyn PreviewBackend>,
    ) -> Self {
        Self {
            model,
            videos,
            previews,
        }
    }

    /// Wires the live adapters from the environment. Fails only when the
    /// model API key is absent.
    pub fn from_env(http: reqwest::Client) -> Result<Self> {
        let model = GeminiClient::from_env(http.clone())?;
        Ok(Self::new(
            Arc::new(model),
            Arc::new(YouTubeSearchProvider::new(http.clone())),
            Arc::new(LocalPreviewFetcher::new(http)),
        ))
    }

    pub async fn run(&self, message: &str, history: &[ChatTurn]) -> Result<PipelineOutcome> {
        if message.trim().is_empty() {
            return Err(Error::InvalidRequest("message must not be empty".to_string()));
        }
        debug!(history_turns = history.len(), "starting resource resolution");

        let synthesized = queries::synthesize(self.model.as_ref(), message).await?;
        info!(
            video_queries = synthesized.plan.video_queries.len(),
            article_queries = synthesized.plan.article_queries.len(),
            "search queries synthesized"
        );

        let mut videos =
            videos::resolve(Arc::clone(&self.videos), &synthesized.plan.video_queries).await;
        info!(count = videos.len(), "video search complete");

        let intro = self.intro_text(message).await;

        let resolution =
            articles::resolve(self.model.as_ref(), &synthesized.plan.article_queries).await;
        info!(
            candidates = resolution.candidates.len(),
            citations = resolution.citations.len(),
            "article candidates resolved"
        );

        let urls = effective_urls(&resolution);
        let mut articles = validate::resolve_articles(
            self.previews.as_ref(),
            &urls,
            &resolution.candidates,
            &resolution.citations,
        )
        .await;
        info!(count = articles.len(), "article validation complete");

        videos.truncate(MAX_VIDEOS);
        articles.truncate(validate::MAX_ARTICLES);

        Ok(PipelineOutcome {
            synthesis_text: synthesized.raw_text,
            bundle: ResourceBundle {
                intro,
                videos,
                articles,
            },
        })
    }

    async fn intro_text(&self, message: &str) -> String {
        let req = GenerateRequest {
            prompt: summary_prompt(message),
            search_grounding: true,
        };
        match retry(|| self.model.generate(&req)).await {
            Ok(reply) if !reply.text.trim().is_empty() => reply.text,
            Ok(_) => DEFAULT_INTRO.to_string(),
            Err(e) => {
                warn!(error = %e, "intro summary failed, using default");
                DEFAULT_INTRO.to_string()
            }
        }
    }
}

fn summary_prompt(message: &str) -> String {
    format!(
        "Provide a brief, informative 3-4 sentence summary about: {message}\n\nReturn ONLY the summary text, no additional formatting or explanation."
    )
}

/// URLs the validator should fetch: candidate links when the model produced
/// any, otherwise the citation URLs from grounding.
fn effective_urls(resolution: &articles::ArticleResolution) -> Vec<String> {
    if !resolution.candidates.is_empty() {
        resolution.candidates.iter().map(|c| c.link.clone()).collect()
    } else {
        resolution.citations.iter().map(|c| c.url.clone()).collect()
    }
}
