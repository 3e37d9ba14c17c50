//! Article validation: preview fetches, the error-page classifier, and the
//! fallback ladder.

use studyscout_core::{ArticleCandidate, Citation, PreviewBackend, PreviewRequest, ValidatedArticle};
use tracing::{debug, warn};

pub(crate) const MAX_ARTICLES: usize = 5;
const PREVIEW_TIMEOUT_MS: u64 = 5_000;

const FALLBACK_TITLE: &str = "Untitled";
const FALLBACK_SUMMARY: &str = "Learn more about this article";

/// Phrases that mark a page title or description as a served error page.
/// Matched case-insensitively as substrings. Bare status digits never match
/// on their own, so an article ABOUT 404s is not rejected.
const ERROR_PHRASES: [&str; 8] = [
    "not found",
    "unsupported media type",
    "server error",
    "forbidden",
    "unauthorized",
    "bad gateway",
    "service unavailable",
    "gateway timeout",
];

fn has_error_pattern(text: &str) -> bool {
    let lower = text.to_ascii_lowercase();
    if let Some(rest) = lower.strip_prefix("error ") {
        let bytes = rest.as_bytes();
        if bytes.len() >= 3 && bytes[..3].iter().all(u8::is_ascii_digit) {
            return true;
        }
    }
    ERROR_PHRASES.iter().any(|phrase| lower.contains(phrase))
}

pub(crate) fn is_error_page(title: &str, summary: &str) -> bool {
    has_error_pattern(title) || has_error_pattern(summary)
}

#[derive(Debug, Clone, Copy)]
enum Tier {
    FetchedMetadata,
    FilteredCandidates,
    CitationStubs,
}

const LADDER: [Tier; 3] = [Tier::FetchedMetadata, Tier::FilteredCandidates, Tier::CitationStubs];

/// Walks the fallback ladder and returns the first tier that produces
/// anything: live page metadata, then pre-filtered candidates, then stubs
/// built from grounding citations. All tiers empty means no articles.
pub(crate) async fn resolve_articles(
    previews: &dyn PreviewBackend,
    urls: &[String],
    candidates: &[ArticleCandidate],
    citations: &[Citation],
) -> Vec<ValidatedArticle> {
    for tier in LADDER {
        let articles = match tier {
            Tier::FetchedMetadata => fetch_validated(previews, urls).await,
            Tier::FilteredCandidates => filtered_candidates(candidates),
            Tier::CitationStubs => citation_stubs(citations),
        };
        if !articles.is_empty() {
            debug!(tier = ?tier, count = articles.len(), "article tier selected");
            return articles;
        }
    }
    Vec::new()
}

/// Previews each URL in order and keeps pages that are not error pages.
/// Fetches are sequential; once the cap is reached the remaining URLs are
/// never fetched.
async fn fetch_validated(previews: &dyn PreviewBackend, urls: &[String]) -> Vec<ValidatedArticle> {
    let mut out = Vec::new();
    for url in urls {
        if let Some(article) = preview_article(previews, url).await {
            out.push(article);
        }
        if out.len() >= MAX_ARTICLES {
            break;
        }
    }
    out
}

async fn preview_article(previews: &dyn PreviewBackend, url: &str) -> Option<ValidatedArticle> {
    let req = PreviewRequest {
        url: url.to_string(),
        timeout_ms: PREVIEW_TIMEOUT_MS,
    };
    let preview = match previews.preview(&req).await {
        Ok(preview) => preview,
        Err(e) => {
            warn!(url, error = %e, "article preview failed, skipping");
            return None;
        }
    };
    let title = preview.title.unwrap_or_else(|| FALLBACK_TITLE.to_string());
    let summary = preview
        .description
        .unwrap_or_else(|| FALLBACK_SUMMARY.to_string());
    if is_error_page(&title, &summary) {
        debug!(url, title = %title, "error page rejected");
        return None;
    }
    Some(ValidatedArticle {
        title,
        link: url.to_string(),
        summary,
        image: preview.images.into_iter().next(),
    })
}

fn filtered_candidates(candidates: &[ArticleCandidate]) -> Vec<ValidatedArticle> {
    candidates
        .iter()
        .filter(|c| !c.title.is_empty() && !c.summary.is_empty())
        .filter(|c| !is_error_page(&c.title, &c.summary))
        .take(MAX_ARTICLES)
        .map(|c| ValidatedArticle {
            title: c.title.clone(),
            link: c.link.clone(),
            summary: c.summary.clone(),
            image: None,
        })
        .collect()
}

fn citation_stubs(citations: &[Citation]) -> Vec<ValidatedArticle> {
    citations
        .iter()
        .take(MAX_ARTICLES)
        .map(|c| ValidatedArticle {
            title: c.title.clone(),
            link: c.url.clone(),
            summary: format!("Learn more about {}", c.title),
            image: None,
        })
        .collect()
}
