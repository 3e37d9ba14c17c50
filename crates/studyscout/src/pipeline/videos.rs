//! Video resolution: bounded concurrent fan-out over the search provider.

use std::sync::Arc;

use studyscout_core::{VideoCandidate, VideoSearchProvider};
use tracing::warn;

pub(crate) const MAX_QUERIES: usize = 3;
pub(crate) const MAX_RESULTS_PER_QUERY: usize = 5;

/// Searches the first [`MAX_QUERIES`] queries concurrently and concatenates
/// the results in query order. Joining handles in spawn order keeps the
/// output deterministic no matter which search finishes first. A failed
/// query contributes nothing and never aborts the others.
pub(crate) async fn resolve(
    provider: Arc<dyn VideoSearchProvider>,
    queries: &[String],
) -> Vec<VideoCandidate> {
    let mut handles = Vec::new();
    for query in queries.iter().take(MAX_QUERIES) {
        let provider = Arc::clone(&provider);
        let query = query.clone();
        handles.push(tokio::spawn(async move {
            match provider.search(&query).await {
                Ok(mut videos) => {
                    videos.truncate(MAX_RESULTS_PER_QUERY);
                    videos
                }
                Err(e) => {
                    warn!(
                        provider = provider.name(),
                        query = %query,
                        error = %e,
                        "video search failed, skipping query"
                    );
                    Vec::new()
                }
            }
        }));
    }

    let mut out = Vec::new();
    for handle in handles {
        match handle.await {
            Ok(videos) => out.extend(videos),
            Err(e) => warn!(error = %e, "video search task failed"),
        }
    }
    out
}
