//! YouTube results-page search backend.
//!
//! There is no key-free search API, so this walks the `ytInitialData` payload
//! embedded in the public results page. The page is third-party markup that
//! changes without notice; a shape we do not recognize degrades to an empty
//! result list rather than an error.

use serde_json::Value;
use studyscout_core::{Error, Result, VideoCandidate, VideoSearchProvider};

const MAX_RESULTS: usize = 5;

// Unknown clients get a minimal page shell; a desktop browser UA gets the
// variant that embeds ytInitialData.
const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

fn env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn youtube_endpoint_from_env() -> String {
    env("STUDYSCOUT_YOUTUBE_ENDPOINT").unwrap_or_else(|| "https://www.youtube.com/results".to_string())
}

pub fn youtube_timeout_ms_from_env() -> u64 {
    env("STUDYSCOUT_YOUTUBE_TIMEOUT_MS")
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or(20_000)
        .clamp(1_000, 60_000)
}

#[derive(Debug, Clone)]
pub struct YouTubeSearchProvider {
    client: reqwest::Client,
}

impl YouTubeSearchProvider {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

/// Slice out the `var ytInitialData = {...};` payload: first `{` after the
/// marker through the first `};`.
pub(crate) fn initial_data_json(html: &str) -> Option<&str> {
    let marker = html.find("var ytInitialData")?;
    let rest = &html[marker..];
    let open = rest.find('{')?;
    let body = &rest[open..];
    let close = body.find("};")?;
    Some(&body[..=close])
}

fn first_run_text(node: &Value) -> Option<String> {
    node.get("runs")?
        .get(0)?
        .get("text")?
        .as_str()
        .map(|s| s.to_string())
}

fn videos_from_initial_data(data: &Value) -> Vec<VideoCandidate> {
    let mut out = Vec::new();
    let Some(sections) = data
        .pointer("/contents/twoColumnSearchResultsRenderer/primaryContents/sectionListRenderer/contents")
        .and_then(Value::as_array)
    else {
        return out;
    };

    'sections: for section in sections {
        let Some(items) = section
            .pointer("/itemSectionRenderer/contents")
            .and_then(Value::as_array)
        else {
            continue;
        };
        for item in items {
            // Shelves, ads and promos sit between results; only videoRenderer
            // entries are real hits.
            let Some(renderer) = item.get("videoRenderer") else {
                continue;
            };
            let Some(video_id) = renderer
                .get("videoId")
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
            else {
                continue;
            };
            let Some(title) = renderer
                .get("title")
                .and_then(first_run_text)
                .filter(|s| !s.is_empty())
            else {
                continue;
            };
            let channel = renderer
                .get("ownerText")
                .and_then(first_run_text)
                .unwrap_or_default();
            let summary = renderer
                .get("descriptionSnippet")
                .and_then(first_run_text)
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| format!("Learn from {channel} - {title}"));

            out.push(VideoCandidate {
                title,
                link: format!("https://www.youtube.com/watch?v={video_id}"),
                summary,
            });
            if out.len() >= MAX_RESULTS {
                break 'sections;
            }
        }
    }
    out
}

#[async_trait::async_trait]
impl VideoSearchProvider for YouTubeSearchProvider {
    fn name(&self) -> &'static str {
        "youtube"
    }

    async fn search(&self, query: &str) -> Result<Vec<VideoCandidate>> {
        let timeout_ms = youtube_timeout_ms_from_env();
        let resp = self
            .client
            .get(youtube_endpoint_from_env())
            .query(&[("search_query", query)])
            .header(reqwest::header::USER_AGENT, BROWSER_USER_AGENT)
            .timeout(std::time::Duration::from_millis(timeout_ms))
            .send()
            .await
            .map_err(|e| Error::Search(e.to_string()))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(Error::Search(format!("youtube search HTTP {status}")));
        }
        let html = resp.text().await.map_err(|e| Error::Search(e.to_string()))?;

        let Some(raw) = initial_data_json(&html) else {
            return Ok(Vec::new());
        };
        let data: Value = match serde_json::from_str(raw) {
            Ok(v) => v,
            Err(_) => return Ok(Vec::new()),
        };
        Ok(videos_from_initial_data(&data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{routing::get, Router};
    use proptest::prelude::*;
    use std::net::SocketAddr;
    use std::sync::Mutex;

    // Env vars are process-global; serialize tests that mutate them.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    struct EnvGuard {
        k: &'static str,
        prev: Option<String>,
    }

    impl EnvGuard {
        fn set(k: &'static str, v: &str) -> Self {
            let prev = std::env::var(k).ok();
            std::env::set_var(k, v);
            Self { k, prev }
        }
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            if let Some(v) = self.prev.take() {
                std::env::set_var(self.k, v);
            } else {
                std::env::remove_var(self.k);
            }
        }
    }

    fn video_item(id: &str, title: &str, description: Option<&str>, channel: &str) -> Value {
        let mut renderer = serde_json::json!({
            "videoId": id,
            "title": { "runs": [ { "text": title } ] },
            "ownerText": { "runs": [ { "text": channel } ] },
        });
        if let Some(d) = description {
            renderer["descriptionSnippet"] = serde_json::json!({ "runs": [ { "text": d } ] });
        }
        serde_json::json!({ "videoRenderer": renderer })
    }

    fn results_page(items: Vec<Value>) -> String {
        let data = serde_json::json!({
            "contents": {
                "twoColumnSearchResultsRenderer": {
                    "primaryContents": {
                        "sectionListRenderer": {
                            "contents": [ { "itemSectionRenderer": { "contents": items } } ]
                        }
                    }
                }
            }
        });
        format!("<html><body><script>var ytInitialData = {data};</script></body></html>")
    }

    #[test]
    fn initial_data_scan_finds_payload_and_stops_at_terminator() {
        let html = r#"<script>var ytInitialData = {"a": 1};</script><script>var other = {"b": 2};</script>"#;
        assert_eq!(initial_data_json(html), Some(r#"{"a": 1}"#));
        assert_eq!(initial_data_json("<html>no payload here</html>"), None);
        assert_eq!(initial_data_json("var ytInitialData = oops;"), None);
    }

    #[test]
    fn walk_maps_renderers_and_falls_back_on_missing_description() {
        let page = results_page(vec![
            video_item("abc123", "Intro to Rust", Some("A full course."), "RustConf"),
            video_item("def456", "Ownership Explained", None, "The Channel"),
            serde_json::json!({ "shelfRenderer": { "title": "People also watched" } }),
            serde_json::json!({ "videoRenderer": { "videoId": "", "title": { "runs": [ { "text": "dropped" } ] } } }),
        ]);
        let raw = initial_data_json(&page).unwrap();
        let data: Value = serde_json::from_str(raw).unwrap();
        let videos = videos_from_initial_data(&data);

        assert_eq!(videos.len(), 2);
        assert_eq!(videos[0].title, "Intro to Rust");
        assert_eq!(videos[0].link, "https://www.youtube.com/watch?v=abc123");
        assert_eq!(videos[0].summary, "A full course.");
        assert_eq!(
            videos[1].summary,
            "Learn from The Channel - Ownership Explained"
        );
    }

    #[test]
    fn walk_caps_results_at_five() {
        let items = (0..8)
            .map(|i| video_item(&format!("id{i}"), &format!("Video {i}"), None, "c"))
            .collect();
        let page = results_page(items);
        let raw = initial_data_json(&page).unwrap();
        let data: Value = serde_json::from_str(raw).unwrap();
        assert_eq!(videos_from_initial_data(&data).len(), 5);
    }

    #[test]
    fn unrecognized_shape_yields_empty() {
        let data: Value = serde_json::from_str(r#"{"contents": {}}"#).unwrap();
        assert!(videos_from_initial_data(&data).is_empty());
    }

    #[tokio::test]
    #[allow(clippy::await_holding_lock)]
    async fn searches_against_fixture_endpoint() {
        let _lock = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());

        let page = results_page(vec![
            video_item("fix01", "Fixture Video", Some("desc"), "chan"),
            video_item("fix02", "Other Video", None, "chan"),
        ]);
        let app = Router::new().route(
            "/results",
            get(move || {
                let page = page.clone();
                async move { axum::response::Html(page) }
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr: SocketAddr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let _g = EnvGuard::set(
            "STUDYSCOUT_YOUTUBE_ENDPOINT",
            &format!("http://{addr}/results"),
        );
        let provider = YouTubeSearchProvider::new(reqwest::Client::new());
        let videos = provider.search("rust tutorial").await.unwrap();
        assert_eq!(videos.len(), 2);
        assert_eq!(videos[0].link, "https://www.youtube.com/watch?v=fix01");
    }

    #[tokio::test]
    #[allow(clippy::await_holding_lock)]
    async fn http_failure_is_a_search_error() {
        let _lock = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());

        let app = Router::new().route(
            "/results",
            get(|| async { axum::http::StatusCode::INTERNAL_SERVER_ERROR }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr: SocketAddr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let _g = EnvGuard::set(
            "STUDYSCOUT_YOUTUBE_ENDPOINT",
            &format!("http://{addr}/results"),
        );
        let provider = YouTubeSearchProvider::new(reqwest::Client::new());
        let err = provider.search("anything").await.unwrap_err();
        assert!(matches!(err, Error::Search(_)));
    }

    #[tokio::test]
    #[allow(clippy::await_holding_lock)]
    async fn page_without_payload_yields_empty() {
        let _lock = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());

        let app = Router::new().route(
            "/results",
            get(|| async { axum::response::Html("<html><body>consent wall</body></html>") }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr: SocketAddr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let _g = EnvGuard::set(
            "STUDYSCOUT_YOUTUBE_ENDPOINT",
            &format!("http://{addr}/results"),
        );
        let provider = YouTubeSearchProvider::new(reqwest::Client::new());
        assert!(provider.search("anything").await.unwrap().is_empty());
    }

    proptest! {
        #[test]
        fn initial_data_scan_never_panics(s in ".*") {
            let _ = initial_data_json(&s);
        }
    }
}
