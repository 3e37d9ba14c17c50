//! Page-preview fetcher: bounded download plus metadata extraction.
//!
//! Error pages are not errors here. A 404 still parses to a preview whose
//! title says so; deciding what that means is the caller's job. Only
//! transport failures (timeout, DNS, TLS) surface as `Error::Fetch`.

use futures_util::StreamExt;
use html_scraper::{Html, Selector};
use studyscout_core::{Error, PagePreview, PreviewBackend, PreviewRequest, Result};

/// Hard cap on bytes read from a page body; the metadata lives in `<head>`.
const MAX_PREVIEW_BYTES: usize = 512 * 1024;

#[derive(Debug, Clone)]
pub struct LocalPreviewFetcher {
    client: reqwest::Client,
}

impl LocalPreviewFetcher {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

fn non_blank(s: String) -> Option<String> {
    let t = s.trim();
    if t.is_empty() {
        None
    } else {
        Some(t.to_string())
    }
}

fn meta_content(doc: &Html, selector: &str) -> Option<String> {
    let sel = Selector::parse(selector).ok()?;
    doc.select(&sel)
        .find_map(|el| el.value().attr("content").map(|s| s.to_string()))
        .and_then(non_blank)
}

fn title_text(doc: &Html) -> Option<String> {
    let sel = Selector::parse("title").ok()?;
    doc.select(&sel)
        .next()
        .map(|el| el.text().collect::<String>())
        .and_then(non_blank)
}

pub(crate) fn parse_preview(html: &str, base: &url::Url) -> PagePreview {
    let doc = Html::parse_document(html);

    let title = meta_content(&doc, "meta[property='og:title']").or_else(|| title_text(&doc));
    let description = meta_content(&doc, "meta[name='description']")
        .or_else(|| meta_content(&doc, "meta[property='og:description']"));

    // Image URLs are frequently relative; resolve against the final
    // (post-redirect) URL so callers get something fetchable.
    let mut images = Vec::new();
    for selector in ["meta[property='og:image']", "meta[name='twitter:image']"] {
        let Ok(sel) = Selector::parse(selector) else {
            continue;
        };
        for el in doc.select(&sel) {
            let Some(content) = el.value().attr("content").map(str::trim) else {
                continue;
            };
            if content.is_empty() {
                continue;
            }
            let Ok(abs) = base.join(content) else {
                continue;
            };
            let abs = abs.to_string();
            if !images.contains(&abs) {
                images.push(abs);
            }
        }
    }

    PagePreview {
        title,
        description,
        images,
    }
}

#[async_trait::async_trait]
impl PreviewBackend for LocalPreviewFetcher {
    async fn preview(&self, req: &PreviewRequest) -> Result<PagePreview> {
        let url =
            url::Url::parse(&req.url).map_err(|e| Error::Fetch(format!("invalid url: {e}")))?;
        let resp = self
            .client
            .get(url)
            .timeout(req.timeout())
            .send()
            .await
            .map_err(|e| Error::Fetch(e.to_string()))?;
        let final_url = resp.url().clone();

        let mut bytes: Vec<u8> = Vec::new();
        let mut stream = resp.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| Error::Fetch(e.to_string()))?;
            if bytes.len().saturating_add(chunk.len()) > MAX_PREVIEW_BYTES {
                let can_take = MAX_PREVIEW_BYTES.saturating_sub(bytes.len());
                bytes.extend_from_slice(&chunk[..can_take]);
                break;
            }
            bytes.extend_from_slice(&chunk);
        }

        let html = String::from_utf8_lossy(&bytes);
        Ok(parse_preview(&html, &final_url))
    }
}
