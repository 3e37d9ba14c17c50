use std::time::Duration;
use studyscout_core::{Error, Result};

pub mod gemini;
pub mod preview;
pub mod youtube;

/// Shared HTTP client for every upstream adapter.
///
/// The builder-level timeouts are outer bounds against DNS/TLS/body stalls;
/// per-request timeouts narrow them further.
pub fn http_client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent("studyscout/0.1")
        .redirect(reqwest::redirect::Policy::limited(10))
        .connect_timeout(Duration::from_secs(10))
        .timeout(Duration::from_secs(30))
        .build()
        .map_err(|e| Error::Fetch(e.to_string()))
}
