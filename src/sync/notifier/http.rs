//! `HttpPoster` — the injected collaborator that does the actual network
//! call for the Notifier's webhook POSTs. The dispatcher talks to this trait
//! instead of `reqwest` directly, so tests can swap in a recording fake.

use async_trait::async_trait;
use serde_json::Value;

/// Any failure posting to a webhook URL. Always logged and swallowed by the
/// dispatcher — never propagated, so one bad URL can't stall delivery to
/// the others.
#[derive(Debug, thiserror::Error)]
#[error("webhook post to {url} failed: {message}")]
pub struct PostError {
    pub url: String,
    pub message: String,
}

#[async_trait(?Send)]
pub trait HttpPoster {
    async fn post_json(&self, url: &str, body: Value) -> Result<(), PostError>;
}

/// The production `HttpPoster`, a thin wrapper over `reqwest`.
pub struct ReqwestPoster {
    client: reqwest::Client,
}

impl ReqwestPoster {
    pub fn new() -> Self {
        Self { client: reqwest::Client::new() }
    }
}

impl Default for ReqwestPoster {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait(?Send)]
impl HttpPoster for ReqwestPoster {
    async fn post_json(&self, url: &str, body: Value) -> Result<(), PostError> {
        let response = self
            .client
            .post(url)
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|err| PostError { url: url.to_string(), message: err.to_string() })?;

        response
            .error_for_status()
            .map_err(|err| PostError { url: url.to_string(), message: err.to_string() })?;
        Ok(())
    }
}
