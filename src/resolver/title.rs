//! Title lookup through oEmbed-style endpoints.

use super::provider::Provider;
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

pub const NOEMBED_ENDPOINT: &str = "https://noembed.com/embed";
pub const SPOTIFY_OEMBED_ENDPOINT: &str = "https://open.spotify.com/oembed";

/// Resolves a display title for a shared URL.
///
/// Implementations never fail: `None` means the caller has to ask the user.
#[async_trait]
pub trait TitleResolver: Send + Sync {
    async fn resolve_title(&self, url: &str) -> Option<String>;
}

/// Subset of an oEmbed response. noembed answers 200 with an `error` field
/// for URLs it does not know.
#[derive(Debug, Deserialize)]
struct OEmbedResponse {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

pub struct OEmbedTitleResolver {
    client: reqwest::Client,
    youtube_endpoint: String,
    spotify_endpoint: String,
}

impl OEmbedTitleResolver {
    pub fn new(timeout_sec: u64) -> Result<Self> {
        Self::with_endpoints(NOEMBED_ENDPOINT, SPOTIFY_OEMBED_ENDPOINT, timeout_sec)
    }

    pub fn with_endpoints(
        youtube_endpoint: &str,
        spotify_endpoint: &str,
        timeout_sec: u64,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_sec))
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self {
            client,
            youtube_endpoint: youtube_endpoint.trim_end_matches('/').to_string(),
            spotify_endpoint: spotify_endpoint.trim_end_matches('/').to_string(),
        })
    }

    async fn fetch_title(&self, endpoint: &str, url: &str) -> Result<String> {
        let request_url = format!("{}?url={}", endpoint, urlencoding::encode(url));
        let response = self
            .client
            .get(&request_url)
            .send()
            .await
            .context("Failed to reach oEmbed endpoint")?;

        if !response.status().is_success() {
            bail!("oEmbed lookup for {} failed: status {}", url, response.status());
        }

        let body: OEmbedResponse = response
            .json()
            .await
            .context("Failed to parse oEmbed response")?;
        if let Some(error) = body.error {
            bail!("oEmbed lookup for {} failed: {}", url, error);
        }
        match body.title.map(|t| t.trim().to_string()) {
            Some(title) if !title.is_empty() => Ok(title),
            _ => bail!("oEmbed response for {} has no title", url),
        }
    }
}

#[async_trait]
impl TitleResolver for OEmbedTitleResolver {
    async fn resolve_title(&self, url: &str) -> Option<String> {
        let endpoint = match Provider::classify(url) {
            Provider::YouTube => &self.youtube_endpoint,
            Provider::Spotify => &self.spotify_endpoint,
            Provider::Unknown => {
                debug!("No title provider for {}", url);
                return None;
            }
        };

        match self.fetch_title(endpoint, url).await {
            Ok(title) => Some(title),
            Err(err) => {
                warn!("Title resolution failed: {:#}", err);
                None
            }
        }
    }
}
