//! HTTP client for the `/api/music` surface.

use crate::api_types::{BulkCreateRequest, ErrorResponse, MusicListResponse, RandomMusicResponse};
use crate::catalog_store::{MusicEntry, MusicPage, SortOrder};
use crate::feed::FeedSource;
use crate::importer::BulkSink;
use crate::service::{BulkItem, BulkSummary, CreateMusicRequest};
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use reqwest::Response;
use serde::de::DeserializeOwned;
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "http://localhost:3000/api";

pub struct MusicApiClient {
    client: reqwest::Client,
    base_url: String,
}

/// Turns a non-success response into an error carrying the server's message.
async fn parse_response<T: DeserializeOwned>(response: Response, what: &str) -> Result<T> {
    let status = response.status();
    if !status.is_success() {
        let message = match response.json::<ErrorResponse>().await {
            Ok(ErrorResponse {
                error,
                details: Some(details),
            }) => format!("{}: {}", error, details),
            Ok(ErrorResponse { error, .. }) => error,
            Err(_) => "no error body".to_string(),
        };
        bail!("Failed to {}: status {} ({})", what, status, message);
    }
    response
        .json()
        .await
        .with_context(|| format!("Failed to parse response to {}", what))
}

impl MusicApiClient {
    /// # Arguments
    /// * `base_url` - Base URL of the API, including the `/api` prefix
    /// * `timeout_sec` - Request timeout in seconds
    pub fn new(base_url: &str, timeout_sec: u64) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_sec))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
        what: &str,
    ) -> Result<T> {
        let response = self
            .client
            .get(format!("{}{}", self.base_url, path))
            .query(query)
            .send()
            .await
            .with_context(|| format!("Failed to reach music API to {}", what))?;
        parse_response(response, what).await
    }

    pub async fn list_page(&self, page: usize, limit: usize, sort: SortOrder) -> Result<MusicPage> {
        self.get(
            "/music",
            &[
                ("page", page.to_string()),
                ("limit", limit.to_string()),
                ("sort", sort.as_query().to_string()),
            ],
            "list music",
        )
        .await
    }

    pub async fn list_all(&self) -> Result<Vec<MusicEntry>> {
        let body: MusicListResponse = self.get("/music/all", &[], "list all music").await?;
        Ok(body.music)
    }

    pub async fn search(&self, query: &str, sort: SortOrder) -> Result<Vec<MusicEntry>> {
        let body: MusicListResponse = self
            .get(
                "/music/search",
                &[
                    ("q", query.to_string()),
                    ("sort", sort.as_query().to_string()),
                ],
                "search music",
            )
            .await?;
        Ok(body.music)
    }

    pub async fn random_one(&self) -> Result<Option<MusicEntry>> {
        let body: RandomMusicResponse = self.get("/music/random", &[], "pick random music").await?;
        Ok(body.music)
    }

    pub async fn create(&self, request: &CreateMusicRequest) -> Result<MusicEntry> {
        let response = self
            .client
            .post(format!("{}/music", self.base_url))
            .json(request)
            .send()
            .await
            .context("Failed to reach music API to save music")?;
        parse_response(response, "save music").await
    }

    pub async fn bulk_create(&self, items: Vec<BulkItem>) -> Result<BulkSummary> {
        let response = self
            .client
            .post(format!("{}/music/bulk", self.base_url))
            .json(&BulkCreateRequest { items })
            .send()
            .await
            .context("Failed to reach music API to bulk import")?;
        parse_response(response, "bulk import").await
    }
}

#[async_trait]
impl FeedSource for MusicApiClient {
    async fn list_page(&self, page: usize, limit: usize, sort: SortOrder) -> Result<MusicPage> {
        MusicApiClient::list_page(self, page, limit, sort).await
    }

    async fn list_all(&self) -> Result<Vec<MusicEntry>> {
        MusicApiClient::list_all(self).await
    }

    async fn search(&self, query: &str, sort: SortOrder) -> Result<Vec<MusicEntry>> {
        MusicApiClient::search(self, query, sort).await
    }

    async fn create(&self, request: CreateMusicRequest) -> Result<MusicEntry> {
        MusicApiClient::create(self, &request).await
    }

    async fn random_one(&self) -> Result<Option<MusicEntry>> {
        MusicApiClient::random_one(self).await
    }
}

#[async_trait]
impl BulkSink for MusicApiClient {
    async fn bulk_create(&self, items: Vec<BulkItem>) -> Result<BulkSummary> {
        MusicApiClient::bulk_create(self, items).await
    }
}
