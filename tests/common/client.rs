//! HTTP client for end-to-end tests
//!
//! Thin wrapper over reqwest with one method per endpoint. Responses are
//! returned raw so tests can assert on status codes and bodies.
//!
//! When API routes or request formats change, update only this file.

use super::constants::*;
use reqwest::Response;
use serde_json::Value;
use std::time::Duration;

pub struct TestClient {
    /// The underlying reqwest client (public for custom requests in tests)
    pub client: reqwest::Client,
    /// The base URL of the test server
    pub base_url: String,
}

impl TestClient {
    pub fn new(base_url: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .expect("Failed to build reqwest client");

        Self { client, base_url }
    }

    async fn get(&self, path: &str, query: &[(&str, &str)]) -> Response {
        self.client
            .get(format!("{}{}", self.base_url, path))
            .query(query)
            .send()
            .await
            .expect("GET request failed")
    }

    async fn post(&self, path: &str, body: &Value) -> Response {
        self.client
            .post(format!("{}{}", self.base_url, path))
            .json(body)
            .send()
            .await
            .expect("POST request failed")
    }

    /// GET /
    pub async fn get_stats(&self) -> Response {
        self.get("/", &[]).await
    }

    /// GET /api/music
    pub async fn list_music(
        &self,
        page: Option<&str>,
        limit: Option<&str>,
        sort: Option<&str>,
    ) -> Response {
        let query: Vec<(&str, &str)> = [("page", page), ("limit", limit), ("sort", sort)]
            .into_iter()
            .filter_map(|(key, value)| value.map(|v| (key, v)))
            .collect();
        self.get("/api/music", &query).await
    }

    /// GET /api/music/all
    pub async fn list_all_music(&self) -> Response {
        self.get("/api/music/all", &[]).await
    }

    /// POST /api/music
    pub async fn create_music(&self, body: Value) -> Response {
        self.post("/api/music", &body).await
    }

    /// POST /api/music with a body that is not JSON
    pub async fn create_music_raw(&self, body: &str) -> Response {
        self.client
            .post(format!("{}/api/music", self.base_url))
            .header("content-type", "application/json")
            .body(body.to_string())
            .send()
            .await
            .expect("POST request failed")
    }

    /// POST /api/music/bulk
    pub async fn bulk_create_music(&self, items: Value) -> Response {
        self.post("/api/music/bulk", &serde_json::json!({ "items": items }))
            .await
    }

    /// GET /api/music/search
    pub async fn search_music(&self, q: &str, sort: Option<&str>) -> Response {
        match sort {
            Some(sort) => self.get("/api/music/search", &[("q", q), ("sort", sort)]).await,
            None => self.get("/api/music/search", &[("q", q)]).await,
        }
    }

    /// GET /api/music/random
    pub async fn random_music(&self) -> Response {
        self.get("/api/music/random", &[]).await
    }
}
