//! Random slowdown middleware for testing
#![allow(dead_code)] // Feature-gated middleware

use axum::body::Body;
use axum::extract::Request;
use axum::middleware::Next;
use axum::response::IntoResponse;
use rand::Rng;
use std::time::Duration;

const MAX_SLOWDOWN_MS: u64 = 2000;

/// Delays every request by up to two seconds, to exercise client loading states.
pub async fn slowdown_request(request: Request<Body>, next: Next) -> impl IntoResponse {
    let delay_ms = rand::rng().random_range(0..=MAX_SLOWDOWN_MS);
    tokio::time::sleep(Duration::from_millis(delay_ms)).await;
    next.run(request).await
}
