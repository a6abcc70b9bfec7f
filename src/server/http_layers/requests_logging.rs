//! Request logging middleware

use super::super::state::ServerState;
use axum::extract::State;
use axum::{
    body::Body,
    http::{header::CONTENT_LENGTH, HeaderMap, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::time::Instant;
use tracing::{error, info};

/// How much of each request and response gets logged. Every level includes
/// the ones before it.
#[derive(PartialEq, PartialOrd, Clone, Debug, Default, clap::ValueEnum)]
pub enum RequestsLoggingLevel {
    None,
    #[default]
    Path,
    Headers,
    Body,
}

impl std::fmt::Display for RequestsLoggingLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

const MAX_LOGGABLE_BODY_LENGTH: usize = 1024;

fn content_length(headers: &HeaderMap) -> Result<usize, &'static str> {
    headers
        .get(CONTENT_LENGTH)
        .ok_or("no content-length")?
        .to_str()
        .map_err(|_| "unreadable content-length")?
        .parse()
        .map_err(|_| "non-numeric content-length")
}

fn log_headers(label: &str, headers: &HeaderMap) {
    info!("  {} headers:", label);
    for (name, value) in headers {
        info!("    {}: {:?}", name, value);
    }
}

/// Buffers a small body so it can be logged, then hands it on unchanged.
async fn log_body(label: &str, headers: &HeaderMap, body: Body) -> Result<Body, axum::Error> {
    match content_length(headers) {
        Err(reason) => {
            info!("  {} body not logged: {}", label, reason);
            Ok(body)
        }
        Ok(size) if size < MAX_LOGGABLE_BODY_LENGTH => {
            let bytes = axum::body::to_bytes(body, size).await?;
            info!("  {} body:\n{}", label, String::from_utf8_lossy(&bytes));
            Ok(Body::from(bytes))
        }
        Ok(size) => {
            info!(
                "  {} body not logged: too big ({:#})",
                label,
                byte_unit::Byte::from(size)
            );
            Ok(body)
        }
    }
}

pub async fn log_requests(
    State(state): State<ServerState>,
    request: Request<Body>,
    next: Next,
) -> impl IntoResponse {
    let level = state.config.requests_logging_level.clone();
    if level == RequestsLoggingLevel::None {
        return next.run(request).await;
    }

    let start = Instant::now();
    let method = request.method().clone();
    let uri = request.uri().clone();
    info!(">>> {} {}", method, uri);

    let (parts, body) = request.into_parts();
    if level >= RequestsLoggingLevel::Headers {
        log_headers("Req", &parts.headers);
    }
    let body = if level >= RequestsLoggingLevel::Body {
        match log_body("Req", &parts.headers, body).await {
            Ok(body) => body,
            Err(err) => {
                error!("Failed to read request body of {} {}: {}", method, uri, err);
                return StatusCode::BAD_REQUEST.into_response();
            }
        }
    } else {
        body
    };

    let response = next.run(Request::from_parts(parts, body)).await;

    let (parts, body) = response.into_parts();
    if level >= RequestsLoggingLevel::Headers {
        log_headers("Resp", &parts.headers);
    }
    let body = if level >= RequestsLoggingLevel::Body {
        match log_body("Resp", &parts.headers, body).await {
            Ok(body) => body,
            Err(err) => {
                error!("Failed to read response body of {} {}: {}", method, uri, err);
                return StatusCode::INTERNAL_SERVER_ERROR.into_response();
            }
        }
    } else {
        body
    };

    info!(
        "<<< {} {} {} ({}ms)",
        parts.status.as_u16(),
        method,
        uri.path(),
        start.elapsed().as_millis()
    );
    Response::from_parts(parts, body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn levels_are_ordered() {
        assert!(RequestsLoggingLevel::None < RequestsLoggingLevel::Path);
        assert!(RequestsLoggingLevel::Headers < RequestsLoggingLevel::Body);
        assert_eq!(RequestsLoggingLevel::default(), RequestsLoggingLevel::Path);
        assert_eq!(RequestsLoggingLevel::Headers.to_string(), "Headers");
    }

    #[test]
    fn reads_content_length() {
        let mut headers = HeaderMap::new();
        assert!(content_length(&headers).is_err());

        headers.insert(CONTENT_LENGTH, "42".parse().unwrap());
        assert_eq!(content_length(&headers), Ok(42));

        headers.insert(CONTENT_LENGTH, "lots".parse().unwrap());
        assert_eq!(content_length(&headers), Err("non-numeric content-length"));
    }

    #[tokio::test]
    async fn small_bodies_survive_logging() {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_LENGTH, "5".parse().unwrap());

        let body = log_body("Req", &headers, Body::from("hello")).await.unwrap();
        let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"hello");
    }
}
