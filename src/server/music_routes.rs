//! `/api/music` routes.

use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    routing::post,
    Json, Router,
};
use serde::Deserialize;
use tracing::warn;

use super::state::ServerState;
use crate::api_types::{BulkCreateRequest, ErrorResponse, MusicListResponse, RandomMusicResponse};
use crate::catalog_store::SortOrder;
use crate::service::{
    coerce_positive, CatalogError, CatalogService, CreateMusicRequest, DEFAULT_PAGE,
    DEFAULT_PAGE_LIMIT,
};

#[derive(Deserialize, Debug, Default)]
struct ListQuery {
    page: Option<String>,
    limit: Option<String>,
    sort: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
struct SearchQuery {
    q: Option<String>,
    sort: Option<String>,
}

fn error_response(status: StatusCode, error: String, details: Option<String>) -> Response {
    (status, Json(ErrorResponse { error, details })).into_response()
}

/// Validation failures are the client's fault, everything else is ours.
pub(super) fn catalog_error_response(operation: &str, err: CatalogError) -> Response {
    match err {
        CatalogError::Validation(err) => {
            error_response(StatusCode::BAD_REQUEST, err.to_string(), None)
        }
        CatalogError::Store(err) => error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Failed to {}", operation),
            Some(format!("{:#}", err)),
        ),
    }
}

fn json_rejection_response(rejection: JsonRejection) -> Response {
    warn!("Rejected request body: {}", rejection.body_text());
    error_response(
        StatusCode::BAD_REQUEST,
        "Invalid request body".to_string(),
        Some(rejection.body_text()),
    )
}

async fn list_music(
    State(service): State<CatalogService>,
    Query(query): Query<ListQuery>,
) -> Response {
    let page = coerce_positive(query.page.as_deref(), DEFAULT_PAGE);
    let limit = coerce_positive(query.limit.as_deref(), DEFAULT_PAGE_LIMIT);
    let sort = SortOrder::from_query(query.sort.as_deref());

    match service.list_page(page, limit, sort) {
        Ok(page) => Json(page).into_response(),
        Err(err) => catalog_error_response("fetch music", err),
    }
}

async fn list_all_music(State(service): State<CatalogService>) -> Response {
    match service.list_all() {
        Ok(music) => Json(MusicListResponse { music }).into_response(),
        Err(err) => catalog_error_response("fetch music", err),
    }
}

async fn create_music(
    State(service): State<CatalogService>,
    body: Result<Json<CreateMusicRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match body {
        Ok(body) => body,
        Err(rejection) => return json_rejection_response(rejection),
    };
    match service.create(request) {
        Ok(entry) => (StatusCode::CREATED, Json(entry)).into_response(),
        Err(err) => catalog_error_response("save music", err),
    }
}

async fn bulk_create_music(
    State(service): State<CatalogService>,
    body: Result<Json<BulkCreateRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match body {
        Ok(body) => body,
        Err(rejection) => return json_rejection_response(rejection),
    };
    match service.bulk_create(request.items) {
        Ok(summary) => Json(summary).into_response(),
        Err(err) => catalog_error_response("import music", err),
    }
}

async fn search_music(
    State(service): State<CatalogService>,
    Query(query): Query<SearchQuery>,
) -> Response {
    let sort = SortOrder::from_query(query.sort.as_deref());
    match service.search(query.q.as_deref().unwrap_or_default(), sort) {
        Ok(music) => Json(MusicListResponse { music }).into_response(),
        Err(err) => catalog_error_response("search music", err),
    }
}

async fn random_music(State(service): State<CatalogService>) -> Response {
    match service.random_one() {
        Ok(music) => Json(RandomMusicResponse { music }).into_response(),
        Err(err) => catalog_error_response("fetch random music", err),
    }
}

pub fn make_music_routes(state: ServerState) -> Router {
    Router::new()
        .route("/api/music", get(list_music).post(create_music))
        .route("/api/music/all", get(list_all_music))
        .route("/api/music/bulk", post(bulk_create_music))
        .route("/api/music/search", get(search_music))
        .route("/api/music/random", get(random_music))
        .with_state(state)
}
