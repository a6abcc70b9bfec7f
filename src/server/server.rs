use anyhow::{Context, Result};
use std::path::PathBuf;
use std::time::Duration;

use tower_http::cors::CorsLayer;
use tower_http::services::{ServeDir, ServeFile};
use tracing::info;

use axum::{
    extract::State,
    middleware,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};

#[cfg(feature = "slowdown")]
use super::slowdown_request;
use super::music_routes::catalog_error_response;
use super::{log_requests, make_music_routes, state::ServerState, ServerConfig};
use crate::api_types::ServerStats;
use crate::service::CatalogService;

fn format_uptime(duration: Duration) -> String {
    let total_seconds = duration.as_secs();

    let days = total_seconds / 86_400;
    let hours = (total_seconds % 86_400) / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    format!("{}d {:02}:{:02}:{:02}", days, hours, minutes, seconds)
}

async fn home(State(state): State<ServerState>) -> Response {
    let entries_count = match state.catalog_service.count() {
        Ok(count) => count,
        Err(err) => return catalog_error_response("count entries", err),
    };
    let stats = ServerStats {
        uptime: format_uptime(state.start_time.elapsed()),
        version: env!("CARGO_PKG_VERSION").to_string(),
        entries_count,
    };
    Json(stats).into_response()
}

pub fn make_app(config: ServerConfig, catalog_service: CatalogService) -> Result<Router> {
    let state = ServerState::new(config.clone(), catalog_service);

    let home_router: Router = match config.frontend_dir_path {
        Some(frontend_path) => {
            let index_file = PathBuf::from(&frontend_path).join("index.html");
            let static_files_service = ServeDir::new(frontend_path)
                .append_index_html_on_directories(true)
                .fallback(ServeFile::new(index_file));
            Router::new().fallback_service(static_files_service)
        }
        None => Router::new()
            .route("/", get(home))
            .with_state(state.clone()),
    };

    let mut app: Router = home_router.merge(make_music_routes(state.clone()));

    #[cfg(feature = "slowdown")]
    {
        app = app.layer(middleware::from_fn(slowdown_request));
    }
    app = app
        .layer(CorsLayer::permissive())
        .layer(middleware::from_fn_with_state(state.clone(), log_requests));

    Ok(app)
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", err);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

pub async fn run_server(config: ServerConfig, catalog_service: CatalogService) -> Result<()> {
    let bind_address = config.bind_address();
    let app = make_app(config, catalog_service)?;

    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("Failed to bind {}", bind_address))?;
    info!("Listening on {}", bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}
