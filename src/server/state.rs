use axum::extract::FromRef;

use crate::service::CatalogService;
use std::time::Instant;

use super::ServerConfig;

#[derive(Clone)]
pub struct ServerState {
    pub config: ServerConfig,
    pub start_time: Instant,
    pub catalog_service: CatalogService,
}

impl ServerState {
    pub fn new(config: ServerConfig, catalog_service: CatalogService) -> Self {
        ServerState {
            config,
            start_time: Instant::now(),
            catalog_service,
        }
    }
}

impl FromRef<ServerState> for CatalogService {
    fn from_ref(input: &ServerState) -> Self {
        input.catalog_service.clone()
    }
}

impl FromRef<ServerState> for ServerConfig {
    fn from_ref(input: &ServerState) -> Self {
        input.config.clone()
    }
}
