use super::RequestsLoggingLevel;
use crate::config::{AppConfig, DEFAULT_HOST, DEFAULT_PORT};

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub requests_logging_level: RequestsLoggingLevel,
    pub host: String,
    pub port: u16,
    /// When set, static files are served from here instead of the `/` stats route.
    pub frontend_dir_path: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            requests_logging_level: RequestsLoggingLevel::Path,
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            frontend_dir_path: None,
        }
    }
}

impl From<&AppConfig> for ServerConfig {
    fn from(config: &AppConfig) -> Self {
        ServerConfig {
            requests_logging_level: config.logging_level.clone(),
            host: config.host.clone(),
            port: config.port,
            frontend_dir_path: config.frontend_dir_path.clone(),
        }
    }
}

impl ServerConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
