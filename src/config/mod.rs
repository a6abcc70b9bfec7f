mod file_config;

pub use file_config::FileConfig;

use crate::server::RequestsLoggingLevel;
use crate::service::DEFAULT_BULK_BATCH_SIZE;
use anyhow::{bail, Result};
use clap::ValueEnum;
use std::path::PathBuf;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_FRONTEND_DIR: &str = "public";

/// Deployment environment. Production serves the frontend as static files.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum Environment {
    #[default]
    Development,
    Production,
}

/// CLI arguments that can be used for config resolution.
/// This struct mirrors the CLI arguments that can be overridden by TOML config.
#[derive(Debug, Clone)]
pub struct CliConfig {
    pub db_path: Option<PathBuf>,
    pub host: String,
    pub port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub environment: Environment,
    pub frontend_dir_path: Option<String>,
    pub bulk_batch_size: usize,
}

impl Default for CliConfig {
    fn default() -> Self {
        CliConfig {
            db_path: None,
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            logging_level: RequestsLoggingLevel::default(),
            environment: Environment::default(),
            frontend_dir_path: None,
            bulk_batch_size: DEFAULT_BULK_BATCH_SIZE,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub db_path: PathBuf,
    pub host: String,
    pub port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub environment: Environment,
    /// Only set in production, the directory served at `/`.
    pub frontend_dir_path: Option<String>,
    pub bulk_batch_size: usize,
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file config.
    /// TOML values override CLI values where present.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        let db_path = file
            .db_path
            .map(PathBuf::from)
            .or_else(|| cli.db_path.clone())
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "db_path must be specified via --db-path, DATABASE_PATH or in config file"
                )
            })?;

        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            if !parent.is_dir() {
                bail!("Database directory does not exist: {:?}", parent);
            }
        }
        if db_path.is_dir() {
            bail!("db_path is a directory: {:?}", db_path);
        }

        let host = file.host.unwrap_or_else(|| cli.host.clone());
        let port = file.port.unwrap_or(cli.port);

        let logging_level = file
            .logging_level
            .and_then(|s| parse_logging_level(&s))
            .unwrap_or_else(|| cli.logging_level.clone());

        let environment = match file.environment {
            Some(raw) => match Environment::from_str(&raw, true) {
                Ok(environment) => environment,
                Err(_) => bail!("Unknown environment in config file: {}", raw),
            },
            None => cli.environment,
        };

        let frontend_dir_path = match environment {
            Environment::Production => {
                let dir = file
                    .frontend_dir_path
                    .or_else(|| cli.frontend_dir_path.clone())
                    .unwrap_or_else(|| DEFAULT_FRONTEND_DIR.to_string());
                if !PathBuf::from(&dir).is_dir() {
                    bail!("Frontend directory does not exist: {:?}", dir);
                }
                Some(dir)
            }
            Environment::Development => None,
        };

        let bulk_batch_size = file.bulk_batch_size.unwrap_or(cli.bulk_batch_size);
        if bulk_batch_size == 0 {
            bail!("bulk_batch_size must be greater than zero");
        }

        Ok(Self {
            db_path,
            host,
            port,
            logging_level,
            environment,
            frontend_dir_path,
            bulk_batch_size,
        })
    }
}

/// Parses a logging level string into RequestsLoggingLevel.
fn parse_logging_level(s: &str) -> Option<RequestsLoggingLevel> {
    RequestsLoggingLevel::from_str(s, true).ok()
}
