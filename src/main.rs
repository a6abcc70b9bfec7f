use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use music_share_server::catalog_store::{CatalogStore, SqliteCatalogStore};
use music_share_server::config::{self, Environment, DEFAULT_HOST, DEFAULT_PORT};
use music_share_server::server::{run_server, RequestsLoggingLevel, ServerConfig};
use music_share_server::service::{CatalogService, DEFAULT_BULK_BATCH_SIZE};

const READ_POOL_SIZE: usize = 4;

fn parse_path(s: &str) -> Result<PathBuf, String> {
    let path_buf = PathBuf::from(s);
    if path_buf.is_absolute() {
        return Ok(path_buf);
    }
    let cwd = std::env::current_dir().map_err(|e| format!("Failed to get current dir: {}", e))?;
    Ok(cwd.join(path_buf))
}

#[derive(Parser, Debug)]
struct CliArgs {
    /// Path to TOML configuration file. Values in the file override CLI arguments.
    #[clap(long, value_parser = parse_path)]
    pub config: Option<PathBuf>,

    /// Path to the SQLite music database file, created if missing.
    #[clap(long, env = "DATABASE_PATH", value_parser = parse_path)]
    pub db_path: Option<PathBuf>,

    /// The host to bind to.
    #[clap(long, env = "HOST", default_value = DEFAULT_HOST)]
    pub host: String,

    /// The port to listen on.
    #[clap(short, long, env = "PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// The level of logging to perform on each request.
    #[clap(long, env = "REQUESTS_LOGGING_LEVEL", default_value = "path")]
    pub logging_level: RequestsLoggingLevel,

    /// In production the frontend directory is served at `/`.
    #[clap(long, env = "APP_ENV", value_enum, default_value = "development")]
    pub environment: Environment,

    /// Path to the frontend directory to be statically served in production.
    #[clap(long = "frontend-dir", env = "FRONTEND_DIR")]
    pub frontend_dir_path: Option<String>,

    /// Number of records inserted per transaction by bulk imports.
    #[clap(long, env = "BULK_BATCH_SIZE", default_value_t = DEFAULT_BULK_BATCH_SIZE)]
    pub bulk_batch_size: usize,
}

impl From<&CliArgs> for config::CliConfig {
    fn from(args: &CliArgs) -> Self {
        config::CliConfig {
            db_path: args.db_path.clone(),
            host: args.host.clone(),
            port: args.port,
            logging_level: args.logging_level.clone(),
            environment: args.environment,
            frontend_dir_path: args.frontend_dir_path.clone(),
            bulk_batch_size: args.bulk_batch_size,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .context("Failed to install tracing subscriber")?;

    let file_config = match &cli_args.config {
        Some(path) => {
            info!("Loading configuration from {:?}", path);
            Some(config::FileConfig::load(path)?)
        }
        None => None,
    };

    let cli_config: config::CliConfig = (&cli_args).into();
    let app_config = config::AppConfig::resolve(&cli_config, file_config)?;

    info!("Configuration loaded:");
    info!("  db_path: {:?}", app_config.db_path);
    info!("  environment: {:?}", app_config.environment);
    info!("  bind: {}:{}", app_config.host, app_config.port);

    if !app_config.db_path.exists() {
        info!("Creating new music database at {:?}", app_config.db_path);
    }
    let store = SqliteCatalogStore::new(&app_config.db_path, READ_POOL_SIZE)
        .with_context(|| format!("Failed to open music database {:?}", app_config.db_path))?;
    info!("Music database ready with {} entries", store.count()?);

    let catalog_service = CatalogService::with_batch_size(Arc::new(store), app_config.bulk_batch_size);

    run_server(ServerConfig::from(&app_config), catalog_service).await
}
