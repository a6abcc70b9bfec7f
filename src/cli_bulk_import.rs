//! Bulk Import Tool
//!
//! Reads a JSON array of music records, fills in missing titles from the
//! providers' oEmbed endpoints and submits everything that ends up complete
//! in one bulk insert, either to a running server or straight into a local
//! database file.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use music_share_server::catalog_store::SqliteCatalogStore;
use music_share_server::client::{MusicApiClient, DEFAULT_API_URL};
use music_share_server::importer::{read_records, BulkImporter, BulkSink};
use music_share_server::resolver::OEmbedTitleResolver;
use music_share_server::service::CatalogService;

#[derive(Parser, Debug)]
#[command(name = "cli-bulk-import")]
#[command(about = "Import a JSON file of shared music into the catalog")]
struct Args {
    /// JSON file holding an array of `{url, title, sharedBy, sharedAt}` records.
    #[arg(value_name = "INPUT", default_value = "music-data.json")]
    input: PathBuf,

    /// Base URL of the music API.
    #[arg(long, default_value = DEFAULT_API_URL)]
    api_url: String,

    /// Import directly into this database file instead of going through the API.
    #[arg(long, value_name = "DB_PATH")]
    db: Option<PathBuf>,

    /// Timeout in seconds for every outgoing HTTP request.
    #[arg(long, default_value_t = 30)]
    timeout_sec: u64,

    /// Hide the progress bar, logs only.
    #[arg(long, default_value_t = false)]
    quiet: bool,
}

fn create_progress_bar(len: u64, quiet: bool) -> Result<ProgressBar> {
    if quiet {
        return Ok(ProgressBar::hidden());
    }
    let pb = ProgressBar::new(len);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{msg} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} (ETA: {eta})")?
            .progress_chars("=> "),
    );
    pb.set_message("Normalizing");
    Ok(pb)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .context("Failed to install tracing subscriber")?;

    let records = read_records(&args.input)?;
    info!("Read {} records from {:?}", records.len(), args.input);

    let sink: Box<dyn BulkSink> = match &args.db {
        Some(db_path) => {
            info!("Importing directly into {:?}", db_path);
            let store = SqliteCatalogStore::new(db_path, 1)?;
            Box::new(CatalogService::new(Arc::new(store)))
        }
        None => {
            info!("Importing through {}", args.api_url);
            Box::new(MusicApiClient::new(&args.api_url, args.timeout_sec)?)
        }
    };

    let resolver = Arc::new(OEmbedTitleResolver::new(args.timeout_sec)?);
    let importer = BulkImporter::new(resolver);

    let progress = create_progress_bar(records.len() as u64, args.quiet)?;
    let report = importer.run(records, sink.as_ref(), &progress).await;
    progress.finish_and_clear();

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
