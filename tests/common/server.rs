//! Test server lifecycle management
//!
//! Each test gets an isolated server with its own seeded database.

use super::constants::*;
use super::fixtures::create_test_db;
use music_share_server::catalog_store::{CatalogStore, SqliteCatalogStore};
use music_share_server::server::{make_app, RequestsLoggingLevel, ServerConfig};
use music_share_server::service::CatalogService;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::net::TcpListener;

/// Bulk batch size used by test servers, small enough to span batches.
const TEST_BULK_BATCH_SIZE: usize = 2;

/// Test server instance with an isolated database
///
/// When dropped, the server gracefully shuts down and the database is deleted.
pub struct TestServer {
    /// Base URL for making requests (e.g., "http://127.0.0.1:12345")
    pub base_url: String,

    /// Base URL of the music API (e.g., "http://127.0.0.1:12345/api")
    pub api_url: String,

    /// The port the server is listening on
    pub port: u16,

    /// Store for direct database access in tests
    pub store: Arc<dyn CatalogStore>,

    _temp_db_dir: TempDir,
    _shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

impl TestServer {
    /// Spawns a new test server on a random port, seeded with the songs of
    /// `constants.rs`.
    ///
    /// # Panics
    ///
    /// Panics if the database cannot be created, the port cannot be bound or
    /// the server doesn't become ready within the timeout.
    pub async fn spawn() -> Self {
        let (temp_db_dir, db_path) = create_test_db().expect("Failed to create test database");
        Self::spawn_with_db(temp_db_dir, db_path).await
    }

    /// Spawns a test server over an empty database.
    pub async fn spawn_empty() -> Self {
        let temp_db_dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = temp_db_dir.path().join("music.db");
        Self::spawn_with_db(temp_db_dir, db_path).await
    }

    async fn spawn_with_db(temp_db_dir: TempDir, db_path: std::path::PathBuf) -> Self {
        let store: Arc<dyn CatalogStore> =
            Arc::new(SqliteCatalogStore::new(&db_path, 2).expect("Failed to open music store"));

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");
        let port = listener
            .local_addr()
            .expect("Failed to get local address")
            .port();
        let base_url = format!("http://127.0.0.1:{}", port);

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

        let config = ServerConfig {
            port,
            host: "127.0.0.1".to_string(),
            requests_logging_level: RequestsLoggingLevel::None,
            frontend_dir_path: None,
        };
        let service = CatalogService::with_batch_size(store.clone(), TEST_BULK_BATCH_SIZE);
        let app = make_app(config, service).expect("Failed to build app");

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .expect("Server failed");
        });

        let server = Self {
            api_url: format!("{}/api", base_url),
            base_url,
            port,
            store,
            _temp_db_dir: temp_db_dir,
            _shutdown_tx: Some(shutdown_tx),
        };

        server.wait_for_ready().await;

        server
    }

    /// Waits for the server to become ready by polling the stats endpoint
    async fn wait_for_ready(&self) {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(100))
            .build()
            .expect("Failed to build reqwest client");

        let start = std::time::Instant::now();
        let timeout = Duration::from_millis(SERVER_READY_TIMEOUT_MS);

        loop {
            if start.elapsed() > timeout {
                panic!(
                    "Server did not become ready within {}ms",
                    SERVER_READY_TIMEOUT_MS
                );
            }

            match client.get(format!("{}/", self.base_url)).send().await {
                Ok(response) if response.status().is_success() => return,
                _ => {
                    tokio::time::sleep(Duration::from_millis(SERVER_READY_POLL_INTERVAL_MS)).await;
                }
            }
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self._shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}
