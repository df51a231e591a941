use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use ladle_core::InvoiceDraft;
use tokio::sync::Mutex;

mod routes;

pub struct AppState {
    pub db: ladle_storage::DbPool,
    /// The single in-flight draft being reviewed. Replaced by a new capture,
    /// consumed by confirmation.
    pub draft: Mutex<Option<InvoiceDraft>>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let project_dirs = directories::ProjectDirs::from("com", "ladle", "Ladle")
        .context("Failed to resolve app data directory")?;
    let data_dir = project_dirs.data_dir().to_path_buf();
    std::fs::create_dir_all(&data_dir).context("Failed to create data directory")?;

    let db_path = data_dir.join("invoices.db");
    let db = ladle_storage::create_db(&db_path)
        .await
        .context("Failed to open invoice database")?;
    tracing::info!("Invoice database: {}", db_path.display());

    let state = Arc::new(AppState {
        db,
        draft: Mutex::new(None),
    });

    let addr: SocketAddr = std::env::var("LADLE_ADDR")
        .unwrap_or_else(|_| "127.0.0.1:7420".to_string())
        .parse()
        .context("Invalid LADLE_ADDR")?;

    tracing::info!("Listening on {addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, routes::router(state)).await?;

    Ok(())
}
