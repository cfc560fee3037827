//! OpenAlgo Chart Shell
//!
//! Connects to an OpenAlgo server and hosts the floating favorites toolbar.

mod api;
mod business;
mod data;
mod ui;

use anyhow::Result;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use business::{apply_saved_theme, Document};
use data::{AppConfig, FileStore, MemoryStore, SharedStore};
use ui::{run_app, ErrorBoundary};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    tracing::info!("OpenAlgo chart shell starting");

    let config = AppConfig::load_or_default()?;
    let store: SharedStore = match config.storage_path() {
        Some(path) => Arc::new(FileStore::open(path)),
        None => {
            tracing::warn!("No storage file configured, settings will not persist");
            Arc::new(MemoryStore::new())
        }
    };

    // Theme goes on the document before anything is mounted
    let mut document = Document::new();
    let theme = apply_saved_theme(store.as_ref(), &mut document);
    tracing::info!("Theme: {}", theme);

    ErrorBoundary::new("app")
        .run(run_app(config, store, document))
        .await??;

    Ok(())
}
