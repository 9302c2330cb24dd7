//! foodrank HTTP server binary

use foodrank::evaluation::DEFAULT_K_VALUES;
use foodrank::server::{self, AppState};
use foodrank::{Ingestion, JsonLinesStore, RankingEngine, RecordStore, ServiceConfig};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("foodrank=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true)
        .init();

    let config = ServiceConfig::from_env()?;

    println!("🍜 foodrank");
    println!("   Version: {}", env!("CARGO_PKG_VERSION"));

    let file_store = JsonLinesStore::new(config.store_path.clone());
    println!("✓ Record store: {}", file_store.path().display());

    let store: Arc<dyn RecordStore> = Arc::new(file_store);
    let engine = RankingEngine::with_store(store.clone());

    // Offline evaluation instead of serving
    if std::env::args().any(|arg| arg == "--evaluate") {
        let report = engine.evaluate(&DEFAULT_K_VALUES).await?;
        println!("{}", report);
        return Ok(());
    }

    let state = AppState {
        engine,
        ingestion: Arc::new(Ingestion::new(store)),
    };

    println!("✓ Starting HTTP server on {}:{}...", config.host, config.port);
    println!();

    server::run_server(state, &config).await?;

    Ok(())
}
