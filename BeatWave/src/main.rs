use std::sync::Arc;

use bwserver::Library;
use bwstore::{BlobStore, GithubStore, MemoryStore};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = bwconfig::get_config();

    // ========== PHASE 1 : Magasin de documents ==========

    let backend = config.get_store_backend();
    let store: Arc<dyn BlobStore> = match backend.as_str() {
        "github" => match GithubStore::from_config() {
            Some(store) => {
                info!("📦 Using GitHub document store");
                Arc::new(store)
            }
            None => {
                warn!("⚠️ GitHub store selected but no token configured, falling back to memory");
                Arc::new(MemoryStore::new())
            }
        },
        _ => {
            info!("📦 Using in-memory document store");
            Arc::new(MemoryStore::new())
        }
    };

    // ========== PHASE 2 : Bibliothèque ==========

    let library = Library::new(
        store,
        config.get_stats_retention_days(),
        config.get_max_write_attempts() as u32,
    );

    // Le magasin mémoire démarre vide : servir le jeu de démonstration.
    if backend != "github" && library.list_tracks().await?.is_empty() {
        let demo = bwmetadata::demo_tracks();
        info!("🎵 Seeding {} demo tracks", demo.len());
        library.save_tracks(&demo).await?;
    }

    // ========== PHASE 3 : Serveur HTTP ==========

    let router = bwserver::routes(Arc::new(library));
    let port = config.get_http_port();
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;
    info!("🌐 HTTP server listening on port {port}");

    info!("✅ BeatWave is ready!");
    info!("Press Ctrl+C to stop...");
    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutting down");
        })
        .await?;

    Ok(())
}
