//! ForgeHub server binary.
//!
//! Read-through proxy and metadata cache for dataset repositories on a
//! Gitea-compatible forge.

use forgehub_api::{router, AppState, DatasetService};
use forgehub_client::{ForgeClient, ForgeConfig};
use forgehub_store::MetadataStore;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let api_base = std::env::var("FORGEHUB_API_BASE")
        .unwrap_or_else(|_| "http://gitea:3000/api/v1".to_string());
    let raw_base =
        std::env::var("FORGEHUB_RAW_BASE").unwrap_or_else(|_| "http://gitea:3000".to_string());
    let db_path =
        std::env::var("FORGEHUB_DB_PATH").unwrap_or_else(|_| "forgehub.db".to_string());

    tracing::info!(api_base = %api_base, raw_base = %raw_base, db = %db_path, "starting forgehub");

    let config = ForgeConfig::builder(&api_base, &raw_base)
        .build()
        .unwrap_or_else(|e| {
            tracing::error!("invalid forge configuration: {}", e);
            std::process::exit(1);
        });
    let forge = Arc::new(ForgeClient::new(config).unwrap_or_else(|e| {
        tracing::error!("failed to create forge client: {}", e);
        std::process::exit(1);
    }));
    let store = MetadataStore::open(&db_path).unwrap_or_else(|e| {
        tracing::error!("failed to open metadata store: {}", e);
        std::process::exit(1);
    });

    let service = DatasetService::new(Arc::clone(&forge), store);
    let app = router(AppState::new(forge, service));

    let port = std::env::var("FORGEHUB_PORT")
        .or_else(|_| std::env::var("PORT"))
        .unwrap_or_else(|_| "8080".to_string())
        .parse::<u16>()
        .expect("PORT must be a valid number");

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("forgehub listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap_or_else(|e| {
        tracing::error!("failed to bind {}: {}", addr, e);
        std::process::exit(1);
    });
    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!("server error: {}", e);
        std::process::exit(1);
    }
}
