use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use yatube::config::{Config, StorageBackend};
use yatube::db::Database;
use yatube::repository::{BlogRepository, MemoryBlogRepository, PgBlogRepository};
use yatube::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "yatube=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::load()?;
    tracing::info!("Configuration loaded successfully");

    let repo: Arc<dyn BlogRepository> = match config.database.backend {
        StorageBackend::Postgres => {
            let db = Database::connect(&config.database).await?;
            db.run_migrations().await?;
            Arc::new(PgBlogRepository::new(db.pg))
        }
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage, data is lost on restart");
            Arc::new(MemoryBlogRepository::new())
        }
    };

    tokio::fs::create_dir_all(&config.media.root).await?;

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let app = yatube::app(AppState::new(config, repo));

    // Start server
    tracing::info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
